//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{ChangeAnalysis, OrgTreeConvert, RenderOptions, ValidationReport};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let project_dir = cli
        .project_dir
        .clone()
        .or_else(|| std::env::current_dir().ok());
    let settings = Settings::load(project_dir.as_deref())?;
    let json = cli.json || settings.output.json;
    let container = ServiceContainer::new(settings);

    match &cli.command {
        Some(Commands::Validate { file }) => cmd_validate(&container, file, json),
        Some(Commands::Tree { file, no_stats }) => cmd_tree(&container, file, *no_stats, json),
        Some(Commands::Compare {
            baseline,
            target,
            changes_only,
        }) => cmd_compare(&container, baseline, target, *changes_only, json),
        Some(Commands::Inspect { file, id }) => cmd_inspect(&container, file, id, json),
        Some(Commands::Config { command }) => cmd_config(&container, command, project_dir.as_deref()),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "orgtree", &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage("no command given, see --help".to_string())),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| CliError::Infra(InfraError::Serialize(e)))
}

fn print_report(report: &ValidationReport) {
    let stats = &report.stats;
    output::header(&format!(
        "{} rows, {} valid, {} employees",
        report.total_rows, report.valid_rows, stats.total_employees
    ));
    output::detail(&format!(
        "managers: {}, levels: {}, orphaned managers: {}, average team size: {}",
        stats.unique_managers, stats.hierarchy_levels, stats.orphaned_managers, stats.average_team_size
    ));
    for e in &report.errors {
        output::failure(e);
    }
    for w in &report.warnings {
        output::caution(w);
    }
}

#[instrument(skip(container))]
fn cmd_validate(container: &ServiceContainer, file: &Path, json: bool) -> CliResult<()> {
    let report = container.orgchart.validate(file)?;
    if json {
        output::info(&to_json(&report)?);
    } else {
        print_report(&report);
    }
    if report.is_blocking() {
        return Err(CliError::ValidationFailed(report.errors.len()));
    }
    if !json {
        output::success("ready to finalize");
    }
    Ok(())
}

/// Blocking errors make the rendered chart a preview only.
/// Header shown above a chart built from an upload with blocking errors.
fn preview_header(report: &ValidationReport, what: &str) -> Option<String> {
    report.is_blocking().then(|| {
        format!(
            "{} has {} blocking error(s): showing a non-authoritative preview",
            what,
            report.errors.len()
        )
    })
}

fn print_blocking(report: &ValidationReport, what: &str) {
    let Some(header) = preview_header(report, what) else {
        return;
    };
    output::header(&header);
    for e in &report.errors {
        output::failure(e);
    }
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer, file: &Path, no_stats: bool, json: bool) -> CliResult<()> {
    let preview = container.orgchart.preview(file)?;
    let settings = &container.settings.output;

    let Some(tree) = preview.tree else {
        print_blocking(&preview.report, "upload");
        output::warning("no employees to display");
        return Ok(());
    };
    if json {
        let nested = tree.to_nested(settings.max_depth)?;
        let value = json!({
            "authoritative": preview.report.can_finalize(),
            "errors": preview.report.errors,
            "tree": nested,
        });
        output::info(&to_json(&value)?);
        return Ok(());
    }
    let opts = RenderOptions {
        show_stats: settings.show_stats && !no_stats,
        show_changes: false,
        max_depth: settings.max_depth,
    };
    let display = tree.to_display_tree(opts)?;
    print_blocking(&preview.report, "upload");
    output::info(&display);
    Ok(())
}

fn print_analysis(analysis: &ChangeAnalysis) {
    output::header(&format!(
        "{} changes: {} added, {} removed, {} moved",
        analysis.total_direct_changes,
        analysis.added.len(),
        analysis.removed.len(),
        analysis.moved.len()
    ));
    for c in &analysis.added {
        output::diff_add(&format!("{} ({})", c.name(), c.key()));
    }
    for c in &analysis.removed {
        output::diff_remove(&format!("{} ({})", c.name(), c.key()));
    }
    for c in &analysis.moved {
        output::diff_move(&format!(
            "{} ({}) from {}",
            c.name(),
            c.key(),
            c.previous_manager_name.as_deref().unwrap_or("?")
        ));
    }
}

#[instrument(skip(container))]
fn cmd_compare(
    container: &ServiceContainer,
    baseline: &Path,
    target: &Path,
    changes_only: bool,
    json: bool,
) -> CliResult<()> {
    let comparison = container.orgchart.compare(baseline, target)?;
    let settings = &container.settings.output;
    debug!("compare: baseline errors {}", comparison.baseline_report.errors.len());

    if json {
        let mut value = json!({
            "authoritative": comparison.target_report.can_finalize(),
            "errors": comparison.target_report.errors,
            "analysis": comparison.analysis,
        });
        if !changes_only {
            let nested = match &comparison.tree {
                Some(tree) => tree.to_nested(settings.max_depth)?,
                None => None,
            };
            value["tree"] = json!(nested);
        }
        output::info(&to_json(&value)?);
        return Ok(());
    }

    print_blocking(&comparison.target_report, "target snapshot");
    print_analysis(&comparison.analysis);
    if changes_only {
        return Ok(());
    }
    match &comparison.tree {
        Some(tree) => {
            let opts = RenderOptions {
                show_stats: settings.show_stats,
                show_changes: true,
                max_depth: settings.max_depth,
            };
            output::info(&tree.to_display_tree(opts)?);
        }
        None => output::warning("target snapshot has no employees to display"),
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_inspect(container: &ServiceContainer, file: &Path, id: &str, json: bool) -> CliResult<()> {
    let inspection = container.orgchart.inspect(file, id)?;
    if json {
        output::info(&to_json(&inspection)?);
        return Ok(());
    }

    let name = inspection.record.display_name();
    output::header(&format!("{} ({})", name, inspection.key));
    if let Some(title) = &inspection.record.title {
        output::detail(&format!("title: {}", title));
    }
    let stats = &inspection.stats;
    output::detail(&format!(
        "direct reports: {}, total reports: {}, total fte: {}",
        stats.direct_reports, stats.total_reports, stats.total_fte
    ));
    if inspection.chain_of_command.is_empty() {
        output::detail("reports to: nobody (top of the org)");
    } else {
        output::detail(&format!("chain of command: {}", inspection.chain_of_command.join(" -> ")));
    }
    for report in &inspection.direct_reports {
        output::detail(&format!("- {}", report));
    }
    Ok(())
}

fn cmd_config(container: &ServiceContainer, command: &ConfigCommands, project_dir: Option<&Path>) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&container.settings.to_toml()?),
        ConfigCommands::Path => {
            let show = |label: &str, path: Option<PathBuf>| match path {
                Some(p) if p.exists() => output::detail(&format!("{}: {}", label, p.display())),
                Some(p) => output::detail(&format!("{}: {} (not found)", label, p.display())),
                None => output::detail(&format!("{}: unavailable", label)),
            };
            show("global", global_config_path());
            show("local", project_dir.map(local_config_path));
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_blocking_report_when_previewing_then_header_marks_chart_non_authoritative() {
        let report = ValidationReport {
            errors: vec!["Row 3: duplicate id '5'".into(), "Row 4: missing id".into()],
            ..ValidationReport::default()
        };

        let header = preview_header(&report, "upload").unwrap();
        print_blocking(&report, "upload");

        assert_eq!(header, "upload has 2 blocking error(s): showing a non-authoritative preview");
    }

    #[test]
    fn given_warnings_only_when_previewing_then_no_header() {
        let report = ValidationReport {
            warnings: vec!["Invalid FTE value".into()],
            ..ValidationReport::default()
        };

        assert!(preview_header(&report, "upload").is_none());
    }
}
