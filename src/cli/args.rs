//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Org chart engine: build reporting hierarchies from flat employee records and diff snapshots
#[derive(Parser, Debug)]
#[command(name = "orgtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Project directory holding .orgtree.toml (default: cwd)
    #[arg(short = 'C', long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check an upload for blocking errors and warnings
    Validate {
        /// JSON file with an array of employee rows
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Show the org hierarchy as a tree
    Tree {
        /// JSON file with an array of employee rows
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Hide report counts and FTE
        #[arg(long)]
        no_stats: bool,
    },

    /// Compare a baseline snapshot against a target snapshot
    Compare {
        /// Baseline ("before") JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        baseline: PathBuf,
        /// Target ("after") JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        target: PathBuf,
        /// Only print the change summary, not the annotated tree
        #[arg(long)]
        changes_only: bool,
    },

    /// Show one employee: stats, chain of command, direct reports
    Inspect {
        /// JSON file with an array of employee rows
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Employee id
        id: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Show config file locations
    Path,
    /// Print a commented config template
    Template,
}
