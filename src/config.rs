//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/orgtree/orgtree.toml`
//! 3. Local config: `<project_dir>/.orgtree.toml`
//! 4. Environment variables: `ORGTREE_*` prefix, `__` between sections

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::{ColumnMapping, RootSelection, ValidationRules, MAX_VIEW_DEPTH};

/// Tree construction settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HierarchySettings {
    /// Which root candidate wins when several exist
    pub root_selection: RootSelection,
}

/// Output defaults for the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputSettings {
    /// Show report counts and FTE next to each node
    pub show_stats: bool,
    /// Emit JSON instead of human-readable output
    pub json: bool,
    /// Deepest hierarchy the tree and JSON views will render
    pub max_depth: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            show_stats: true,
            json: false,
            max_depth: MAX_VIEW_DEPTH,
        }
    }
}

/// Unified configuration for orgtree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Row keys for each employee field
    pub columns: ColumnMapping,
    /// Validation limits
    pub validation: ValidationRules,
    pub hierarchy: HierarchySettings,
    pub output: OutputSettings,
}

/// Column mapping keys that accept comma-separated lists from env vars.
const LIST_KEYS: [&str; 8] = [
    "columns.id",
    "columns.name",
    "columns.manager_id",
    "columns.title",
    "columns.location",
    "columns.job_family",
    "columns.management_level",
    "columns.fte",
];

/// Get the XDG config directory for orgtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "orgtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("orgtree.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".orgtree.toml")
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional directory holding a `.orgtree.toml`
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path().filter(|p| p.exists());
        let local = project_dir.map(local_config_path).filter(|p| p.exists());
        Self::load_from(global.as_deref(), local.as_deref(), true)
    }

    /// Load from explicit files. Missing paths are skipped.
    pub fn load_from(
        global: Option<&Path>,
        local: Option<&Path>,
        with_env: bool,
    ) -> Result<Self, ApplicationError> {
        let defaults = Config::try_from(&Settings::default()).map_err(config_err)?;
        let mut builder = Config::builder().add_source(defaults);

        for path in [global, local].into_iter().flatten() {
            debug!("config: loading {}", path.display());
            builder = builder.add_source(File::from(path.to_path_buf()).required(false));
        }

        if with_env {
            let mut env = Environment::with_prefix("ORGTREE")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .try_parsing(true);
            for key in LIST_KEYS {
                env = env.with_list_parse_key(key);
            }
            builder = builder.add_source(env);
        }

        let config = builder.build().map_err(config_err)?;
        config.try_deserialize().map_err(config_err)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# orgtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/orgtree/orgtree.toml
#   Local:  <project_dir>/.orgtree.toml
#   Env:    ORGTREE_* environment variables, e.g. ORGTREE_VALIDATION__MAX_FTE=1.5

[columns]
# Row keys for each field; the first key present in a row wins
# id = ["id"]
# name = ["name"]
# manager_id = ["managerId", "manager", "manager_id"]
# title = ["title"]
# location = ["location"]
# job_family = ["jobFamily", "job_family"]
# management_level = ["managementLevel", "management_level"]
# fte = ["fte"]

[validation]
# Upper bound of the accepted FTE range
# max_fte = 2.0
# Number of orphaned manager ids listed in the warning
# orphan_preview = 5

[hierarchy]
# "last_candidate" (default) or "first_candidate"
# root_selection = "last_candidate"

[output]
# show_stats = true
# json = false
# Deeper hierarchies are refused by `tree` and `compare`
# max_depth = 500
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_config_files_when_loading_then_uses_defaults() {
        let settings = Settings::load_from(None, None, false).expect("load defaults");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.validation.max_fte, 2.0);
        assert_eq!(settings.hierarchy.root_selection, RootSelection::LastCandidate);
    }

    #[test]
    fn given_template_when_parsed_then_is_valid_toml() {
        let parsed: Result<Settings, _> = toml::from_str(&Settings::template());
        assert!(parsed.is_ok(), "template should parse: {:?}", parsed.err());
    }

    #[test]
    fn given_default_settings_when_serialized_then_roundtrips_through_toml() {
        let text = Settings::default().to_toml().unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, Settings::default());
    }
}
