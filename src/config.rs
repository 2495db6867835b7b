//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/ymlmerge/ymlmerge.toml`
//! 3. Local config: `<dir>/.ymlmerge.toml` (working directory by default)
//! 4. Environment variables: `YMLMERGE_*` prefix
//!
//! Command line flags are applied on top of the loaded settings.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::{parse_delimiter_map, MergeOptions, DEFAULT_DELETION_TOKEN, OUTPUT_INDENT};

/// Unified configuration for ymlmerge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Scalar value that deletes a key (default: nil)
    pub deletion_token: String,
    /// Fail on same-named nodes of different kinds (default: true)
    pub strict: bool,
    /// Spaces per indentation level in merged output
    pub output_indent: usize,
    /// List name -> delimiter for key/value list merging
    pub delimiters: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            deletion_token: DEFAULT_DELETION_TOKEN.to_string(),
            strict: true,
            output_indent: OUTPUT_INDENT,
            delimiters: BTreeMap::new(),
        }
    }
}

/// Raw settings for intermediate parsing.
///
/// `None` means "not specified, inherit from the layer below".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub deletion_token: Option<String>,
    pub strict: Option<bool>,
    pub output_indent: Option<usize>,
    pub delimiters: Option<BTreeMap<String, String>>,
}

/// Get the XDG config directory for ymlmerge.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "ymlmerge").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("ymlmerge.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".ymlmerge.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Merge overlay config onto self (base).
    ///
    /// - Scalar options: overlay wins if Some, otherwise keep base
    /// - Delimiters: union, overlay wins per list name
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        let mut delimiters = self.delimiters.clone();
        if let Some(extra) = &overlay.delimiters {
            delimiters.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        Self {
            deletion_token: overlay
                .deletion_token
                .clone()
                .unwrap_or_else(|| self.deletion_token.clone()),
            strict: overlay.strict.unwrap_or(self.strict),
            output_indent: overlay.output_indent.unwrap_or(self.output_indent),
            delimiters,
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Directory searched for `.ymlmerge.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("loading global config {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!("loading local config {}", local_path.display());
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.validate()?;
        Ok(current)
    }

    /// Apply YMLMERGE_* environment variables as explicit overrides.
    ///
    /// `YMLMERGE_DELIMITERS` uses the raw `name:delim,...` format and
    /// replaces the configured map.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("YMLMERGE")
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("deletion_token") {
            settings.deletion_token = val;
        }
        if let Ok(val) = config.get_bool("strict") {
            settings.strict = val;
        }
        if let Ok(val) = config.get_int("output_indent") {
            settings.output_indent = usize::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("YMLMERGE_OUTPUT_INDENT must not be negative: {val}"),
            })?;
        }
        if let Ok(val) = config.get_string("delimiters") {
            settings.delimiters =
                parse_delimiter_map(&val).map_err(|e| ApplicationError::Config {
                    message: format!("YMLMERGE_DELIMITERS: {e}"),
                })?;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.output_indent == 0 {
            return Err(ApplicationError::Config {
                message: "output_indent must be at least 1".to_string(),
            });
        }
        if let Some((name, _)) = self.delimiters.iter().find(|(_, d)| d.is_empty()) {
            return Err(ApplicationError::Config {
                message: format!("empty delimiter for list `{name}`"),
            });
        }
        Ok(())
    }

    /// Merge options derived from these settings.
    pub fn to_merge_options(&self) -> MergeOptions {
        MergeOptions {
            deletion_token: self.deletion_token.clone(),
            delimiters: self.delimiters.clone(),
            strict: self.strict,
        }
    }

    /// Effective settings as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {e}"),
        })
    }
}
