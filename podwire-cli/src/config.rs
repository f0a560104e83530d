//! podwire configuration loading from `.podwirerc.toml`.
//!
//! Configuration is optional. Without a config file podwire reads targets
//! from `podwire.toml`, stops at the first failing target and prints tables.
//!
//! # Example Configuration
//!
//! ```toml
//! [manifest]
//! path = "Pods/podwire.toml"
//!
//! [integration]
//! keep_going = true
//!
//! [output]
//! format = "json"
//! color = false
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file, looked up in the working directory.
pub const CONFIG_FILE: &str = ".podwirerc.toml";

/// Manifest used when neither the command line nor the config names one.
pub const DEFAULT_MANIFEST: &str = "podwire.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Root configuration structure loaded from `.podwirerc.toml`.
///
/// All sections are optional and will use defaults if not specified.
#[derive(Debug, Deserialize, Default)]
pub struct PodwireConfig {
    /// Where the target manifest lives.
    #[serde(default)]
    pub manifest: ManifestSettings,

    /// Integration run behavior.
    #[serde(default)]
    pub integration: IntegrationSettings,

    /// Output formatting preferences.
    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Deserialize, Default)]
pub struct ManifestSettings {
    /// Manifest path, relative to the working directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
pub struct IntegrationSettings {
    /// Continue with the remaining targets after one fails.
    ///
    /// The run still exits nonzero when any target failed.
    #[serde(default)]
    pub keep_going: bool,
}

/// Output formatting preferences.
///
/// Command-line flags (e.g., `--format json`) override these settings.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// Valid values: `table`, `json`. Default: `table`
    #[serde(default)]
    pub format: Option<String>,

    /// Defaults to `true` when stdout is a TTY.
    #[serde(default)]
    pub color: Option<bool>,
}

impl PodwireConfig {
    /// Load configuration from `.podwirerc.toml` in the given directory.
    ///
    /// If the config file doesn't exist or can't be parsed, returns defaults.
    /// Parse errors are logged as warnings but don't cause failures.
    pub fn load(root: &Path) -> Self {
        match Self::load_strict(root) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}", e);
                Self::default()
            }
        }
    }

    /// Like [`PodwireConfig::load`], but an unreadable or malformed file is
    /// an error. A missing file still yields defaults.
    pub fn load_strict(root: &Path) -> Result<Self, ConfigError> {
        let config_path = root.join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: CONFIG_FILE.to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: CONFIG_FILE.to_string(),
            source,
        })
    }

    /// Resolve the manifest path: command line, then config, then
    /// `podwire.toml`.
    pub fn manifest_path(&self, cli: Option<PathBuf>) -> PathBuf {
        cli.or_else(|| self.manifest.path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST))
    }

    pub fn keep_going(&self) -> bool {
        self.integration.keep_going
    }

    /// Get the default output format, if configured.
    pub fn default_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    /// Returns the configured value, or `None` to use auto-detection.
    pub fn use_color(&self) -> Option<bool> {
        self.output.color
    }
}
