//! Configuration loading and validation.
//!
//! Loads `topoaudit.toml` with per-section defaults. All sections use
//! `#[serde(default)]` so a minimal or empty config file is valid, and a
//! missing `[policy]` section means the built-in policy.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::inventory::DEFAULT_NAMESPACE_PREFIX;
use crate::policy::PolicyDocument;
use crate::sink::ReportFormat;

/// Config file name inside [`config_dir`].
pub const CONFIG_FILE_NAME: &str = "topoaudit.toml";

/// Upper bound for [`AuditConfig::workers`].
const MAX_WORKERS: usize = 64;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Which namespaces are in scope.
    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Audit execution settings.
    #[serde(default)]
    pub audit: AuditConfig,

    /// Output settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Classification and allow-list tables.
    #[serde(default)]
    pub policy: PolicyDocument,
}

/// Inventory scoping.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryConfig {
    /// Namespaces starting with this prefix are platform-owned.
    #[serde(default = "default_namespace_prefix")]
    pub namespace_prefix: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            namespace_prefix: default_namespace_prefix(),
        }
    }
}

/// Audit execution.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Maximum concurrent evaluation tasks.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Treat a skipped run as a failure.
    #[serde(default)]
    pub fail_on_skip: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            fail_on_skip: false,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: ReportFormat,
}

impl Config {
    /// Validate that configuration values are within sane bounds.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending value.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.inventory.namespace_prefix.trim().is_empty(),
            "inventory.namespace_prefix must not be empty"
        );
        anyhow::ensure!(
            (1..=MAX_WORKERS).contains(&self.audit.workers),
            "audit.workers must be in [1, {MAX_WORKERS}]"
        );
        self.policy.validate()?;
        Ok(())
    }
}

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or fails validation.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config at {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Load the config at `path`, or from the default location.
///
/// An explicit path must exist. A missing default file yields defaults.
///
/// # Errors
///
/// Returns an error if a present file cannot be loaded.
pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = path {
        return load_config(path);
    }

    let default_path = config_dir()?.join(CONFIG_FILE_NAME);
    if default_path.exists() {
        tracing::debug!(path = %default_path.display(), "loading default config");
        load_config(&default_path)
    } else {
        tracing::debug!("no config file found, using defaults");
        Ok(Config::default())
    }
}

/// Resolve the default config directory (`~/.topoaudit/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".topoaudit"))
}

// Default value functions for serde.

fn default_namespace_prefix() -> String {
    DEFAULT_NAMESPACE_PREFIX.to_owned()
}

fn default_workers() -> usize {
    4
}
