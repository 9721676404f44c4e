//! MiniPack Configuration Management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.minipack/config.toml`
//! - Local config: `minipack.toml` (next to the project being built)
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for MiniPack.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MinipackConfig {
    /// Optimizer configuration
    pub optimizer: OptimizerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl MinipackConfig {
    /// Validate the merged configuration before a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Some(root) = &self.optimizer.output_root else {
            return Err(ConfigError::ValidationError(
                "optimizer.output_root is required".to_string(),
            ));
        };
        if root.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "optimizer.output_root must not be empty".to_string(),
            ));
        }
        if self.optimizer.local_copy_dir.is_empty() {
            return Err(ConfigError::ValidationError(
                "optimizer.local_copy_dir must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply CLI overrides on top of the loaded configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(root) = &overrides.output_root {
            self.optimizer.output_root = Some(root.clone());
        }
        if let Some(dir) = &overrides.local_copy_dir {
            self.optimizer.local_copy_dir = dir.clone();
        }
        if let Some(log) = &overrides.log_file {
            self.optimizer.log_file = Some(log.clone());
        }
        if let Some(enabled) = overrides.enabled {
            self.optimizer.enabled = enabled;
        }
        if let Some(verbose) = overrides.verbose {
            self.optimizer.verbose = verbose;
        }
    }
}

/// Optimizer configuration.
///
/// # Example TOML
///
/// ```toml
/// [optimizer]
/// output_root = "dist/build/mp-weixin"
/// local_copy_dir = "sharedComponents"
/// enabled = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Root of the built bundle to optimize; required, no default
    pub output_root: Option<PathBuf>,

    /// Per-subpackage local shared-copy directory name
    pub local_copy_dir: String,

    /// Log file path; derived from the output root's parent when unset
    pub log_file: Option<PathBuf>,

    /// Echo per-step detail to the console
    pub verbose: bool,

    /// When false, the engine is a no-op pass-through
    pub enabled: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            output_root: None,
            local_copy_dir: "sharedComponents".to_string(),
            log_file: None,
            verbose: false,
            enabled: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter for console output (error, warn, info, debug, trace)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// CLI-sourced overrides applied after file-based configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub output_root: Option<PathBuf>,
    pub local_copy_dir: Option<String>,
    pub log_file: Option<PathBuf>,
    pub enabled: Option<bool>,
    pub verbose: Option<bool>,
}
