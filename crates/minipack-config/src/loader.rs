//! Configuration loading and merging.
//!
//! Sources, in increasing precedence:
//! 1. Global: `~/.minipack/config.toml`
//! 2. Local: an explicit `--config` path, or `minipack.toml` in the
//!    project directory
//!
//! CLI overrides are applied by the caller afterwards via
//! [`MinipackConfig::apply_overrides`].

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{ConfigError, MinipackConfig};

/// Loads and merges MiniPack configuration files.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Explicit config file path; bypasses local-file discovery
    explicit_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit config file instead of discovering `minipack.toml`.
    pub fn with_explicit_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_path = Some(path.into());
        self
    }

    /// Path of the global configuration file.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".minipack").join("config.toml"))
    }

    /// Load and merge configuration, looking for the local file in
    /// `project_dir`.
    ///
    /// Missing files are fine; an unreadable or unparsable file that does
    /// exist is an error.
    pub fn load(&self, project_dir: &Path) -> Result<MinipackConfig, ConfigError> {
        let mut merged = toml::Table::new();

        if let Ok(global_path) = Self::global_config_path() {
            if global_path.exists() {
                debug!("loading global config from {}", global_path.display());
                merge_tables(&mut merged, read_table(&global_path)?);
            }
        }

        let local_path = match &self.explicit_path {
            Some(path) => Some(path.clone()),
            None => {
                let candidate = project_dir.join("minipack.toml");
                candidate.exists().then_some(candidate)
            }
        };
        if let Some(local_path) = local_path {
            debug!("loading local config from {}", local_path.display());
            merge_tables(&mut merged, read_table(&local_path)?);
        }

        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ValidationError(e.to_string()))
    }
}

fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    content
        .parse::<toml::Table>()
        .map_err(|e| ConfigError::parse_toml(path, e))
}

/// Overlay `overlay` onto `base`, recursing into nested tables so a local
/// file can override a single key without discarding the rest of a
/// section.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_sub)), toml::Value::Table(overlay_sub)) => {
                merge_tables(base_sub, overlay_sub);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
