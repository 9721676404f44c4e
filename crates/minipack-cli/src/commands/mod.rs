//! CLI command implementations
//!
//! This module contains all MiniPack CLI command implementations.

pub mod analyze;
pub mod optimize;

use std::path::Path;

use anyhow::{Context, Result};
use minipack_config::{ConfigLoader, ConfigOverrides, MinipackConfig};
use minipack_core::OptimizeOptions;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::GlobalOptions;

/// Load configuration for a run on `output_root`.
///
/// The local `minipack.toml` is discovered next to the bundle (in the
/// output root's parent directory) unless an explicit `--config` path was
/// given, then CLI overrides are applied on top of the merged result.
pub fn load_config(
    global: &GlobalOptions,
    output_root: &Path,
    overrides: &ConfigOverrides,
) -> Result<MinipackConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(ref config_path) = global.config {
        loader = loader.with_explicit_path(config_path);
    }

    let project_dir = output_root.parent().unwrap_or(output_root);
    let mut config = loader
        .load(project_dir)
        .context("Failed to load configuration")?;

    config.apply_overrides(overrides);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Turn the merged configuration into engine options.
pub fn to_optimize_options(config: &MinipackConfig) -> Result<OptimizeOptions> {
    let output_root = config
        .optimizer
        .output_root
        .as_ref()
        .context("optimizer.output_root is required")?;

    let mut options = OptimizeOptions::new(output_root)
        .with_local_copy_dir(&config.optimizer.local_copy_dir)
        .with_enabled(config.optimizer.enabled);
    if let Some(ref log_file) = config.optimizer.log_file {
        options = options.with_log_file(log_file);
    }
    Ok(options)
}

/// Install the global log subscriber once configuration is known.
///
/// `--quiet` wins over everything; `optimizer.verbose` (from a config
/// file or the `--verbose` flag, which overrides into it) raises the
/// level to debug; otherwise `logging.level` from the config applies.
pub fn init_logging(global: &GlobalOptions, config: &MinipackConfig) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(global.quiet, config))
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn log_level(quiet: bool, config: &MinipackConfig) -> Level {
    if quiet {
        Level::ERROR
    } else if config.optimizer.verbose {
        Level::DEBUG
    } else {
        config.logging.level.parse().unwrap_or(Level::INFO)
    }
}

/// Print an info message (respects quiet flag).
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        println!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_log_level_quiet_wins() {
        let mut config = MinipackConfig::default();
        config.optimizer.verbose = true;
        assert_eq!(log_level(true, &config), Level::ERROR);
    }

    #[test]
    fn test_log_level_verbose_raises_to_debug() {
        let mut config = MinipackConfig::default();
        config.optimizer.verbose = true;
        assert_eq!(log_level(false, &config), Level::DEBUG);
    }

    #[test]
    fn test_log_level_honors_logging_section() {
        let mut config = MinipackConfig::default();
        config.logging.level = "warn".to_string();
        assert_eq!(log_level(false, &config), Level::WARN);
    }

    #[test]
    fn test_log_level_default_is_info() {
        let config = MinipackConfig::default();
        assert_eq!(log_level(false, &config), Level::INFO);
    }

    #[test]
    fn test_to_optimize_options_requires_output_root() {
        let config = MinipackConfig::default();
        assert!(to_optimize_options(&config).is_err());
    }

    #[test]
    fn test_to_optimize_options_carries_settings() {
        let mut config = MinipackConfig::default();
        config.optimizer.output_root = Some(PathBuf::from("/dist"));
        config.optimizer.local_copy_dir = "localShared".to_string();
        config.optimizer.log_file = Some(PathBuf::from("/tmp/run.log"));
        config.optimizer.enabled = false;

        let options = to_optimize_options(&config).unwrap();
        assert_eq!(options.output_root, PathBuf::from("/dist"));
        assert_eq!(options.local_copy_dir, "localShared");
        assert_eq!(options.log_file, Some(PathBuf::from("/tmp/run.log")));
        assert!(!options.enabled);
    }
}
