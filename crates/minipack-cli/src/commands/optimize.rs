//! Optimize command - Run the full optimization pass on a built bundle
//!
//! Relocates shared components into the subpackages that use them,
//! prunes what the main package no longer needs, and rewrites path
//! literals so every reference still resolves.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use minipack_config::ConfigOverrides;
use minipack_core::Optimizer;

use super::{init_logging, load_config, print_info, to_optimize_options};
use crate::GlobalOptions;

/// Arguments for the optimize command
#[derive(Args, Debug)]
pub struct OptimizeArgs {
    /// Root of the built bundle (the directory containing app.json)
    output_root: PathBuf,

    /// Name of the per-subpackage local copy directory
    #[arg(long)]
    copy_dir: Option<String>,

    /// Where to write the run log
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Analyze only; skip all mutation and rewriting
    #[arg(long, short = 'n')]
    dry_run: bool,
}

/// Execute the optimize command
pub fn execute(args: OptimizeArgs, global: GlobalOptions) -> Result<()> {
    let overrides = ConfigOverrides {
        output_root: Some(args.output_root.clone()),
        local_copy_dir: args.copy_dir.clone(),
        log_file: args.log_file.clone(),
        verbose: global.verbose.then_some(true),
        ..Default::default()
    };
    let config = load_config(&global, &args.output_root, &overrides)?;
    init_logging(&global, &config)?;
    let optimizer = Optimizer::new(to_optimize_options(&config)?)
        .context("Failed to create optimizer")?;

    if args.dry_run {
        let mut report = minipack_core::RunReport::new();
        let analysis = optimizer
            .analyze(&mut report)
            .context("Analysis failed")?;
        print_info(
            &format!(
                "dry run: {} component(s) would be retained, {} pruned",
                analysis.plan.retained.len(),
                analysis.plan.prunable.len()
            ),
            global.quiet,
        );
        return Ok(());
    }

    let summary = optimizer.run().context("Optimization pass failed")?;
    for line in &summary.summary {
        print_info(line, global.quiet);
    }
    if let Some(ref log_file) = summary.log_file {
        print_info(&format!("run log: {}", log_file.display()), global.quiet);
    }
    Ok(())
}
