//! Analyze command - Print placement decisions without mutating anything
//!
//! Runs the scan / graph / closure / decide pipeline over the bundle and
//! reports which components would be retained, duplicated, or pruned.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use minipack_config::ConfigOverrides;
use minipack_core::{Analysis, Optimizer, RunReport};

use super::{init_logging, load_config, print_info, to_optimize_options};
use crate::GlobalOptions;

/// Arguments for the analyze command
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Root of the built bundle (the directory containing app.json)
    output_root: PathBuf,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the analyze command
pub fn execute(args: AnalyzeArgs, global: GlobalOptions) -> Result<()> {
    let overrides = ConfigOverrides {
        output_root: Some(args.output_root.clone()),
        verbose: global.verbose.then_some(true),
        ..Default::default()
    };
    let config = load_config(&global, &args.output_root, &overrides)?;
    init_logging(&global, &config)?;
    let optimizer = Optimizer::new(to_optimize_options(&config)?)
        .context("Failed to create optimizer")?;

    let mut report = RunReport::new();
    let analysis = optimizer.analyze(&mut report).context("Analysis failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&to_json(&analysis))?);
    } else {
        print_analysis(&analysis, &global);
    }
    Ok(())
}

fn to_json(analysis: &Analysis) -> serde_json::Value {
    serde_json::json!({
        "components": names(&analysis.all_components),
        "main_usage": names(&analysis.main_usage),
        "subpackages": analysis
            .sub_usage
            .iter()
            .map(|(name, usage)| {
                serde_json::json!({
                    "name": name,
                    "usage": names(usage),
                    "duplications": analysis
                        .plan
                        .duplications
                        .get(name)
                        .map(names)
                        .unwrap_or_default(),
                })
            })
            .collect::<Vec<_>>(),
        "retained": names(&analysis.plan.retained),
        "prunable": names(&analysis.plan.prunable),
    })
}

fn print_analysis(analysis: &Analysis, global: &GlobalOptions) {
    let quiet = global.quiet;
    print_info(
        &format!(
            "{} shared component(s), {} subpackage(s)",
            analysis.all_components.len(),
            analysis.layout.subpackages.len()
        ),
        quiet,
    );
    print_info(
        &format!("retained in shared root: {}", names(&analysis.plan.retained).join(", ")),
        quiet,
    );
    for (name, copied) in &analysis.plan.duplications {
        if copied.is_empty() {
            continue;
        }
        print_info(
            &format!("subpackage '{}' receives: {}", name, names(copied).join(", ")),
            quiet,
        );
    }
    print_info(
        &format!("prunable: {}", names(&analysis.plan.prunable).join(", ")),
        quiet,
    );
}

fn names(set: &BTreeSet<PathBuf>) -> Vec<String> {
    set.iter().map(|p| component_name(p)).collect()
}

fn component_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| dir.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_name() {
        assert_eq!(component_name(Path::new("/dist/components/y")), "y");
    }

    #[test]
    fn test_names_sorted_by_path() {
        let set = BTreeSet::from([
            PathBuf::from("/dist/components/b"),
            PathBuf::from("/dist/components/a"),
        ]);
        assert_eq!(names(&set), vec!["a".to_string(), "b".to_string()]);
    }
}
