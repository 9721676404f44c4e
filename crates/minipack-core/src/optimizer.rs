//! Optimization Pass Orchestration
//!
//! One synchronous, run-to-completion pass over an immutable snapshot of
//! the built bundle: scan, build the brother graph, compute per-package
//! reachability closures, decide placement, then (and only then) mutate
//! the tree: copy, prune, rewrite. Decisions are never revised once
//! mutation has begun.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::bundle::{BundleError, BundleLayout};
use crate::graph::{build_brother_graph, UsageGraph};
use crate::placement::{decide, PlacementPlan};
use crate::relocate::{copy_dir_recursive, prune_component, RelocateError};
use crate::report::{default_log_file, Counters, RunReport};
use crate::rewrite::{RewriteError, Rewriter};
use crate::scanner::collect_usage;

/// Default name of the per-subpackage local shared-copy directory.
pub const DEFAULT_LOCAL_COPY_DIR: &str = "sharedComponents";

/// Errors that abort an optimization pass.
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// No output root was configured
    #[error("output root is required")]
    MissingOutputRoot,

    /// Configured output root does not exist
    #[error("output root '{0}' is not a directory")]
    OutputRootNotFound(PathBuf),

    /// Bundle layout discovery failed
    #[error(transparent)]
    Bundle(#[from] BundleError),

    /// Copy/delete failure
    #[error(transparent)]
    Relocate(#[from] RelocateError),

    /// Path rewriting failure
    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    /// Failed to write the run log
    #[error("failed to write log file '{path}': {source}")]
    WriteLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, OptimizeError>;

/// Configuration accepted by the engine.
#[derive(Debug, Clone)]
pub struct OptimizeOptions {
    /// Root of the built bundle; required
    pub output_root: PathBuf,
    /// Name of the per-subpackage local shared-copy directory
    pub local_copy_dir: String,
    /// Log file path; derived from the output root's parent when unset
    pub log_file: Option<PathBuf>,
    /// When false the engine is a no-op pass-through
    pub enabled: bool,
}

impl OptimizeOptions {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            local_copy_dir: DEFAULT_LOCAL_COPY_DIR.to_string(),
            log_file: None,
            enabled: true,
        }
    }

    /// Override the local shared-copy directory name.
    pub fn with_local_copy_dir(mut self, name: impl Into<String>) -> Self {
        self.local_copy_dir = name.into();
        self
    }

    /// Override the log file path.
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Enable or disable the whole pass.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Everything computed before any mutation: the layout, the brother
/// graph, the per-package usage closures, and the placement plan.
#[derive(Debug)]
pub struct Analysis {
    pub layout: BundleLayout,
    pub graph: UsageGraph,
    /// Component directories physically present under the shared root
    pub all_components: BTreeSet<PathBuf>,
    /// Main package usage set (transitive closure over brother edges)
    pub main_usage: BTreeSet<PathBuf>,
    /// Per-subpackage usage sets, keyed by subpackage name
    pub sub_usage: BTreeMap<String, BTreeSet<PathBuf>>,
    pub plan: PlacementPlan,
}

/// Outcome of a completed pass.
#[derive(Debug)]
pub struct RunSummary {
    /// False when the pass was a disabled no-op
    pub enabled: bool,
    pub counters: Counters,
    /// Components in the shared root before the pass
    pub components_before: usize,
    /// Components retained in the shared root after the pass
    pub components_after: usize,
    /// Human-readable summary lines (also present in the log)
    pub summary: Vec<String>,
    /// Where the run log was written
    pub log_file: Option<PathBuf>,
}

impl RunSummary {
    fn disabled() -> Self {
        Self {
            enabled: false,
            counters: Counters::default(),
            components_before: 0,
            components_after: 0,
            summary: vec!["optimizer disabled; bundle left untouched".to_string()],
            log_file: None,
        }
    }
}

/// The usage-graph analysis and relocation engine.
pub struct Optimizer {
    options: OptimizeOptions,
}

impl Optimizer {
    /// Create an optimizer, validating the configuration surface.
    pub fn new(options: OptimizeOptions) -> Result<Self> {
        if options.output_root.as_os_str().is_empty() {
            return Err(OptimizeError::MissingOutputRoot);
        }
        Ok(Self { options })
    }

    pub fn options(&self) -> &OptimizeOptions {
        &self.options
    }

    /// Compute the full analysis without touching the tree.
    pub fn analyze(&self, report: &mut RunReport) -> Result<Analysis> {
        if !self.options.output_root.is_dir() {
            return Err(OptimizeError::OutputRootNotFound(
                self.options.output_root.clone(),
            ));
        }

        let layout = BundleLayout::discover(&self.options.output_root)?;
        report.counters.manifests_parsed += 1;

        // Brother edges come only from the shared-components subtree, and
        // are fixed before any package-level scan runs.
        let (graph, all_components) = build_brother_graph(&layout, report);

        let mut main_direct = BTreeSet::new();
        for root in &layout.main_roots {
            main_direct.extend(collect_usage(root, &layout.components_dir, report));
        }
        let main_usage = graph.closure(&main_direct);
        report.info(format!(
            "main package uses {} component(s) ({} direct): {}",
            main_usage.len(),
            main_direct.len(),
            names(&main_usage)
        ));

        let mut sub_usage = BTreeMap::new();
        for sub in &layout.subpackages {
            let direct = collect_usage(&sub.root, &layout.components_dir, report);
            let usage = graph.closure(&direct);
            report.info(format!(
                "subpackage '{}' uses {} component(s): {}",
                sub.name,
                usage.len(),
                names(&usage)
            ));
            sub_usage.insert(sub.name.clone(), usage);
        }

        let plan = decide(&all_components, &main_usage, &sub_usage);

        Ok(Analysis {
            layout,
            graph,
            all_components,
            main_usage,
            sub_usage,
            plan,
        })
    }

    /// Run the full pass: analyze, then copy, prune, and rewrite.
    ///
    /// The accumulated log buffer is written to the configured log file on
    /// completion, and flushed immediately when a fatal error aborts the
    /// pass, so diagnostic context survives the abort.
    pub fn run(&self) -> Result<RunSummary> {
        if !self.options.enabled {
            info!("optimizer disabled; pass-through");
            return Ok(RunSummary::disabled());
        }

        let log_file = self
            .options
            .log_file
            .clone()
            .unwrap_or_else(|| default_log_file(&self.options.output_root));

        let mut report = RunReport::new();
        match self.run_inner(&mut report) {
            Ok(mut summary) => {
                report
                    .write_to(&log_file)
                    .map_err(|source| OptimizeError::WriteLog {
                        path: log_file.clone(),
                        source,
                    })?;
                summary.log_file = Some(log_file);
                Ok(summary)
            }
            Err(e) => {
                report.error(format!("optimization pass aborted: {e}"));
                if let Err(write_err) = report.write_to(&log_file) {
                    tracing::error!(
                        "could not flush log to '{}': {write_err}",
                        log_file.display()
                    );
                }
                Err(e)
            }
        }
    }

    fn run_inner(&self, report: &mut RunReport) -> Result<RunSummary> {
        let analysis = self.analyze(report)?;
        let components_before = analysis.all_components.len();

        // Mutation starts here; the plan is fixed.
        for component in &analysis.all_components {
            let name = component_name(component);

            for sub_name in analysis.plan.subpackages_needing(component) {
                let Some(sub) = analysis
                    .layout
                    .subpackages
                    .iter()
                    .find(|s| s.name == sub_name)
                else {
                    continue;
                };
                let target = sub
                    .root
                    .join(&self.options.local_copy_dir)
                    .join(&name);
                copy_dir_recursive(component, &target)?;
                report.counters.components_copied += 1;
                report.info(format!(
                    "copied component '{name}' into subpackage '{sub_name}'"
                ));
            }

            if analysis.plan.retained.contains(component) {
                report.info(format!(
                    "component '{name}' used by main package; retained in shared root"
                ));
                continue;
            }

            let outcome = prune_component(component)?;
            report.counters.components_pruned += 1;
            if outcome.preserved.is_empty() {
                report.info(format!(
                    "pruned component '{name}' ({} file(s) removed)",
                    outcome.removed_files
                ));
            } else {
                report.info(format!(
                    "pruned component '{name}' ({} file(s) removed); preserved freestanding files: {}",
                    outcome.removed_files,
                    outcome
                        .preserved
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
            }
        }

        // Rewrites, last step per relocated subtree. Subpackages with an
        // empty usage set received no copies and need no rewriting.
        let rewriter = Rewriter::new(&analysis.layout, &self.options.local_copy_dir);
        for sub in &analysis.layout.subpackages {
            let Some(copied) = analysis.plan.duplications.get(&sub.name) else {
                continue;
            };
            if copied.is_empty() {
                continue;
            }
            report.info(format!(
                "rewriting component references in subpackage '{}'",
                sub.name
            ));
            rewriter.rewrite_subpackage(sub, report)?;
            rewriter.rewrite_local_copies(sub, copied, report)?;
        }

        let components_after = analysis.plan.retained.len();
        let summary = report.push_summary(components_before, components_after);

        Ok(RunSummary {
            enabled: true,
            counters: report.counters,
            components_before,
            components_after,
            summary,
            log_file: None,
        })
    }
}

fn component_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| dir.display().to_string())
}

fn names(set: &BTreeSet<PathBuf>) -> String {
    set.iter()
        .map(|p| component_name(p))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_output_root_is_rejected() {
        let result = Optimizer::new(OptimizeOptions::new(""));
        assert!(matches!(result, Err(OptimizeError::MissingOutputRoot)));
    }

    #[test]
    fn test_nonexistent_output_root_fails_analysis() {
        let optimizer = Optimizer::new(OptimizeOptions::new("/no/such/bundle")).unwrap();
        let mut report = RunReport::new();
        let result = optimizer.analyze(&mut report);
        assert!(matches!(result, Err(OptimizeError::OutputRootNotFound(_))));
    }

    #[test]
    fn test_disabled_pass_is_noop() {
        let optimizer =
            Optimizer::new(OptimizeOptions::new("/no/such/bundle").with_enabled(false)).unwrap();
        let summary = optimizer.run().unwrap();
        assert!(!summary.enabled);
        assert!(summary.log_file.is_none());
    }

    #[test]
    fn test_options_builders() {
        let options = OptimizeOptions::new("/dist")
            .with_local_copy_dir("localShared")
            .with_log_file("/tmp/run.log");
        assert_eq!(options.local_copy_dir, "localShared");
        assert_eq!(options.log_file, Some(PathBuf::from("/tmp/run.log")));
        assert!(options.enabled);
    }
}
