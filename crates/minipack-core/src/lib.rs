//! MiniPack Core - Component usage-graph analysis and relocation
//!
//! This crate rewrites the on-disk output of a mini-program build so that
//! each shared component physically resides only where it is needed:
//! - Bundle layout discovery from the application manifest
//! - Recursive manifest scanning and component-reference extraction
//! - Brother-reference graph construction and reachability closures
//! - Retain / duplicate / prune placement decisions
//! - Directory relocation and path-literal rewriting

pub mod bundle;
pub mod graph;
pub mod optimizer;
pub mod paths;
pub mod placement;
pub mod relocate;
pub mod report;
pub mod rewrite;
pub mod scanner;

// Bundle re-exports
pub use bundle::{BundleError, BundleLayout, Subpackage, SHARED_COMPONENTS_DIR};

// Scanner re-exports
pub use scanner::{collect_usage, extract_references, NodeManifest, ScanError};

// Graph re-exports
pub use graph::{build_brother_graph, UsageGraph};

// Placement re-exports
pub use placement::{decide, PlacementPlan};

// Relocation re-exports
pub use relocate::{copy_dir_recursive, prune_component, PruneOutcome, RelocateError};

// Rewriter re-exports
pub use rewrite::{rewrite_parent_literals, rewrite_prefix, RewriteError, Rewriter};

// Reporting re-exports
pub use report::{Counters, RunReport};

// Optimizer re-exports
pub use optimizer::{Analysis, OptimizeError, OptimizeOptions, Optimizer, RunSummary};
