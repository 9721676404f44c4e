//! Usage Graph
//!
//! The brother-reference graph over shared components: a directed edge
//! `A -> B` means component A's manifests reference component B. The graph
//! is built once, from scanning only the shared-components subtree, before
//! any package-level scan runs; package scans only consume it.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::Direction;

use crate::bundle::BundleLayout;
use crate::report::RunReport;
use crate::scanner::collect_usage;

/// Directed component-reference graph with path-keyed node lookup.
#[derive(Debug, Default)]
pub struct UsageGraph {
    graph: StableGraph<PathBuf, ()>,
    indices: HashMap<PathBuf, NodeIndex>,
}

impl UsageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component node, returning the existing index if present.
    pub fn add_component(&mut self, dir: &Path) -> NodeIndex {
        if let Some(&ix) = self.indices.get(dir) {
            return ix;
        }
        let ix = self.graph.add_node(dir.to_path_buf());
        self.indices.insert(dir.to_path_buf(), ix);
        ix
    }

    /// Add a brother edge `from -> to`. Edges are deduplicated by target
    /// component directory.
    pub fn add_brother_edge(&mut self, from: &Path, to: &Path) {
        let from_ix = self.add_component(from);
        let to_ix = self.add_component(to);
        if !self.graph.contains_edge(from_ix, to_ix) {
            self.graph.add_edge(from_ix, to_ix, ());
        }
    }

    pub fn component_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.indices.contains_key(dir)
    }

    /// Components this component references (outgoing brother edges).
    pub fn brothers_of(&self, dir: &Path) -> BTreeSet<PathBuf> {
        self.neighbors(dir, Direction::Outgoing)
    }

    /// Components that reference this component (the transpose view).
    pub fn referenced_by(&self, dir: &Path) -> BTreeSet<PathBuf> {
        self.neighbors(dir, Direction::Incoming)
    }

    fn neighbors(&self, dir: &Path, direction: Direction) -> BTreeSet<PathBuf> {
        let Some(&ix) = self.indices.get(dir) else {
            return BTreeSet::new();
        };
        self.graph
            .neighbors_directed(ix, direction)
            .map(|n| self.graph[n].clone())
            .collect()
    }

    /// Transitive closure of `seeds` over brother edges.
    ///
    /// Standard fixed-point reachability on a possibly-cyclic graph; the
    /// result is order-independent and idempotent. Seeds without a node in
    /// the graph are kept in the result as-is (they simply contribute no
    /// further reachability).
    pub fn closure(&self, seeds: &BTreeSet<PathBuf>) -> BTreeSet<PathBuf> {
        let mut result = seeds.clone();
        let mut stack: Vec<NodeIndex> = seeds
            .iter()
            .filter_map(|p| self.indices.get(p).copied())
            .collect();

        while let Some(ix) = stack.pop() {
            for neighbor in self.graph.neighbors_directed(ix, Direction::Outgoing) {
                if result.insert(self.graph[neighbor].clone()) {
                    stack.push(neighbor);
                }
            }
        }

        result
    }
}

/// Build the brother-reference graph by scanning every component directory
/// under the shared components root.
///
/// Returns the graph together with the set of component directories
/// physically present under the root. A missing or empty shared
/// components root yields an empty graph; there is simply nothing to
/// relocate.
pub fn build_brother_graph(
    layout: &BundleLayout,
    report: &mut RunReport,
) -> (UsageGraph, BTreeSet<PathBuf>) {
    let mut graph = UsageGraph::new();

    let entries = match std::fs::read_dir(&layout.components_dir) {
        Ok(entries) => entries,
        Err(e) => {
            report.warn(format!(
                "shared components directory '{}' is not readable ({e}); nothing to optimize",
                layout.components_dir.display()
            ));
            return (graph, BTreeSet::new());
        }
    };

    let mut component_dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    component_dirs.sort();

    report.counters.components_scanned = component_dirs.len();
    report.info(format!(
        "scanning {} shared component(s) under '{}'",
        component_dirs.len(),
        layout.components_dir.display()
    ));

    for comp_dir in &component_dirs {
        graph.add_component(comp_dir);
        for brother in collect_usage(comp_dir, &layout.components_dir, report) {
            graph.add_brother_edge(comp_dir, &brother);
        }
    }

    // Cross-reference report, one line per component.
    for comp_dir in &component_dirs {
        let by = graph.referenced_by(comp_dir);
        let uses = graph.brothers_of(comp_dir);
        report.info(format!(
            "component '{}': referenced by {} component(s), references {} component(s)",
            basename(comp_dir),
            by.len(),
            uses.len()
        ));
    }

    (graph, component_dirs.into_iter().collect())
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
