//! Placement Decider
//!
//! A pure function of the computed usage sets: every shared component is
//! classified as retained (needed by the main package), duplicated into
//! one or more subpackages, or prunable. Decisions are fully computed
//! before any mutation begins and never revised mid-pass.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// The retain / duplicate / prune classification for every component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementPlan {
    /// Components that stay in the shared root: the main package's usage
    /// set. Never deleted, never moved.
    pub retained: BTreeSet<PathBuf>,
    /// Per-subpackage duplication sets, keyed by subpackage name. Each
    /// subpackage receives a private copy of every component it
    /// transitively needs, independent of whether Main also retains it.
    pub duplications: BTreeMap<String, BTreeSet<PathBuf>>,
    /// Components not reachable from the main package; their recognized
    /// component files are deleted from the shared root.
    pub prunable: BTreeSet<PathBuf>,
}

impl PlacementPlan {
    /// Subpackages whose duplication set contains `component`.
    pub fn subpackages_needing(&self, component: &PathBuf) -> Vec<&str> {
        self.duplications
            .iter()
            .filter(|(_, set)| set.contains(component))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Derive the placement plan from the per-package usage sets.
///
/// `all_components` is the set of component directories physically present
/// under the shared root; duplication sets are restricted to it since only
/// existing directories can be copied.
pub fn decide(
    all_components: &BTreeSet<PathBuf>,
    main_usage: &BTreeSet<PathBuf>,
    sub_usage: &BTreeMap<String, BTreeSet<PathBuf>>,
) -> PlacementPlan {
    let retained: BTreeSet<PathBuf> = main_usage.intersection(all_components).cloned().collect();
    let prunable: BTreeSet<PathBuf> = all_components.difference(main_usage).cloned().collect();

    let duplications = sub_usage
        .iter()
        .map(|(name, usage)| {
            let copies: BTreeSet<PathBuf> =
                usage.intersection(all_components).cloned().collect();
            (name.clone(), copies)
        })
        .collect();

    PlacementPlan {
        retained,
        duplications,
        prunable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn set(paths: &[&str]) -> BTreeSet<PathBuf> {
        paths.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_retained_is_main_usage() {
        let all = set(&["/c/x", "/c/y", "/c/z"]);
        let main = set(&["/c/x"]);
        let subs = BTreeMap::from([("sub1".to_string(), set(&["/c/y"]))]);

        let plan = decide(&all, &main, &subs);
        assert_eq!(plan.retained, set(&["/c/x"]));
        assert_eq!(plan.prunable, set(&["/c/y", "/c/z"]));
    }

    #[test]
    fn test_duplication_is_unconditional_on_main_retention() {
        // sub1 needs x even though Main also retains it.
        let all = set(&["/c/x", "/c/y"]);
        let main = set(&["/c/x"]);
        let subs = BTreeMap::from([("sub1".to_string(), set(&["/c/x", "/c/y"]))]);

        let plan = decide(&all, &main, &subs);
        assert_eq!(plan.retained, set(&["/c/x"]));
        assert_eq!(plan.duplications["sub1"], set(&["/c/x", "/c/y"]));
        assert_eq!(plan.prunable, set(&["/c/y"]));
    }

    #[test]
    fn test_dangling_references_do_not_reach_the_plan() {
        // A manifest may reference a component directory that does not
        // physically exist; it must not show up as a copy source.
        let all = set(&["/c/x"]);
        let main = set(&["/c/x", "/c/ghost"]);
        let subs = BTreeMap::from([("sub1".to_string(), set(&["/c/ghost"]))]);

        let plan = decide(&all, &main, &subs);
        assert_eq!(plan.retained, set(&["/c/x"]));
        assert!(plan.duplications["sub1"].is_empty());
        assert!(plan.prunable.is_empty());
    }

    #[test]
    fn test_subpackages_needing() {
        let all = set(&["/c/x", "/c/y"]);
        let main = set(&[]);
        let subs = BTreeMap::from([
            ("sub1".to_string(), set(&["/c/x", "/c/y"])),
            ("sub2".to_string(), set(&["/c/y"])),
        ]);

        let plan = decide(&all, &main, &subs);
        assert_eq!(plan.subpackages_needing(&PathBuf::from("/c/y")), vec!["sub1", "sub2"]);
        assert_eq!(plan.subpackages_needing(&PathBuf::from("/c/x")), vec!["sub1"]);
    }
}
