//! Manifest Scanner
//!
//! Recursively discovers manifest (`.json`) files under a directory and
//! extracts declared component-usage references from them. A malformed
//! manifest is reported as a warning and skipped; it never aborts the
//! scan.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

use crate::paths;
use crate::report::RunReport;

/// Extension identifying manifest files.
pub const MANIFEST_EXT: &str = "json";

/// Errors while reading or parsing a single manifest file.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Failed to read a manifest file
    #[error("failed to read manifest '{path}': {source}")]
    ReadManifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a manifest file as JSON
    #[error("failed to parse manifest '{path}': {source}")]
    ParseManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ScanError>;

/// Per-node manifest schema, limited to the component-usage mapping.
#[derive(Debug, Default, Deserialize)]
pub struct NodeManifest {
    /// Declared component references: display name to relative path
    #[serde(default, rename = "usingComponents")]
    pub using_components: BTreeMap<String, String>,
}

/// Lazily yield every manifest file under `root`, at any depth.
///
/// Each file is visited exactly once; no ordering is guaranteed. Walk
/// errors (unreadable entries) are logged and skipped.
pub fn manifest_files(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root).into_iter().filter_map(|entry| {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Error walking directory: {e}");
                return None;
            }
        };
        if !entry.file_type().is_file() {
            return None;
        }
        let path = entry.into_path();
        match path.extension() {
            Some(ext) if ext == MANIFEST_EXT => Some(path),
            _ => None,
        }
    })
}

/// Read and parse one manifest file.
pub fn parse_manifest(path: &Path) -> Result<NodeManifest> {
    let content = std::fs::read_to_string(path).map_err(|source| ScanError::ReadManifest {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ScanError::ParseManifest {
        path: path.to_path_buf(),
        source,
    })
}

/// Extract the set of shared components referenced by one manifest.
///
/// Each `usingComponents` value is resolved against the manifest's own
/// directory. Only targets under `components_dir` are kept, and each is
/// canonicalized to its top-level component directory: a reference may
/// point at a sub-file inside a component, but graph edges and relocation
/// always operate at whole-component granularity. A reference that
/// resolves back into the consumer's own component directory is a
/// self-reference and is dropped.
pub fn extract_references(
    manifest_path: &Path,
    manifest: &NodeManifest,
    components_dir: &Path,
) -> BTreeSet<PathBuf> {
    let mut refs = BTreeSet::new();
    let Some(manifest_dir) = manifest_path.parent() else {
        return refs;
    };

    for value in manifest.using_components.values() {
        let resolved = paths::normalize(&manifest_dir.join(value));
        let Ok(below_root) = resolved.strip_prefix(components_dir) else {
            continue;
        };
        let Some(Component::Normal(first)) = below_root.components().next() else {
            continue;
        };
        let component_dir = components_dir.join(first);
        if manifest_path.starts_with(&component_dir) {
            continue;
        }
        refs.insert(component_dir);
    }

    refs
}

/// Collect every shared component directly referenced by any manifest
/// under `root`.
///
/// Parse failures are recorded as warnings on the report and the scan
/// continues with the next file.
pub fn collect_usage(
    root: &Path,
    components_dir: &Path,
    report: &mut RunReport,
) -> BTreeSet<PathBuf> {
    let mut usage = BTreeSet::new();
    if !root.is_dir() {
        return usage;
    }

    for manifest_path in manifest_files(root) {
        match parse_manifest(&manifest_path) {
            Ok(manifest) => {
                report.counters.manifests_parsed += 1;
                usage.extend(extract_references(&manifest_path, &manifest, components_dir));
            }
            Err(e) => report.warn(format!("skipping manifest: {e}")),
        }
    }

    usage
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_manifest_files_finds_nested_json() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("a/index.json"), "{}");
        write(&temp.path().join("a/b/card.json"), "{}");
        write(&temp.path().join("a/b/card.js"), "// not a manifest");

        let mut found: Vec<_> = manifest_files(temp.path()).collect();
        found.sort();
        assert_eq!(
            found,
            vec![
                temp.path().join("a/b/card.json"),
                temp.path().join("a/index.json"),
            ]
        );
    }

    #[test]
    fn test_extract_references_canonicalizes_to_component_dir() {
        let components_dir = Path::new("/dist/components");
        let manifest_path = Path::new("/dist/pages/home/index.json");
        let manifest = NodeManifest {
            using_components: BTreeMap::from([
                // Points at a sub-file inside the component
                ("card".to_string(), "../../components/card/inner/icon".to_string()),
                ("badge".to_string(), "../../components/badge/index".to_string()),
            ]),
        };

        let refs = extract_references(manifest_path, &manifest, components_dir);
        assert_eq!(
            refs,
            BTreeSet::from([
                PathBuf::from("/dist/components/badge"),
                PathBuf::from("/dist/components/card"),
            ])
        );
    }

    #[test]
    fn test_extract_references_ignores_non_shared_targets() {
        let components_dir = Path::new("/dist/components");
        let manifest_path = Path::new("/dist/pages/home/index.json");
        let manifest = NodeManifest {
            using_components: BTreeMap::from([(
                "local".to_string(),
                "./local-widget/index".to_string(),
            )]),
        };

        let refs = extract_references(manifest_path, &manifest, components_dir);
        assert!(refs.is_empty());
    }

    #[test]
    fn test_extract_references_drops_self_reference() {
        let components_dir = Path::new("/dist/components");
        let manifest_path = Path::new("/dist/components/card/index.json");
        let manifest = NodeManifest {
            using_components: BTreeMap::from([
                ("icon".to_string(), "./inner/icon".to_string()),
                ("badge".to_string(), "../badge/index".to_string()),
            ]),
        };

        let refs = extract_references(manifest_path, &manifest, components_dir);
        assert_eq!(refs, BTreeSet::from([PathBuf::from("/dist/components/badge")]));
    }

    #[test]
    fn test_collect_usage_skips_malformed_manifest() {
        let temp = TempDir::new().unwrap();
        let components_dir = temp.path().join("components");
        write(
            &temp.path().join("pages/home/index.json"),
            r#"{"usingComponents": {"card": "../../components/card/index"}}"#,
        );
        write(&temp.path().join("pages/broken.json"), "{not json");

        let mut report = RunReport::new();
        let usage = collect_usage(&temp.path().join("pages"), &components_dir, &mut report);

        assert_eq!(usage, BTreeSet::from([components_dir.join("card")]));
        assert_eq!(report.counters.manifests_parsed, 1);
        assert!(report.messages().iter().any(|m| m.starts_with("[WARN]")));
    }

    #[test]
    fn test_collect_usage_missing_root_is_empty() {
        let temp = TempDir::new().unwrap();
        let mut report = RunReport::new();
        let usage = collect_usage(
            &temp.path().join("no-such-dir"),
            &temp.path().join("components"),
            &mut report,
        );
        assert!(usage.is_empty());
    }
}
