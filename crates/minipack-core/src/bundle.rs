//! Bundle Layout Discovery
//!
//! Reads the application manifest (`app.json`) at the root of a built
//! bundle and derives the package layout the rest of the engine operates
//! on: the main-package page roots, the subpackage roots, and the shared
//! components directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Fixed name of the shared components directory under the bundle root.
pub const SHARED_COMPONENTS_DIR: &str = "components";

/// Name of the application manifest at the bundle root.
pub const APP_MANIFEST: &str = "app.json";

/// Errors during bundle layout discovery.
///
/// Every variant is fatal: without a readable application manifest there
/// is no trustworthy way to determine package roots.
#[derive(Debug, Error)]
pub enum BundleError {
    /// Application manifest does not exist
    #[error("application manifest not found at '{0}'")]
    AppManifestMissing(PathBuf),

    /// Failed to read the application manifest
    #[error("failed to read application manifest '{path}': {source}")]
    ReadManifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the application manifest as JSON
    #[error("failed to parse application manifest '{path}': {source}")]
    ParseManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, BundleError>;

/// Application manifest schema, limited to the fields the engine consumes.
#[derive(Debug, Deserialize)]
struct AppManifestDoc {
    #[serde(default)]
    pages: Vec<String>,

    #[serde(default, rename = "subPackages")]
    sub_packages: Vec<SubPackageEntry>,
}

/// A `subPackages` entry; only `root` matters here.
#[derive(Debug, Deserialize)]
struct SubPackageEntry {
    root: String,
}

/// An independently-loadable subpackage of the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subpackage {
    /// Root-relative directory path from the application manifest
    pub name: String,
    /// Absolute path to the subpackage root
    pub root: PathBuf,
}

/// The discovered layout of a built bundle.
#[derive(Debug, Clone)]
pub struct BundleLayout {
    /// Absolute path to the bundle root
    pub root: PathBuf,
    /// Absolute path to the shared components directory
    pub components_dir: PathBuf,
    /// Absolute paths to the main-package page roots
    pub main_roots: Vec<PathBuf>,
    /// Subpackages declared in the application manifest
    pub subpackages: Vec<Subpackage>,
}

impl BundleLayout {
    /// Discover the bundle layout from the application manifest at `root`.
    ///
    /// Main-package page roots are the first path segment of each `pages`
    /// entry, deduplicated in declaration order; `["pages"]` when the
    /// manifest declares none.
    pub fn discover(root: &Path) -> Result<Self> {
        let manifest_path = root.join(APP_MANIFEST);
        if !manifest_path.exists() {
            return Err(BundleError::AppManifestMissing(manifest_path));
        }

        let content =
            std::fs::read_to_string(&manifest_path).map_err(|source| BundleError::ReadManifest {
                path: manifest_path.clone(),
                source,
            })?;

        let doc: AppManifestDoc =
            serde_json::from_str(&content).map_err(|source| BundleError::ParseManifest {
                path: manifest_path.clone(),
                source,
            })?;

        let mut main_segments: Vec<String> = Vec::new();
        for page in &doc.pages {
            if let Some(first) = page.split('/').next().filter(|s| !s.is_empty()) {
                if !main_segments.iter().any(|s| s == first) {
                    main_segments.push(first.to_string());
                }
            }
        }
        if main_segments.is_empty() {
            main_segments.push("pages".to_string());
        }

        let subpackages = doc
            .sub_packages
            .into_iter()
            .map(|entry| Subpackage {
                root: root.join(&entry.root),
                name: entry.root,
            })
            .collect::<Vec<_>>();

        debug!(
            "Bundle layout: {} main root(s), {} subpackage(s)",
            main_segments.len(),
            subpackages.len()
        );

        Ok(Self {
            components_dir: root.join(SHARED_COMPONENTS_DIR),
            main_roots: main_segments.iter().map(|s| root.join(s)).collect(),
            subpackages,
            root: root.to_path_buf(),
        })
    }
}
