//! Relocator
//!
//! Physically realizes placement decisions: copies component subtrees into
//! a subpackage's local shared-copy area, and prunes unreferenced
//! components from the shared root, file-type-aware. A script file without
//! a sibling manifest of the same base name is treated as a freestanding
//! utility module and preserved.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// File extensions recognized as component files (manifest, script,
/// template, style). Only these are deletion candidates during pruning.
pub const COMPONENT_FILE_EXTS: [&str; 4] = ["json", "js", "wxml", "wxss"];

/// Errors during copy/delete operations. All fatal: a failed copy or
/// delete leaves the bundle in a state the engine cannot reason about.
#[derive(Debug, Error)]
pub enum RelocateError {
    /// Failed to copy a file
    #[error("failed to copy '{src}' to '{dest}': {source}")]
    Copy {
        src: PathBuf,
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a target directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to delete a file or directory
    #[error("failed to delete '{path}': {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to list a directory
    #[error("failed to read directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, RelocateError>;

/// Recursively copy `src` into `dest`, preserving relative structure.
///
/// Directory creation is idempotent; each file copy is all-or-nothing.
/// Returns the number of files copied.
pub fn copy_dir_recursive(src: &Path, dest: &Path) -> Result<usize> {
    std::fs::create_dir_all(dest).map_err(|source| RelocateError::CreateDir {
        path: dest.to_path_buf(),
        source,
    })?;

    let entries = std::fs::read_dir(src).map_err(|source| RelocateError::ReadDir {
        path: src.to_path_buf(),
        source,
    })?;

    let mut copied = 0;
    for entry in entries {
        let entry = entry.map_err(|source| RelocateError::ReadDir {
            path: src.to_path_buf(),
            source,
        })?;
        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());

        if src_path.is_dir() {
            copied += copy_dir_recursive(&src_path, &dest_path)?;
        } else {
            std::fs::copy(&src_path, &dest_path).map_err(|source| RelocateError::Copy {
                src: src_path.clone(),
                dest: dest_path.clone(),
                source,
            })?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Outcome of pruning one component directory.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PruneOutcome {
    /// Component files deleted
    pub removed_files: usize,
    /// Freestanding files preserved (scripts without a sibling manifest,
    /// plus any file type the pruner does not recognize)
    pub preserved: Vec<PathBuf>,
    /// Whether the component directory itself was removed (it was empty
    /// after pruning)
    pub dir_removed: bool,
}

/// Delete a component's files from the shared root.
///
/// Only recognized component-file extensions are deleted. A `.js` script
/// is deleted only when a sibling `.json` manifest with the same base name
/// exists next to it; without one it is a freestanding module possibly
/// still imported by retained code, and is preserved. Directories left
/// empty afterwards are removed; directories holding preserved files are
/// kept.
pub fn prune_component(dir: &Path) -> Result<PruneOutcome> {
    let mut outcome = PruneOutcome::default();
    outcome.dir_removed = prune_dir(dir, &mut outcome)?;
    Ok(outcome)
}

fn prune_dir(dir: &Path, outcome: &mut PruneOutcome) -> Result<bool> {
    let entries = std::fs::read_dir(dir).map_err(|source| RelocateError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = Vec::new();
    let mut subdirs: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| RelocateError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else {
            files.push(path);
        }
    }

    // Sibling-manifest checks run against this snapshot of the listing,
    // not post-deletion disk state, so iteration order cannot flip a
    // script between deleted and preserved.
    let manifests: Vec<PathBuf> = files
        .iter()
        .filter(|p| p.extension().is_some_and(|e| e == "json"))
        .cloned()
        .collect();

    for subdir in subdirs {
        prune_dir(&subdir, outcome)?;
    }

    for path in files {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if !COMPONENT_FILE_EXTS.contains(&ext.as_str()) {
            outcome.preserved.push(path);
            continue;
        }

        if ext == "js" && !manifests.contains(&path.with_extension("json")) {
            outcome.preserved.push(path);
            continue;
        }

        std::fs::remove_file(&path).map_err(|source| RelocateError::Delete {
            path: path.clone(),
            source,
        })?;
        outcome.removed_files += 1;
    }

    let now_empty = dir
        .read_dir()
        .map_err(|source| RelocateError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?
        .next()
        .is_none();

    if now_empty {
        std::fs::remove_dir(dir).map_err(|source| RelocateError::Delete {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    Ok(now_empty)
}
