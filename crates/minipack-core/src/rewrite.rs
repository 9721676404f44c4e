//! Path Rewriter
//!
//! Rewrites relative path literals inside script and manifest files after
//! relocation, in two independent passes:
//!
//! - **Pass A** (subpackage files): quoted literals that reach the shared
//!   components root are re-pointed at the subpackage's local shared-copy
//!   area.
//! - **Pass B** (local-copy files): quoted `../` literals inside copied
//!   components are re-resolved from the copy's new, deeper location so
//!   they still reach resources that stayed in the main package.
//!
//! Both transforms are deliberately string-level, not AST-based, isolated
//! behind pure functions over file text. A file with no matching literal
//! is never written, and re-running a pass over an already-rewritten file
//! is a no-op.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use regex::{Captures, Regex};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::bundle::{BundleLayout, Subpackage, SHARED_COMPONENTS_DIR};
use crate::paths;
use crate::report::RunReport;

/// File extensions the rewriter touches (script and manifest files).
pub const REWRITE_EXTS: [&str; 2] = ["js", "json"];

/// Errors while reading or writing files during a rewrite pass.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// Failed to read a file
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a rewritten file
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, RewriteError>;

/// Replace `old_prefix` with `new_prefix` in every quoted path literal of
/// `text` whose value starts with `old_prefix` followed by a `/`.
///
/// The remainder of the literal (component name plus sub-path) is kept
/// unchanged. Returns `None` when nothing matched, so callers can skip
/// the write entirely.
pub fn rewrite_prefix(text: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    let pattern = format!(
        r#"(["']){}(/[^"'\n]*)(["'])"#,
        regex::escape(old_prefix)
    );
    let re = Regex::new(&pattern).expect("escaped prefix pattern is valid");

    let mut changed = false;
    let out = re.replace_all(text, |caps: &Captures| {
        changed = true;
        format!("{}{}{}{}", &caps[1], new_prefix, &caps[2], &caps[3])
    });

    changed.then(|| out.into_owned())
}

/// Apply `retarget` to every quoted pure relative-parent path literal
/// (one or more `../` segments followed by a path tail) in `text`.
///
/// `retarget` returns the replacement literal, or `None` to leave the
/// literal untouched. Returns `None` when no literal actually changed.
pub fn rewrite_parent_literals<F>(text: &str, mut retarget: F) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    let re = Regex::new(r#"(["'])((?:\.\./)+[^"'\n]+)(["'])"#)
        .expect("parent literal pattern is valid");

    let mut changed = false;
    let out = re.replace_all(text, |caps: &Captures| match retarget(&caps[2]) {
        Some(new_literal) if new_literal != caps[2] => {
            changed = true;
            format!("{}{}{}", &caps[1], new_literal, &caps[3])
        }
        _ => caps[0].to_string(),
    });

    changed.then(|| out.into_owned())
}

/// Drives both rewrite passes over one subpackage.
pub struct Rewriter<'a> {
    layout: &'a BundleLayout,
    local_copy_dir: &'a str,
}

impl<'a> Rewriter<'a> {
    pub fn new(layout: &'a BundleLayout, local_copy_dir: &'a str) -> Self {
        Self {
            layout,
            local_copy_dir,
        }
    }

    /// Pass A: re-point shared-component references in subpackage files at
    /// the local shared-copy area.
    ///
    /// Files inside the local copy area itself are excluded; those are
    /// Pass B's concern. Returns the number of files rewritten.
    pub fn rewrite_subpackage(&self, sub: &Subpackage, report: &mut RunReport) -> Result<usize> {
        let copy_root = sub.root.join(self.local_copy_dir);
        let local_copy_dir = self.local_copy_dir;
        let mut rewritten = 0;

        let walker = WalkDir::new(&sub.root).into_iter().filter_entry(|e| {
            !(e.file_type().is_dir() && e.file_name().to_string_lossy() == local_copy_dir)
        });

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            report.counters.files_inspected += 1;

            let path = entry.path();
            if !has_rewrite_ext(path) {
                continue;
            }
            let Some(parent) = path.parent() else {
                continue;
            };

            // From this file's directory up to the shared components root,
            // and over to the local copy area.
            let old_prefix = format!(
                "{}/{}",
                paths::relative(parent, &self.layout.root),
                SHARED_COMPONENTS_DIR
            );
            let mut new_prefix = paths::relative(parent, &copy_root);
            if !new_prefix.starts_with("..") {
                new_prefix = format!("./{new_prefix}");
            }

            if self.rewrite_file(path, report, |text| {
                rewrite_prefix(text, &old_prefix, &new_prefix)
            })? {
                rewritten += 1;
            }
        }

        Ok(rewritten)
    }

    /// Pass B: re-resolve `../` literals inside this subpackage's local
    /// copies against each file's original shared-root location.
    ///
    /// A literal is left alone when it already resolves to an existing
    /// file from the copy's own location, when its target is inside a
    /// component that was itself duplicated into this subpackage (the
    /// sibling copy will resolve correctly), or when it does not resolve
    /// inside the bundle at all. The first rule is what keeps any correct
    /// pass output stable on a second run: a rewritten literal resolves
    /// from its new directory and is never re-resolved against the old
    /// one. Returns the number of files rewritten.
    pub fn rewrite_local_copies(
        &self,
        sub: &Subpackage,
        copied: &BTreeSet<PathBuf>,
        report: &mut RunReport,
    ) -> Result<usize> {
        let copy_root = sub.root.join(self.local_copy_dir);
        if !copy_root.is_dir() {
            return Ok(0);
        }

        let copied_names: BTreeSet<String> = copied
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .collect();

        let mut rewritten = 0;
        for entry in WalkDir::new(&copy_root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            report.counters.files_inspected += 1;

            let path = entry.path();
            if !has_rewrite_ext(path) {
                continue;
            }
            let Some(parent) = path.parent() else {
                continue;
            };
            let Ok(below_copy) = parent.strip_prefix(&copy_root) else {
                continue;
            };

            // Where this file lived before duplication.
            let old_dir = self.layout.components_dir.join(below_copy);

            if self.rewrite_file(path, report, |text| {
                rewrite_parent_literals(text, |literal| {
                    self.retarget_literal(literal, &old_dir, parent, &copied_names)
                })
            })? {
                rewritten += 1;
            }
        }

        Ok(rewritten)
    }

    /// Decide the replacement for one `../` literal found in a copied file.
    fn retarget_literal(
        &self,
        literal: &str,
        old_dir: &Path,
        new_dir: &Path,
        copied_names: &BTreeSet<String>,
    ) -> Option<String> {
        // A literal that already reaches an existing file from the copy's
        // location needs no retargeting. Rewritten literals always do, so
        // a second pass never touches them again.
        if resolves_to_file(&paths::normalize(&new_dir.join(literal))) {
            return None;
        }

        let target = paths::normalize(&old_dir.join(literal));

        // A literal that does not resolve inside the bundle was either
        // already rewritten or broken to begin with; leave it alone.
        if !target.starts_with(&self.layout.root) {
            return None;
        }

        // Targets inside a component duplicated into this same subpackage
        // resolve to the sibling local copy as-is.
        if let Ok(below) = target.strip_prefix(&self.layout.components_dir) {
            if let Some(Component::Normal(first)) = below.components().next() {
                if copied_names.contains(&*first.to_string_lossy()) {
                    return None;
                }
            }
        }

        Some(paths::relative(new_dir, &target))
    }

    /// Apply a text transform to one file, writing only when it changed.
    fn rewrite_file<F>(&self, path: &Path, report: &mut RunReport, transform: F) -> Result<bool>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let content = std::fs::read_to_string(path).map_err(|source| RewriteError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let Some(replaced) = transform(&content) else {
            return Ok(false);
        };

        std::fs::write(path, replaced).map_err(|source| RewriteError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("rewrote path literals in {}", path.display());
        report.counters.rewrites += 1;
        Ok(true)
    }
}

/// Whether a resolved literal points at an existing file. Module and
/// component specifiers usually omit the extension, so the script and
/// manifest extensions are implied.
fn resolves_to_file(path: &Path) -> bool {
    path.is_file()
        || path.with_extension("js").is_file()
        || path.with_extension("json").is_file()
}

fn has_rewrite_ext(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| REWRITE_EXTS.contains(&ext.as_str()))
}
