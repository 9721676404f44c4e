//! Lexical path helpers.
//!
//! Manifest references and rewritten literals are plain relative-path
//! strings, so all resolution here is lexical: `..` and `.` segments are
//! collapsed without touching the file system, and relative paths are
//! rendered with forward slashes to match the literals found in bundle
//! files.

use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` segments without consulting the file system.
///
/// A `..` at the root of an absolute path is dropped (`/..` resolves to
/// `/`), matching how the mini-app runtime resolves references.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Compute the relative path from `from` (a directory) to `to`, rendered
/// with forward slashes.
///
/// Returns `"."` when the two paths are equal. Both inputs are normalized
/// first, so either side may contain `..` segments.
pub fn relative(from: &Path, to: &Path) -> String {
    let from = normalize(from);
    let to = normalize(to);

    let from_parts: Vec<_> = from.components().collect();
    let to_parts: Vec<_> = to.components().collect();

    let common = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..from_parts.len() {
        parts.push("..".to_string());
    }
    for comp in &to_parts[common..] {
        parts.push(comp.as_os_str().to_string_lossy().to_string());
    }

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}
