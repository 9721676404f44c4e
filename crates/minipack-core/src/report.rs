//! Run Reporting
//!
//! A [`RunReport`] is threaded through every phase of an optimization
//! pass. It accumulates counters and log messages so the pass can write a
//! complete plain-text log file on completion, and flush it immediately
//! when a fatal error aborts the run. Messages are mirrored to `tracing`,
//! so console verbosity stays a subscriber concern.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

/// Counters accumulated over one optimization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Component directories found under the shared components root
    pub components_scanned: usize,
    /// Manifest files successfully parsed (application manifest included)
    pub manifests_parsed: usize,
    /// Files inspected by the path rewriter
    pub files_inspected: usize,
    /// Files rewritten (written back) by the path rewriter
    pub rewrites: usize,
    /// Components pruned from the shared components root
    pub components_pruned: usize,
    /// Component copies placed into subpackages
    pub components_copied: usize,
}

/// Accumulated log buffer and counters for one optimization pass.
#[derive(Debug, Default)]
pub struct RunReport {
    messages: Vec<String>,
    /// Counters, updated in place by each phase
    pub counters: Counters,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an informational message.
    pub fn info(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        info!("{msg}");
        self.messages.push(msg);
    }

    /// Record a warning (recoverable problem; the pass continues).
    pub fn warn(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        warn!("{msg}");
        self.messages.push(format!("[WARN] {msg}"));
    }

    /// Record an error. The pass may still abort afterwards; recording
    /// first keeps the diagnostic context in the log buffer.
    pub fn error(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        error!("{msg}");
        self.messages.push(format!("[ERROR] {msg}"));
    }

    /// Number of messages recorded so far.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// All messages recorded so far, in order.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Append the final optimization summary block and return a copy of
    /// its lines for console echo.
    pub fn push_summary(&mut self, components_before: usize, components_after: usize) -> Vec<String> {
        let c = self.counters;
        let lines = vec![
            "Optimization pass complete".to_string(),
            format!(
                "  components in shared root: {components_before} before -> {components_after} after"
            ),
            format!(
                "  components removed from main package: {} (pruned {})",
                components_before.saturating_sub(components_after),
                c.components_pruned
            ),
            format!("  component copies placed into subpackages: {}", c.components_copied),
            format!("  manifests parsed: {}", c.manifests_parsed),
            format!("  files inspected: {}", c.files_inspected),
            format!("  path rewrites written: {}", c.rewrites),
        ];
        self.messages.extend(lines.iter().cloned());
        lines
    }

    /// Write the accumulated log buffer to `path`.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.messages.join("\n"))
    }
}

/// Derive the default log file path from the output root: two levels up,
/// next to the project that produced the build.
pub fn default_log_file(output_root: &Path) -> PathBuf {
    crate::paths::normalize(&output_root.join("../../minipack.log"))
}
