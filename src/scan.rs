//! Candidate file scanning.
//!
//! Thin input layer for the selection engine: walks a root directory with
//! gitignore-aware filtering and emits candidate records from file metadata
//! only. Content is never read here; per-candidate sizing is byte-based.

use std::path::Path;

use ignore::WalkBuilder;
use thiserror::Error;
use tracing::debug;

use crate::select::CandidateFile;

/// Errors that can occur while scanning for candidates.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Directory walk failure (permission, broken symlink, bad ignore file).
    #[error("scan failed: {0}")]
    Walk(#[from] ignore::Error),
}

/// Scan `root` for candidate files, honoring `.gitignore` and skipping
/// hidden entries. Results are path-sorted so repeated scans of an
/// unchanged tree are identical.
pub fn scan_candidates(root: &Path) -> Result<Vec<CandidateFile>, ScanError> {
    let mut candidates = Vec::new();

    // Apply .gitignore rules even when the root is not a git checkout.
    for entry in WalkBuilder::new(root).require_git(false).build() {
        let entry = entry?;
        if !entry.file_type().map_or(false, |t| t.is_file()) {
            continue;
        }
        let metadata = entry.metadata()?;
        let extension = entry
            .path()
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        candidates.push(CandidateFile::new(
            entry.path().to_path_buf(),
            metadata.len(),
            extension,
        ));
    }

    candidates.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(root = %root.display(), count = candidates.len(), "scanned candidates");
    Ok(candidates)
}
