//! File Scanner fallback: enumerate indexable files by walking the
//! filesystem. The VCS fast path lives in `crate::vcs`; the Indexer picks
//! one or falls back to this when VCS is unavailable or times out.

use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::diagnostics::{Diagnostic, DiagnosticStage};
use crate::graph::filter::{skip_diagnostic, FileFilter};
use crate::validation::{validate_path_within_root, PathValidationError};

/// Result of a filesystem walk: the sorted, filtered candidate paths plus
/// diagnostics for everything skipped along the way.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub files: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Walk `dir_path` depth-first, resolving symbolic links, validating every
/// candidate path resolves within `dir_path` and applying `filter`.
///
/// Directories are tracked by their canonicalized real path as they're
/// descended into; a directory whose real path was already visited (a
/// symlink cycle, or two links converging on the same target) is not
/// descended into again.
///
/// Guarantees: deterministic (files are returned sorted); no path outside
/// `dir_path` is ever returned; filtering never panics on unreadable paths.
pub fn scan_directory_with_filter(dir_path: &Path, filter: &FileFilter) -> Result<ScanResult> {
    let mut files: Vec<PathBuf> = Vec::new();
    let mut diagnostics = Vec::new();
    let mut visited_real_dirs: HashSet<PathBuf> = HashSet::new();

    let walker = walkdir::WalkDir::new(dir_path)
        .follow_links(true)
        .into_iter()
        .filter_entry(move |entry| {
            if !entry.file_type().is_dir() {
                return true;
            }
            match entry.path().canonicalize() {
                Ok(real) => visited_real_dirs.insert(real),
                Err(_) => true,
            }
        });

    for entry in walker.filter_map(std::result::Result::ok) {
        let path = entry.path();
        if path.is_dir() {
            continue;
        }

        match validate_path_within_root(path, dir_path) {
            Ok(_) => {}
            Err(PathValidationError::OutsideRoot(p, _)) => {
                let rel_path = Path::new(&p).strip_prefix(dir_path).unwrap_or_else(|_| Path::new(&p)).to_string_lossy().to_string();
                diagnostics.push(Diagnostic::skipped(rel_path, crate::diagnostics::SkipReason::IgnoredInternal));
                continue;
            }
            Err(PathValidationError::SymlinkEscape(from, to)) => {
                let rel_path = Path::new(&from).strip_prefix(dir_path).unwrap_or_else(|_| Path::new(&from)).to_string_lossy().to_string();
                diagnostics.push(Diagnostic::error(rel_path, DiagnosticStage::Read, format!("symlink escapes root: {}", to)));
                continue;
            }
            Err(PathValidationError::CannotCanonicalize(_)) => continue,
            Err(PathValidationError::SuspiciousTraversal(p)) => {
                diagnostics.push(Diagnostic::error(p, DiagnosticStage::Read, "suspicious traversal pattern".to_string()));
                continue;
            }
        }

        if let Some(reason) = filter.should_skip(path) {
            diagnostics.push(skip_diagnostic(dir_path, path, reason));
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    diagnostics.sort();
    Ok(ScanResult { files, diagnostics })
}

/// Convenience wrapper that builds a default (no include/exclude) filter.
pub fn scan_directory(dir_path: &Path) -> Result<ScanResult> {
    let filter = FileFilter::new(dir_path, &[], &[])?;
    scan_directory_with_filter(dir_path, &filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_filters_database_files() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("code.rs"), b"fn test() {}").unwrap();
        std::fs::write(temp_dir.path().join("data.db"), b"database data").unwrap();
        std::fs::write(temp_dir.path().join("test.db-journal"), b"journal").unwrap();

        let result = scan_directory(temp_dir.path()).unwrap();
        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].ends_with("code.rs"));
        assert!(result.diagnostics.iter().any(|d| d.path().contains("data.db")));
    }

    #[test]
    fn scan_respects_gitignore() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(".gitignore"), "ignored.rs").unwrap();
        std::fs::write(temp_dir.path().join("included.rs"), b"fn included() {}").unwrap();
        std::fs::write(temp_dir.path().join("ignored.rs"), b"fn ignored() {}").unwrap();

        let result = scan_directory(temp_dir.path()).unwrap();
        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].ends_with("included.rs"));
    }

    #[test]
    fn scan_respects_include_patterns() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("src")).unwrap();
        std::fs::create_dir_all(temp_dir.path().join("tests")).unwrap();
        std::fs::write(temp_dir.path().join("src/lib.rs"), b"fn lib() {}").unwrap();
        std::fs::write(temp_dir.path().join("tests/test.rs"), b"fn test() {}").unwrap();

        let filter = FileFilter::new(temp_dir.path(), &["src/**".to_string()], &[]).unwrap();
        let result = scan_directory_with_filter(temp_dir.path(), &filter).unwrap();
        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].ends_with("src/lib.rs"));
    }

    #[test]
    fn scan_respects_exclude_patterns() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("lib.rs"), b"fn lib() {}").unwrap();
        std::fs::write(temp_dir.path().join("test.rs"), b"fn test() {}").unwrap();

        let filter = FileFilter::new(temp_dir.path(), &[], &["**/*test*.rs".to_string()]).unwrap();
        let result = scan_directory_with_filter(temp_dir.path(), &filter).unwrap();
        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].ends_with("lib.rs"));
    }

    #[test]
    fn scan_rejects_symlink_escape() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let outside_dir = tempfile::TempDir::new().unwrap();
        let outside_file = outside_dir.path().join("outside.rs");
        std::fs::write(&outside_file, b"fn outside() {}").unwrap();
        let symlink = temp_dir.path().join("link.rs");

        #[cfg(unix)]
        std::os::unix::fs::symlink(&outside_file, &symlink).unwrap();
        #[cfg(windows)]
        std::os::windows::fs::symlink_file(&outside_file, &symlink).unwrap();

        let result = scan_directory(temp_dir.path()).unwrap();
        assert!(result.files.iter().all(|p| !p.starts_with(outside_dir.path())));
    }

    #[test]
    #[cfg(unix)]
    fn scan_follows_symlinked_directory_without_looping() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let target_dir = tempfile::TempDir::new().unwrap();
        std::fs::write(target_dir.path().join("linked.rs"), b"fn linked() {}").unwrap();
        std::os::unix::fs::symlink(target_dir.path(), temp_dir.path().join("link")).unwrap();

        let result = scan_directory(temp_dir.path()).unwrap();
        assert!(result.files.iter().any(|p| p.ends_with("linked.rs")));
    }

    #[test]
    #[cfg(unix)]
    fn scan_breaks_symlink_cycle() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("a")).unwrap();
        std::os::unix::fs::symlink(temp_dir.path(), temp_dir.path().join("a/back")).unwrap();

        // Would loop forever without cycle detection; completing and finding
        // no files (there's nothing but the symlink back to the root) is
        // the assertion.
        let result = scan_directory(temp_dir.path()).unwrap();
        assert!(result.files.is_empty());
    }

    #[test]
    fn scan_is_deterministically_sorted() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("c.rs"), b"").unwrap();
        std::fs::write(temp_dir.path().join("a.rs"), b"").unwrap();
        std::fs::write(temp_dir.path().join("b.rs"), b"").unwrap();

        let result = scan_directory(temp_dir.path()).unwrap();
        let names: Vec<_> = result.files.iter().map(|p| p.file_name().unwrap().to_string_lossy().to_string()).collect();
        assert_eq!(names, vec!["a.rs", "b.rs", "c.rs"]);
    }
}
