//! VCS fast path for change detection: asks git for tracked/untracked file
//! status instead of walking the filesystem. Falls back silently (the
//! caller decides) on timeout or any git2 error.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use git2::{Repository, StatusOptions};

const VCS_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Default, Clone)]
pub struct VcsStatus {
    pub added: Vec<PathBuf>,
    pub modified: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
}

/// True if `root` is (or is inside) a git working tree.
pub fn is_vcs_project(root: &Path) -> bool {
    Repository::discover(root).is_ok()
}

/// The union of tracked and untracked-but-not-ignored files, bucketed into
/// added/modified/deleted relative to HEAD. Bounded by `VCS_TIMEOUT`;
/// exceeding it is treated the same as any other VCS error by the caller.
pub fn vcs_status(root: &Path) -> Result<VcsStatus> {
    let start = Instant::now();
    let repo = Repository::discover(root).context("opening git repository")?;

    let mut opts = StatusOptions::new();
    opts.include_untracked(true).recurse_untracked_dirs(true).include_ignored(false);

    let statuses = repo.statuses(Some(&mut opts)).context("reading git status")?;

    let workdir = repo.workdir().unwrap_or(root).to_path_buf();
    let mut result = VcsStatus::default();

    for entry in statuses.iter() {
        if start.elapsed() > VCS_TIMEOUT {
            anyhow::bail!("git status scan exceeded timeout");
        }
        let Some(rel) = entry.path() else { continue };
        let abs = workdir.join(rel);
        let status = entry.status();

        if status.is_wt_deleted() || status.is_index_deleted() {
            result.deleted.push(abs);
        } else if status.is_wt_new() || status.is_index_new() {
            result.added.push(abs);
        } else if status.is_wt_modified() || status.is_index_modified() || status.is_wt_renamed() || status.is_index_renamed() {
            result.modified.push(abs);
        }
    }

    Ok(result)
}

/// All tracked + untracked-but-not-ignored files as absolute paths. Used as
/// the File Scanner's VCS fast path for a full `index_all`.
pub fn vcs_tracked_files(root: &Path) -> Result<Vec<PathBuf>> {
    let start = Instant::now();
    let repo = Repository::discover(root).context("opening git repository")?;
    let workdir = repo.workdir().unwrap_or(root).to_path_buf();

    let mut opts = StatusOptions::new();
    opts.include_untracked(true).recurse_untracked_dirs(true).include_ignored(false);
    let statuses = repo.statuses(Some(&mut opts)).context("reading git status")?;

    let mut files = Vec::new();
    for entry in statuses.iter() {
        if start.elapsed() > VCS_TIMEOUT {
            anyhow::bail!("git status scan exceeded timeout");
        }
        if entry.status().is_wt_deleted() || entry.status().is_index_deleted() {
            continue;
        }
        if let Some(rel) = entry.path() {
            files.push(workdir.join(rel));
        }
    }

    // HEAD tree entries not touched since the last commit won't show up in
    // status at all; walk the index for the full tracked set.
    let index = repo.index().context("reading git index")?;
    for entry in index.iter() {
        let path = String::from_utf8_lossy(&entry.path).to_string();
        files.push(workdir.join(path));
    }

    files.sort();
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_repo_directory_is_not_a_vcs_project() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(!is_vcs_project(dir.path()));
    }

    #[test]
    fn repo_directory_is_detected() {
        let dir = tempfile::TempDir::new().unwrap();
        Repository::init(dir.path()).unwrap();
        assert!(is_vcs_project(dir.path()));
    }

    #[test]
    fn vcs_tracked_files_includes_untracked() {
        let dir = tempfile::TempDir::new().unwrap();
        Repository::init(dir.path()).unwrap();
        std::fs::write(dir.path().join("new.rs"), b"fn x() {}").unwrap();

        let files = vcs_tracked_files(dir.path()).unwrap();
        assert!(files.iter().any(|p| p.ends_with("new.rs")));
    }
}
