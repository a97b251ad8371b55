//! Sync Engine: reconciles the Graph Store with the current state of the
//! project on disk, preferring the VCS status fast path over a full rescan.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::graph::filter::FileFilter;
use crate::graph::scan::scan_directory_with_filter;
use crate::graph::store::GraphStore;
use crate::indexer::{self, CancelToken, Phase, ProgressFn};
use crate::vcs;

#[derive(Debug, Default)]
pub struct SyncResult {
    pub files_checked: usize,
    pub files_added: usize,
    pub files_modified: usize,
    pub files_removed: usize,
    pub nodes_updated: usize,
    pub duration: std::time::Duration,
    pub changed_paths: Vec<String>,
}

/// Reconcile `store` against `root`. Uses the VCS status fast path when the
/// project is under version control and the query succeeds; otherwise falls
/// back to a full filesystem rescan compared against stored file records.
pub fn sync(store: &mut GraphStore, root: &Path, filter: &FileFilter, max_file_size: u64, progress: Box<ProgressFn<'_>>, cancel: &CancelToken) -> Result<SyncResult> {
    let start = Instant::now();

    let mut result = if vcs::is_vcs_project(root) {
        match vcs::vcs_status(root) {
            Ok(status) => sync_via_vcs(store, root, filter, max_file_size, status, progress, cancel)?,
            Err(_) => sync_via_full_scan(store, root, filter, max_file_size, progress, cancel)?,
        }
    } else {
        sync_via_full_scan(store, root, filter, max_file_size, progress, cancel)?
    };

    result.duration = start.elapsed();
    Ok(result)
}

fn sync_via_vcs(store: &mut GraphStore, root: &Path, filter: &FileFilter, max_file_size: u64, status: vcs::VcsStatus, mut progress: Box<ProgressFn<'_>>, cancel: &CancelToken) -> Result<SyncResult> {
    let mut result = SyncResult::default();

    let accepted_added: Vec<PathBuf> = status.added.into_iter().filter(|p| p.is_file() && filter.should_skip(p).is_none()).collect();
    let accepted_modified: Vec<PathBuf> = status.modified.into_iter().filter(|p| p.is_file() && filter.should_skip(p).is_none()).collect();

    result.files_checked = accepted_added.len() + accepted_modified.len() + status.deleted.len();

    for deleted in &status.deleted {
        let rel = rel_path(root, deleted);
        if store.get_file_by_path(&rel)?.is_some() {
            store.delete_file(&rel)?;
            result.files_removed += 1;
            result.changed_paths.push(rel);
        }
    }

    let to_reindex: Vec<PathBuf> = accepted_added.iter().chain(accepted_modified.iter()).cloned().collect();
    if !to_reindex.is_empty() {
        let index_result = indexer::index_files(store, root, &to_reindex, max_file_size, Box::new(move |phase, cur, total, file| progress(phase, cur, total, file)), cancel)?;
        result.nodes_updated += index_result.nodes_added;
        result.changed_paths.extend(to_reindex.iter().map(|p| rel_path(root, p)));
    }

    result.files_added = accepted_added.len();
    result.files_modified = accepted_modified.len();
    Ok(result)
}

fn sync_via_full_scan(store: &mut GraphStore, root: &Path, filter: &FileFilter, max_file_size: u64, mut progress: Box<ProgressFn<'_>>, cancel: &CancelToken) -> Result<SyncResult> {
    progress(Phase::Scanning, 0, 0, None);
    let scan = scan_directory_with_filter(root, filter)?;
    let on_disk: HashSet<String> = scan.files.iter().map(|p| rel_path(root, p)).collect();

    let stored = store.get_all_files()?;
    let mut result = SyncResult::default();
    result.files_checked = on_disk.len().max(stored.len());

    for record in &stored {
        if !on_disk.contains(&record.path) {
            store.delete_file(&record.path)?;
            result.files_removed += 1;
            result.changed_paths.push(record.path.clone());
        }
    }

    let stored_hashes: std::collections::HashMap<String, String> = stored.into_iter().map(|r| (r.path, r.content_hash)).collect();
    let mut to_index: Vec<PathBuf> = Vec::new();

    for path in &scan.files {
        let rel = rel_path(root, path);
        match stored_hashes.get(&rel) {
            None => {
                to_index.push(path.clone());
                result.files_added += 1;
                result.changed_paths.push(rel);
            }
            Some(existing_hash) => {
                let Ok(content) = std::fs::read_to_string(path) else { continue };
                if &hash_content(&content) != existing_hash {
                    to_index.push(path.clone());
                    result.files_modified += 1;
                    result.changed_paths.push(rel);
                }
            }
        }
    }

    if !to_index.is_empty() {
        let index_result = indexer::index_files(store, root, &to_index, max_file_size, Box::new(move |phase, cur, total, file| progress(phase, cur, total, file)), cancel)?;
        result.nodes_updated += index_result.nodes_added;
    }

    Ok(result)
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

fn rel_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_progress() -> Box<ProgressFn<'static>> {
        Box::new(|_, _, _, _| {})
    }

    #[test]
    fn sync_on_untouched_project_reports_no_changes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn a() {}\n").unwrap();
        let db_dir = TempDir::new().unwrap();
        let mut store = GraphStore::open(&db_dir.path().join("graph.db")).unwrap();
        let filter = FileFilter::new(dir.path(), &[], &[]).unwrap();
        let cancel = CancelToken::new();

        indexer::index_all(&mut store, dir.path(), &filter, 10 * 1024 * 1024, no_progress(), &cancel).unwrap();
        let result = sync(&mut store, dir.path(), &filter, 10 * 1024 * 1024, no_progress(), &cancel).unwrap();
        assert_eq!(result.files_added, 0);
        assert_eq!(result.files_modified, 0);
        assert_eq!(result.files_removed, 0);
    }

    #[test]
    fn sync_detects_added_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn a() {}\n").unwrap();
        let db_dir = TempDir::new().unwrap();
        let mut store = GraphStore::open(&db_dir.path().join("graph.db")).unwrap();
        let filter = FileFilter::new(dir.path(), &[], &[]).unwrap();
        let cancel = CancelToken::new();

        indexer::index_all(&mut store, dir.path(), &filter, 10 * 1024 * 1024, no_progress(), &cancel).unwrap();
        std::fs::write(dir.path().join("b.rs"), "fn new_func() {}\n").unwrap();

        let result = sync(&mut store, dir.path(), &filter, 10 * 1024 * 1024, no_progress(), &cancel).unwrap();
        assert_eq!(result.files_added, 1);
        assert!(store.get_nodes_by_name("new_func").unwrap().len() >= 1);
    }

    #[test]
    fn sync_detects_modified_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn hello() { }\n").unwrap();
        let db_dir = TempDir::new().unwrap();
        let mut store = GraphStore::open(&db_dir.path().join("graph.db")).unwrap();
        let filter = FileFilter::new(dir.path(), &[], &[]).unwrap();
        let cancel = CancelToken::new();

        indexer::index_all(&mut store, dir.path(), &filter, 10 * 1024 * 1024, no_progress(), &cancel).unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn goodbye() { }\n").unwrap();

        let result = sync(&mut store, dir.path(), &filter, 10 * 1024 * 1024, no_progress(), &cancel).unwrap();
        assert_eq!(result.files_modified, 1);
        assert!(store.get_nodes_by_name("hello").unwrap().is_empty());
        assert!(!store.get_nodes_by_name("goodbye").unwrap().is_empty());
    }

    #[test]
    fn sync_detects_removed_file() {
        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("a.rs");
        std::fs::write(&file_path, "fn hello() {}\n").unwrap();
        let db_dir = TempDir::new().unwrap();
        let mut store = GraphStore::open(&db_dir.path().join("graph.db")).unwrap();
        let filter = FileFilter::new(dir.path(), &[], &[]).unwrap();
        let cancel = CancelToken::new();

        indexer::index_all(&mut store, dir.path(), &filter, 10 * 1024 * 1024, no_progress(), &cancel).unwrap();
        std::fs::remove_file(&file_path).unwrap();

        let result = sync(&mut store, dir.path(), &filter, 10 * 1024 * 1024, no_progress(), &cancel).unwrap();
        assert_eq!(result.files_removed, 1);
        assert!(store.get_nodes_by_name("hello").unwrap().is_empty());
    }
}
