//! Indexer: turns a set of candidate file paths into Graph Store writes.
//!
//! `index_all` scans the project (VCS fast path, filesystem fallback),
//! reads files in small parallel batches, and commits one transaction per
//! file. `index_files` restricts the same pipeline to an explicit path list
//! (used by the Sync Engine for incremental re-indexing).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use rayon::prelude::*;
use sha2::{Digest, Sha256};

use crate::diagnostics::{Diagnostic, DiagnosticStage, SkipReason};
use crate::extract::extract;
use crate::grammar::{detect_language, GrammarRegistry};
use crate::graph::filter::FileFilter;
use crate::graph::scan::scan_directory_with_filter;
use crate::graph::schema::FileRecord;
use crate::graph::store::GraphStore;
use crate::vcs;

/// Files are read in batches of at most this many, concurrently.
const BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Scanning,
    Parsing,
    Storing,
    Resolving,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Scanning => "scanning",
            Phase::Parsing => "parsing",
            Phase::Storing => "storing",
            Phase::Resolving => "resolving",
        }
    }
}

/// `progress(phase, current, total, current_file)`.
pub type ProgressFn<'a> = dyn FnMut(Phase, usize, usize, Option<&str>) + 'a;

/// A cooperative cancellation probe, checked between batches and between
/// files inside a batch. Wraps a SIGINT/SIGTERM-backed flag when installed
/// via `CancelToken::install`, or can be driven manually for tests.
#[derive(Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    /// Register SIGINT and SIGTERM to flip this token instead of killing
    /// the process outright, so an in-flight index run can finish its
    /// current transaction and return a partial, consistent result.
    pub fn install() -> Result<Self> {
        let token = Self::new();
        signal_hook::flag::register(signal_hook::consts::SIGINT, token.0.clone())?;
        signal_hook::flag::register(signal_hook::consts::SIGTERM, token.0.clone())?;
        Ok(token)
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
pub struct IndexResult {
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub nodes_added: usize,
    pub edges_added: usize,
    pub unresolved_added: usize,
    pub references_resolved: usize,
    pub diagnostics: Vec<Diagnostic>,
    pub cancelled: bool,
    pub duration: std::time::Duration,
}

struct ReadOutcome {
    path: PathBuf,
    content: Result<String, std::io::Error>,
}

/// Full index of every file under `root` that `filter` accepts.
pub fn index_all(store: &mut GraphStore, root: &Path, filter: &FileFilter, max_file_size: u64, mut progress: Box<ProgressFn<'_>>, cancel: &CancelToken) -> Result<IndexResult> {
    let start = Instant::now();
    progress(Phase::Scanning, 0, 0, None);

    let paths = candidate_paths(root, filter)?;
    let scan = scan_directory_with_filter(root, filter)?;

    let mut result = index_paths(store, root, &paths, max_file_size, &mut progress, cancel)?;
    result.diagnostics.extend(scan.diagnostics);
    result.duration = start.elapsed();
    Ok(result)
}

/// Index only `paths`, restricted to what `filter` accepts. Used by the
/// Sync Engine to re-index a known changed set without a full rescan.
pub fn index_files(store: &mut GraphStore, root: &Path, paths: &[PathBuf], max_file_size: u64, mut progress: Box<ProgressFn<'_>>, cancel: &CancelToken) -> Result<IndexResult> {
    let start = Instant::now();
    let mut result = index_paths(store, root, paths, max_file_size, &mut progress, cancel)?;
    result.duration = start.elapsed();
    Ok(result)
}

/// VCS fast path for candidate enumeration; falls back to the filesystem
/// walk when the project isn't under version control or VCS queries fail.
fn candidate_paths(root: &Path, filter: &FileFilter) -> Result<Vec<PathBuf>> {
    if vcs::is_vcs_project(root) {
        if let Ok(files) = vcs::vcs_tracked_files(root) {
            return Ok(files.into_iter().filter(|p| p.is_file() && filter.should_skip(p).is_none()).collect());
        }
    }
    Ok(scan_directory_with_filter(root, filter)?.files)
}

fn index_paths(store: &mut GraphStore, root: &Path, paths: &[PathBuf], max_file_size: u64, progress: &mut Box<ProgressFn<'_>>, cancel: &CancelToken) -> Result<IndexResult> {
    let mut result = IndexResult::default();
    let total = paths.len();
    let registry = GrammarRegistry::new();

    for (batch_index, batch) in paths.chunks(BATCH_SIZE).enumerate() {
        if cancel.is_cancelled() {
            result.cancelled = true;
            return Ok(result);
        }

        let reads: Vec<ReadOutcome> = batch.par_iter().map(|path| ReadOutcome { path: path.clone(), content: std::fs::read_to_string(path) }).collect();

        for (file_index, outcome) in reads.into_iter().enumerate() {
            if cancel.is_cancelled() {
                result.cancelled = true;
                return Ok(result);
            }

            let current = batch_index * BATCH_SIZE + file_index + 1;
            let rel = rel_path(root, &outcome.path);
            progress(Phase::Parsing, current, total, Some(&rel));

            let content = match outcome.content {
                Ok(c) => c,
                Err(err) => {
                    result.diagnostics.push(Diagnostic::error(rel.clone(), DiagnosticStage::Read, err.to_string()));
                    result.files_skipped += 1;
                    continue;
                }
            };

            if content.len() as u64 > max_file_size {
                result.diagnostics.push(Diagnostic::skipped(rel.clone(), SkipReason::TooLarge));
                result.files_skipped += 1;
                continue;
            }

            let Some(language) = detect_language(&outcome.path) else {
                result.diagnostics.push(Diagnostic::skipped(rel.clone(), SkipReason::UnsupportedLanguage));
                result.files_skipped += 1;
                continue;
            };

            let content_hash = hash_content(&content);

            if let Ok(Some(existing)) = store.get_file_by_path(&rel) {
                if existing.content_hash == content_hash {
                    continue;
                }
            }

            let extraction = extract(&rel, &content, &language, &registry);
            if !extraction.errors.is_empty() {
                for err in &extraction.errors {
                    result.diagnostics.push(Diagnostic::error(rel.clone(), DiagnosticStage::Parse, err.clone()));
                }
            }

            progress(Phase::Storing, current, total, Some(&rel));

            let node_count = extraction.nodes.len();
            let edge_count = extraction.edges.len();
            let unresolved_count = extraction.unresolved.len();

            let write = store.transaction(|s| {
                if s.get_file_by_path(&rel)?.is_some() {
                    s.delete_file(&rel)?;
                }
                s.insert_nodes(&extraction.nodes)?;
                s.insert_edges(&extraction.edges)?;
                s.insert_unresolved_refs(&extraction.unresolved)?;
                s.upsert_file(&FileRecord {
                    path: rel.clone(),
                    content_hash: content_hash.clone(),
                    language: language.as_str().to_string(),
                    size: content.len() as u64,
                    modified_at: chrono::Utc::now(),
                    indexed_at: chrono::Utc::now(),
                    node_count: node_count as u32,
                    errors: if extraction.errors.is_empty() { None } else { Some(extraction.errors.clone()) },
                })?;
                Ok(())
            });

            match write {
                Ok(()) => {
                    result.files_indexed += 1;
                    result.nodes_added += node_count;
                    result.edges_added += edge_count;
                    result.unresolved_added += unresolved_count;
                }
                Err(err) => {
                    result.diagnostics.push(Diagnostic::error(rel.clone(), DiagnosticStage::Store, err.to_string()));
                    result.files_skipped += 1;
                }
            }
        }
    }

    progress(Phase::Resolving, 0, 0, None);
    result.references_resolved = store.resolve_references().context("resolving references")?;
    result.diagnostics.sort();
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
    fn index_all_extracts_functions_from_a_fresh_project() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.rs"), "fn hello() {}\n").unwrap();
        let db_dir = TempDir::new().unwrap();
        let mut store = GraphStore::open(&db_dir.path().join("graph.db")).unwrap();
        let filter = FileFilter::new(dir.path(), &[], &[]).unwrap();
        let cancel = CancelToken::new();

        let result = index_all(&mut store, dir.path(), &filter, 10 * 1024 * 1024, no_progress(), &cancel).unwrap();
        assert_eq!(result.files_indexed, 1);
        assert!(result.nodes_added >= 1);
        assert!(!result.cancelled);
    }

    #[test]
    fn index_all_is_idempotent_on_unchanged_content() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.rs"), "fn hello() {}\n").unwrap();
        let db_dir = TempDir::new().unwrap();
        let mut store = GraphStore::open(&db_dir.path().join("graph.db")).unwrap();
        let filter = FileFilter::new(dir.path(), &[], &[]).unwrap();
        let cancel = CancelToken::new();

        index_all(&mut store, dir.path(), &filter, 10 * 1024 * 1024, no_progress(), &cancel).unwrap();
        let second = index_all(&mut store, dir.path(), &filter, 10 * 1024 * 1024, no_progress(), &cancel).unwrap();
        assert_eq!(second.nodes_added, 0);
        assert_eq!(second.edges_added, 0);
    }

    #[test]
    fn index_all_skips_oversized_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("big.rs"), "fn a() {}\n".repeat(100)).unwrap();
        let db_dir = TempDir::new().unwrap();
        let mut store = GraphStore::open(&db_dir.path().join("graph.db")).unwrap();
        let filter = FileFilter::new(dir.path(), &[], &[]).unwrap();
        let cancel = CancelToken::new();

        let result = index_all(&mut store, dir.path(), &filter, 16, no_progress(), &cancel).unwrap();
        assert_eq!(result.files_indexed, 0);
        assert!(result.diagnostics.iter().any(|d| matches!(d, Diagnostic::Skipped { reason: SkipReason::TooLarge, .. })));
    }

    #[test]
    fn cancellation_returns_partial_result() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn a() {}\n").unwrap();
        let db_dir = TempDir::new().unwrap();
        let mut store = GraphStore::open(&db_dir.path().join("graph.db")).unwrap();
        let filter = FileFilter::new(dir.path(), &[], &[]).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = index_all(&mut store, dir.path(), &filter, 10 * 1024 * 1024, no_progress(), &cancel).unwrap();
        assert!(result.cancelled);
        assert_eq!(result.files_indexed, 0);
    }

    #[test]
    fn index_files_restricts_to_given_paths() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn a() {}\n").unwrap();
        std::fs::write(dir.path().join("b.rs"), "fn b() {}\n").unwrap();
        let db_dir = TempDir::new().unwrap();
        let mut store = GraphStore::open(&db_dir.path().join("graph.db")).unwrap();
        let cancel = CancelToken::new();

        let result = index_files(&mut store, dir.path(), &[dir.path().join("a.rs")], 10 * 1024 * 1024, no_progress(), &cancel).unwrap();
        assert_eq!(result.files_indexed, 1);
        assert!(store.get_file_by_path("b.rs").unwrap().is_none());
    }
}
