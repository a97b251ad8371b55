//! OS-level PID lock guarding single-writer access to the graph store.
//!
//! A lock file next to the database holds the writer's process id. A stale
//! lock (owning process no longer alive) is reclaimed automatically; a live
//! owner causes the new writer to fail with a message naming the lock file.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("write lock at {path} is held by process {pid}")]
    Held { path: PathBuf, pid: u32 },

    #[error("failed to access lock file {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
}

/// An acquired writer lock; the lock file is removed on drop.
pub struct WriteLock {
    path: PathBuf,
}

impl WriteLock {
    pub fn acquire(db_path: &Path) -> Result<Self, LockError> {
        let lock_path = lock_path_for(db_path);

        if let Ok(contents) = fs::read_to_string(&lock_path) {
            if let Ok(pid) = contents.trim().parse::<u32>() {
                if process_is_alive(pid) {
                    return Err(LockError::Held { path: lock_path, pid });
                }
            }
            // Stale lock: owning process is gone, reclaim it.
        }

        fs::write(&lock_path, std::process::id().to_string()).map_err(|source| LockError::Io { path: lock_path.clone(), source })?;

        Ok(WriteLock { path: lock_path })
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn lock_path_for(db_path: &Path) -> PathBuf {
    let mut name = db_path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".lock");
    db_path.with_file_name(name)
}

#[cfg(unix)]
fn process_is_alive(pid: u32) -> bool {
    // kill(pid, 0) checks existence/permission without sending a signal.
    unsafe { libc_kill(pid as i32, 0) == 0 }
}

#[cfg(unix)]
extern "C" {
    #[link_name = "kill"]
    fn libc_kill(pid: i32, sig: i32) -> i32;
}

#[cfg(not(unix))]
fn process_is_alive(_pid: u32) -> bool {
    // Conservative default off Unix: assume alive so a lock is never
    // silently stolen from a live writer.
    true
}
