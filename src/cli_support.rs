//! Shared setup used by more than one command module: acquiring the write
//! lock and loading the project's include/exclude filter from its config.

use std::path::Path;

use anyhow::{Context, Result};

use codegraph::config::{Config, ProjectLayout};
use codegraph::graph::filter::FileFilter;
use codegraph::graph::store::GraphStore;
use codegraph::graph::{self};
use codegraph::lock::WriteLock;

/// Acquire the write lock and open the store, in that order, so a lock
/// held by a live process is reported before the database is touched.
pub fn open_locked_store(db_path: &Path) -> Result<(WriteLock, GraphStore)> {
    let lock = WriteLock::acquire(db_path).context("another process holds the write lock")?;
    let store = graph::open_store(db_path)?;
    Ok((lock, store))
}

/// Load `include`/`exclude` from the project's config, falling back to
/// defaults when the project hasn't been `init`-ed.
pub fn load_filter(root: &Path) -> Result<FileFilter> {
    let layout = ProjectLayout::new(root);
    let config = if layout.config_path.exists() { Config::load(&layout.config_path)? } else { Config::default() };
    FileFilter::new(root, &config.include, &config.exclude)
}

/// Load the project's configured `max_file_size`, falling back to the
/// default when the project hasn't been `init`-ed.
pub fn load_max_file_size(root: &Path) -> Result<u64> {
    let layout = ProjectLayout::new(root);
    let config = if layout.config_path.exists() { Config::load(&layout.config_path)? } else { Config::default() };
    Ok(config.max_file_size)
}
