//! Graph module: schema, the persistent store, database compatibility
//! preflight, file filtering, and filesystem scanning.

pub mod db_compat;
pub mod filter;
pub mod scan;
pub mod schema;
pub mod store;

pub use schema::{Edge, EdgeKind, FileRecord, Node, NodeKind, UnresolvedReference, Visibility, CODEGRAPH_SCHEMA_VERSION};
pub use store::GraphStore;

use std::path::Path;

use anyhow::{Context, Result};

/// Open a graph store at `db_path`, running the read-only compatibility
/// preflight first so an incompatible existing file is refused with a
/// stable error rather than a raw engine error surfacing mid-write.
pub fn open_store(db_path: &Path) -> Result<GraphStore> {
    db_compat::preflight_sqlitegraph_compat(db_path).context("database compatibility preflight failed")?;
    GraphStore::open(db_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_store_creates_new_database() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = open_store(&dir.path().join("graph.db"));
        assert!(store.is_ok());
    }
}
