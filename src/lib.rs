//! codegraph: a local-first code knowledge graph engine.
//!
//! Parses multi-language source with tree-sitter, extracts entities and
//! relationships into a persistent graph store, and keeps that graph in
//! sync with the project on disk. The Query Engine and Context Builder on
//! top answer the questions an AI coding assistant actually asks: who
//! calls this, what does this depend on, what breaks if I change this,
//! what's the relevant code for this task.

pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error_codes;
pub mod extract;
pub mod grammar;
pub mod graph;
pub mod indexer;
pub mod lock;
pub mod output;
pub mod query;
pub mod rpc;
pub mod sync;
pub mod validation;
pub mod vcs;
pub mod version;

pub use config::{ChunkStrategy, Config, ProjectLayout};
pub use context::{build_context, ContextOptions};
pub use diagnostics::{Diagnostic, DiagnosticStage, SkipReason};
pub use graph::{open_store, Edge, EdgeKind, FileRecord, GraphStore, Node, NodeKind, UnresolvedReference, Visibility, CODEGRAPH_SCHEMA_VERSION};
pub use indexer::{index_all, index_files, CancelToken, IndexResult, Phase};
pub use lock::{LockError, WriteLock};
pub use query::{get_callees, get_callers, get_dependencies, get_dependents, get_impact_radius, search_nodes, traverse, SearchHit, SearchOptions, Subgraph, TraverseOptions};
pub use sync::{sync, SyncResult};
