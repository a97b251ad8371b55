//! JSON output module for the CLI.
//!
//! Provides schema-versioned, execution-id-tagged response types for every
//! command.

pub mod command;

pub use command::{
    generate_execution_id, output_json, CodeBlock, ContextResponse, ErrorResponse, FilesResponse,
    FindPathsResponse, ImpactResponse, IndexResponse, JsonResponse, OutputFormat, QueryResponse,
    Span, StatusResponse, SyncResponse, TraverseResponse,
};
