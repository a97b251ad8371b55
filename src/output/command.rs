//! JSON output types for the CLI: schema-versioned, execution-id-tagged
//! response envelopes around the Query Engine and Context Builder's own
//! types, plus span helpers used when emitting code blocks.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::graph::schema::{Edge, FileRecord, Node};
use crate::indexer::IndexResult;
use crate::sync::SyncResult;

/// Current JSON output schema version.
pub const CODEGRAPH_JSON_SCHEMA_VERSION: &str = "1.0.0";

/// Every JSON response carries a schema version and execution id for
/// parsing stability and traceability across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse<T> {
    pub schema_version: String,
    pub execution_id: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<bool>,
}

impl<T> JsonResponse<T> {
    pub fn new(data: T, execution_id: &str) -> Self {
        JsonResponse { schema_version: CODEGRAPH_JSON_SCHEMA_VERSION.to_string(), execution_id: execution_id.to_string(), data, partial: None }
    }

    pub fn with_partial(mut self, partial: bool) -> Self {
        self.partial = Some(partial);
        self
    }
}

/// A source range, used by the Context Builder to cite code blocks.
/// Exclusive range: `byte_end`/`end_line`/`end_col` point past the span.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    pub span_id: String,
    pub file_path: String,
    pub byte_start: usize,
    pub byte_end: usize,
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Span {
    /// SHA-256 of `file_path:byte_start:byte_end`, truncated to 64 bits.
    pub fn generate_id(file_path: &str, byte_start: usize, byte_end: usize) -> String {
        let mut hasher = Sha256::new();
        hasher.update(file_path.as_bytes());
        hasher.update(b":");
        hasher.update(byte_start.to_be_bytes());
        hasher.update(b":");
        hasher.update(byte_end.to_be_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..8])
    }

    pub fn new(file_path: String, byte_start: usize, byte_end: usize, start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        let span_id = Self::generate_id(&file_path, byte_start, byte_end);
        Span { span_id, file_path, byte_start, byte_end, start_line, start_col, end_line, end_col }
    }
}

/// Response for the `query` command: direct-neighbor results for
/// callers/callees/dependencies/dependents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub subject_id: String,
    pub relation: String,
    pub nodes: Vec<Node>,
}

/// Response for the `impact` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactResponse {
    pub subject_id: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub truncated: bool,
}

/// Response for the `query/traverse` operation: a bounded BFS subgraph
/// rooted at one or more starting nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraverseResponse {
    pub entry_points: Vec<String>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub truncated: bool,
}

/// Response for the `query/find_paths` operation: every path found between
/// two nodes, as ordered lists of node ids, up to the configured bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindPathsResponse {
    pub from: String,
    pub to: String,
    pub paths: Vec<Vec<String>>,
}

/// One cited code block in a context document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeBlock {
    pub node_id: String,
    pub span: Span,
    pub code: String,
    pub truncated: bool,
}

/// Response for the `context` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextResponse {
    pub query: String,
    pub entry_points: Vec<Node>,
    pub related: Vec<Node>,
    pub code_blocks: Vec<CodeBlock>,
}

/// Response for the `status` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub db_path: String,
    pub files: usize,
    pub nodes: usize,
    pub unresolved_references: usize,
}

/// Response for the `index` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexResponse {
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub nodes_added: usize,
    pub edges_added: usize,
    pub references_resolved: usize,
    pub cancelled: bool,
    pub duration_ms: u128,
}

impl From<&IndexResult> for IndexResponse {
    fn from(r: &IndexResult) -> Self {
        IndexResponse {
            files_indexed: r.files_indexed,
            files_skipped: r.files_skipped,
            nodes_added: r.nodes_added,
            edges_added: r.edges_added,
            references_resolved: r.references_resolved,
            cancelled: r.cancelled,
            duration_ms: r.duration.as_millis(),
        }
    }
}

/// Response for the `sync` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponse {
    pub files_checked: usize,
    pub files_added: usize,
    pub files_modified: usize,
    pub files_removed: usize,
    pub nodes_updated: usize,
    pub changed_paths: Vec<String>,
    pub duration_ms: u128,
}

impl From<&SyncResult> for SyncResponse {
    fn from(r: &SyncResult) -> Self {
        SyncResponse {
            files_checked: r.files_checked,
            files_added: r.files_added,
            files_modified: r.files_modified,
            files_removed: r.files_removed,
            nodes_updated: r.nodes_updated,
            changed_paths: r.changed_paths.clone(),
            duration_ms: r.duration.as_millis(),
        }
    }
}

/// Response for a plain file listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesResponse {
    pub files: Vec<FileRecord>,
}

/// Response for errors surfaced in JSON mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Human,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    Pretty,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Some(OutputFormat::Human),
            "json" => Some(OutputFormat::Json),
            "pretty" => Some(OutputFormat::Pretty),
            _ => None,
        }
    }
}

/// Timestamp + process id execution identifier, unique enough for
/// correlating a CLI run's stderr diagnostics with its JSON output.
pub fn generate_execution_id() -> String {
    use std::process;
    use std::time::{SystemTime, UNIX_EPOCH};

    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
    let pid = process::id();

    format!("{:x}-{:x}", timestamp, pid)
}

/// Serialize `data` per `format` and print it to stdout.
pub fn output_json<T: Serialize>(data: &T, format: OutputFormat) -> anyhow::Result<()> {
    let json = match format {
        OutputFormat::Pretty => serde_json::to_string_pretty(data)?,
        _ => serde_json::to_string(data)?,
    };
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_generate_id_is_deterministic() {
        let id1 = Span::generate_id("test.rs", 10, 20);
        let id2 = Span::generate_id("test.rs", 10, 20);
        let id3 = Span::generate_id("test.rs", 10, 21);
        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn span_generate_id_format() {
        let id = Span::generate_id("test.rs", 10, 20);
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn execution_id_format() {
        let id = generate_execution_id();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 2);
        assert!(usize::from_str_radix(parts[0], 16).is_ok());
        assert!(usize::from_str_radix(parts[1], 16).is_ok());
    }

    #[test]
    fn json_response_carries_schema_version() {
        let response = JsonResponse::new(FilesResponse { files: vec![] }, "test-exec-123");
        let json = serde_json::to_string(&response).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["schema_version"], CODEGRAPH_JSON_SCHEMA_VERSION);
        assert_eq!(parsed["execution_id"], "test-exec-123");
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("PRETTY"), Some(OutputFormat::Pretty));
        assert_eq!(OutputFormat::from_str("human"), Some(OutputFormat::Human));
        assert_eq!(OutputFormat::from_str("invalid"), None);
    }
}
