//! JSON-RPC 2.0 server: exposes the Query Engine and Context Builder over
//! line-delimited JSON on stdio, for editor and assistant integrations that
//! want a long-lived process instead of shelling out per query.

use std::io::{self, BufRead, Write};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::{build_context, ContextOptions};
use crate::graph::store::GraphStore;
use crate::output::command::{ContextResponse, FindPathsResponse, ImpactResponse, QueryResponse, TraverseResponse};
use crate::query::{self, SearchOptions, TraverseOptions};

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Deserialize)]
struct RpcRequest {
    #[allow(dead_code)]
    jsonrpc: Option<String>,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct RpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl RpcResponse {
    fn ok(id: Value, result: Value) -> Self {
        RpcResponse { jsonrpc: "2.0", id, result: Some(result), error: None }
    }

    fn err(id: Value, code: i64, message: impl Into<String>) -> Self {
        RpcResponse { jsonrpc: "2.0", id, result: None, error: Some(RpcError { code, message: message.into() }) }
    }
}

/// Run the JSON-RPC server: read one request per line from `input`, write
/// one response per line to `output`, until `input` reaches EOF.
pub fn serve(store: &GraphStore, input: impl BufRead, mut output: impl Write) -> anyhow::Result<()> {
    for line in input.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = handle_line(store, trimmed);
        writeln!(output, "{}", serde_json::to_string(&response)?)?;
        output.flush()?;
    }
    Ok(())
}

fn handle_line(store: &GraphStore, line: &str) -> RpcResponse {
    let request: RpcRequest = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => return RpcResponse::err(Value::Null, PARSE_ERROR, format!("parse error: {e}")),
    };

    let id = request.id.clone().unwrap_or(Value::Null);

    if request.method.is_empty() {
        return RpcResponse::err(id, INVALID_REQUEST, "missing method");
    }

    match dispatch(store, &request.method, &request.params) {
        Ok(result) => RpcResponse::ok(id, result),
        Err(DispatchError::MethodNotFound) => RpcResponse::err(id, METHOD_NOT_FOUND, format!("unknown method: {}", request.method)),
        Err(DispatchError::InvalidParams(msg)) => RpcResponse::err(id, INVALID_PARAMS, msg),
        Err(DispatchError::Internal(msg)) => RpcResponse::err(id, INTERNAL_ERROR, msg),
    }
}

enum DispatchError {
    MethodNotFound,
    InvalidParams(String),
    Internal(String),
}

impl From<anyhow::Error> for DispatchError {
    fn from(e: anyhow::Error) -> Self {
        DispatchError::Internal(e.to_string())
    }
}

fn dispatch(store: &GraphStore, method: &str, params: &Value) -> Result<Value, DispatchError> {
    match method {
        "query/callers" => relation_query(store, params, "callers", query::get_callers),
        "query/callees" => relation_query(store, params, "callees", query::get_callees),
        "query/dependencies" => relation_query(store, params, "dependencies", query::get_dependencies),
        "query/dependents" => relation_query(store, params, "dependents", query::get_dependents),
        "query/search" => {
            let text = string_param(params, "text")?;
            let limit = usize_param(params, "limit").unwrap_or(20);
            let hits = query::search_nodes(store, &text, &SearchOptions { limit })?;
            Ok(serde_json::to_value(hits.into_iter().map(|h| h.node).collect::<Vec<_>>())?)
        }
        "impact" => {
            let id = string_param(params, "id")?;
            let max_depth = usize_param(params, "max_depth").unwrap_or(2);
            let max_nodes = usize_param(params, "max_nodes").unwrap_or(50);
            let options = TraverseOptions { max_depth, max_nodes, edge_kinds: None, node_kinds: None };
            let subgraph = query::get_impact_radius(store, &id, &options)?;
            let response = ImpactResponse { subject_id: id, nodes: subgraph.nodes.into_values().collect(), edges: subgraph.edges, truncated: subgraph.stats.truncated };
            Ok(serde_json::to_value(response)?)
        }
        "query/traverse" => {
            let ids = string_array_param(params, "ids")?;
            let max_depth = usize_param(params, "max_depth").unwrap_or(query::DEFAULT_MAX_DEPTH);
            let max_nodes = usize_param(params, "max_nodes").unwrap_or(query::DEFAULT_MAX_NODES);
            let options = TraverseOptions { max_depth, max_nodes, edge_kinds: None, node_kinds: None };
            let subgraph = query::traverse(store, &ids, &options)?;
            let response = TraverseResponse {
                entry_points: subgraph.entry_points,
                nodes: subgraph.nodes.into_values().collect(),
                edges: subgraph.edges,
                truncated: subgraph.stats.truncated,
            };
            Ok(serde_json::to_value(response)?)
        }
        "query/find_paths" => {
            let from = string_param(params, "from")?;
            let to = string_param(params, "to")?;
            let max_depth = usize_param(params, "max_depth").unwrap_or(query::DEFAULT_MAX_DEPTH);
            let max_paths = usize_param(params, "max_paths").unwrap_or(10);
            let paths = query::find_paths(store, &from, &to, max_depth, max_paths)?;
            let response = FindPathsResponse { from, to, paths };
            Ok(serde_json::to_value(response)?)
        }
        "context" => {
            let text = string_param(params, "query")?;
            let response: ContextResponse = build_context(store, &text, &ContextOptions::default())?;
            Ok(serde_json::to_value(response)?)
        }
        "status" => {
            let files = store.get_all_files()?.len();
            let nodes = store.count_nodes()?;
            let unresolved = store.all_unresolved_refs()?.len();
            Ok(serde_json::json!({ "db_path": store.db_path().to_string_lossy(), "files": files, "nodes": nodes, "unresolved_references": unresolved }))
        }
        _ => Err(DispatchError::MethodNotFound),
    }
}

fn relation_query(store: &GraphStore, params: &Value, relation: &str, f: impl Fn(&GraphStore, &str) -> anyhow::Result<Vec<crate::graph::schema::Node>>) -> Result<Value, DispatchError> {
    let id = string_param(params, "id")?;
    let nodes = f(store, &id)?;
    let response = QueryResponse { subject_id: id, relation: relation.to_string(), nodes };
    Ok(serde_json::to_value(response).map_err(|e| DispatchError::Internal(e.to_string()))?)
}

fn string_param(params: &Value, key: &str) -> Result<String, DispatchError> {
    params.get(key).and_then(Value::as_str).map(str::to_string).ok_or_else(|| DispatchError::InvalidParams(format!("missing or non-string `{key}`")))
}

fn string_array_param(params: &Value, key: &str) -> Result<Vec<String>, DispatchError> {
    params
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .ok_or_else(|| DispatchError::InvalidParams(format!("missing or non-array `{key}`")))
}

fn usize_param(params: &Value, key: &str) -> Option<usize> {
    params.get(key).and_then(Value::as_u64).map(|n| n as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::filter::FileFilter;
    use crate::indexer::{self, CancelToken, ProgressFn};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn no_progress() -> Box<ProgressFn<'static>> {
        Box::new(|_, _, _, _| {})
    }

    fn sample_store() -> (TempDir, TempDir, GraphStore) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn a() {}\nfn b() { a(); }\n").unwrap();
        let db_dir = TempDir::new().unwrap();
        let mut store = GraphStore::open(&db_dir.path().join("graph.db")).unwrap();
        let filter = FileFilter::new(dir.path(), &[], &[]).unwrap();
        let cancel = CancelToken::new();
        indexer::index_all(&mut store, dir.path(), &filter, 10 * 1024 * 1024, no_progress(), &cancel).unwrap();
        (dir, db_dir, store)
    }

    #[test]
    fn status_method_returns_counts() {
        let (_dir, _db_dir, store) = sample_store();
        let input = Cursor::new(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"status\",\"params\":{}}\n".to_vec());
        let mut output = Vec::new();
        serve(&store, input, &mut output).unwrap();
        let response: Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(response["result"]["files"], 1);
    }

    #[test]
    fn unknown_method_returns_method_not_found() {
        let (_dir, _db_dir, store) = sample_store();
        let input = Cursor::new(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"bogus\",\"params\":{}}\n".to_vec());
        let mut output = Vec::new();
        serve(&store, input, &mut output).unwrap();
        let response: Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);
    }

    #[test]
    fn malformed_json_returns_parse_error() {
        let (_dir, _db_dir, store) = sample_store();
        let input = Cursor::new(b"not json\n".to_vec());
        let mut output = Vec::new();
        serve(&store, input, &mut output).unwrap();
        let response: Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(response["error"]["code"], PARSE_ERROR);
    }

    #[test]
    fn query_traverse_returns_subgraph_for_given_ids() {
        let (_dir, _db_dir, store) = sample_store();
        let hits = query::search_nodes(&store, "a", &SearchOptions::default()).unwrap();
        let node_id = hits[0].node.id.clone();
        let input = Cursor::new(
            format!("{{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"query/traverse\",\"params\":{{\"ids\":[\"{node_id}\"]}}}}\n")
                .into_bytes(),
        );
        let mut output = Vec::new();
        serve(&store, input, &mut output).unwrap();
        let response: Value = serde_json::from_slice(&output).unwrap();
        assert!(response["result"]["nodes"].as_array().unwrap().iter().any(|n| n["id"] == node_id));
    }

    #[test]
    fn query_find_paths_missing_params_returns_invalid_params() {
        let (_dir, _db_dir, store) = sample_store();
        let input = Cursor::new(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"query/find_paths\",\"params\":{\"from\":\"x\"}}\n".to_vec());
        let mut output = Vec::new();
        serve(&store, input, &mut output).unwrap();
        let response: Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(response["error"]["code"], INVALID_PARAMS);
    }

    #[test]
    fn query_callers_missing_id_returns_invalid_params() {
        let (_dir, _db_dir, store) = sample_store();
        let input = Cursor::new(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"query/callers\",\"params\":{}}\n".to_vec());
        let mut output = Vec::new();
        serve(&store, input, &mut output).unwrap();
        let response: Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(response["error"]["code"], INVALID_PARAMS);
    }
}
