//! Context Builder: turns a natural-language task description into a
//! bounded, relevant slice of the graph plus cited source code.

use std::collections::BTreeMap;

use anyhow::Result;

use crate::graph::schema::{EdgeKind, Node};
use crate::graph::store::GraphStore;
use crate::output::command::{CodeBlock, ContextResponse};
use crate::output::command::Span;
use crate::query::{search_nodes, traverse, SearchOptions, TraverseOptions};

#[derive(Debug, Clone)]
pub struct ContextOptions {
    pub search_limit: usize,
    pub traversal_depth: usize,
    pub max_nodes: usize,
    pub max_code_blocks: usize,
    pub max_code_block_size: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        ContextOptions { search_limit: 5, traversal_depth: 2, max_nodes: 50, max_code_blocks: 5, max_code_block_size: 2000 }
    }
}

const SIGNIFICANT_EDGE_KINDS: [EdgeKind; 5] = [EdgeKind::Calls, EdgeKind::Extends, EdgeKind::Implements, EdgeKind::Imports, EdgeKind::References];

/// Build a context document for `query`: lexical search picks entry points,
/// bounded traversal over significant edges pulls in related symbols, and a
/// handful of entry points get their source cited as code blocks.
pub fn build_context(store: &GraphStore, query: &str, options: &ContextOptions) -> Result<ContextResponse> {
    let hits = search_nodes(store, query, &SearchOptions { limit: options.search_limit })?;
    let entry_points: Vec<Node> = hits.into_iter().map(|h| h.node).collect();

    if entry_points.is_empty() {
        return Ok(ContextResponse { query: query.to_string(), entry_points: Vec::new(), related: Vec::new(), code_blocks: Vec::new() });
    }

    let traverse_options = TraverseOptions { max_depth: options.traversal_depth, max_nodes: options.max_nodes, edge_kinds: Some(SIGNIFICANT_EDGE_KINDS.to_vec()), node_kinds: None };

    let starts: Vec<String> = entry_points.iter().map(|n| n.id.clone()).collect();
    let subgraph = traverse(store, &starts, &traverse_options)?;

    let entry_ids: std::collections::HashSet<&str> = entry_points.iter().map(|n| n.id.as_str()).collect();
    let mut related: BTreeMap<String, Node> = subgraph.nodes;
    for id in &entry_ids {
        related.remove(*id);
    }

    let mut code_blocks = Vec::new();
    for node in entry_points.iter().take(options.max_code_blocks) {
        if let Some(block) = load_code_block(node, options.max_code_block_size) {
            code_blocks.push(block);
        }
    }

    Ok(ContextResponse { query: query.to_string(), entry_points, related: related.into_values().collect(), code_blocks })
}

fn load_code_block(node: &Node, max_size: usize) -> Option<CodeBlock> {
    let content = std::fs::read_to_string(&node.file_path).ok()?;
    let lines: Vec<&str> = content.lines().collect();
    let start = node.start_line.saturating_sub(1) as usize;
    let end = (node.end_line as usize).min(lines.len());
    if start >= end {
        return None;
    }

    let mut code = lines[start..end].join("\n");
    let truncated = code.chars().count() > max_size;
    if truncated {
        code = code.chars().take(max_size).collect::<String>();
        code.push_str("\n… (truncated)");
    }

    let byte_start = lines[..start].iter().map(|l| l.len() + 1).sum();
    let byte_end = byte_start + lines[start..end].iter().map(|l| l.len() + 1).sum::<usize>();

    Some(CodeBlock {
        node_id: node.id.clone(),
        span: Span::new(node.file_path.clone(), byte_start, byte_end, node.start_line as usize, node.start_column as usize, node.end_line as usize, node.end_column as usize),
        code,
        truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::filter::FileFilter;
    use crate::indexer::{self, CancelToken, ProgressFn};
    use tempfile::TempDir;

    fn no_progress() -> Box<ProgressFn<'static>> {
        Box::new(|_, _, _, _| {})
    }

    #[test]
    fn build_context_finds_entry_points_and_related_nodes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("auth.rs"), "fn verify_password() {}\nfn login() { verify_password(); }\n").unwrap();
        let db_dir = TempDir::new().unwrap();
        let mut store = GraphStore::open(&db_dir.path().join("graph.db")).unwrap();
        let filter = FileFilter::new(dir.path(), &[], &[]).unwrap();
        let cancel = CancelToken::new();
        indexer::index_all(&mut store, dir.path(), &filter, 10 * 1024 * 1024, no_progress(), &cancel).unwrap();

        let context = build_context(&store, "login", &ContextOptions::default()).unwrap();
        assert!(context.entry_points.iter().any(|n| n.name == "login"));
        assert!(context.related.iter().any(|n| n.name == "verify_password"));
        assert!(!context.code_blocks.is_empty());
    }

    #[test]
    fn build_context_on_no_match_returns_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn unrelated() {}\n").unwrap();
        let db_dir = TempDir::new().unwrap();
        let mut store = GraphStore::open(&db_dir.path().join("graph.db")).unwrap();
        let filter = FileFilter::new(dir.path(), &[], &[]).unwrap();
        let cancel = CancelToken::new();
        indexer::index_all(&mut store, dir.path(), &filter, 10 * 1024 * 1024, no_progress(), &cancel).unwrap();

        let context = build_context(&store, "zzz_no_such_term", &ContextOptions::default()).unwrap();
        assert!(context.entry_points.is_empty());
    }
}
