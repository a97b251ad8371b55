//! `traverse` command: bounded BFS subgraph from one or more starting nodes.

use std::path::Path;

use anyhow::Result;

use codegraph::graph;
use codegraph::output::{generate_execution_id, output_json, JsonResponse, OutputFormat, TraverseResponse};
use codegraph::query::{self, TraverseOptions};

pub fn run_traverse(db_path: &Path, ids: &[String], max_depth: usize, max_nodes: usize, output_format: OutputFormat) -> Result<()> {
    let store = graph::open_store(db_path)?;
    let options = TraverseOptions { max_depth, max_nodes, edge_kinds: None, node_kinds: None };
    let subgraph = query::traverse(&store, ids, &options)?;

    match output_format {
        OutputFormat::Human => {
            println!("traversal from {}: {} node(s){}", ids.join(", "), subgraph.stats.node_count, if subgraph.stats.truncated { " (truncated)" } else { "" });
            for node in subgraph.nodes.values() {
                println!("{}\t{}\t{}", node.id, node.kind, node.qualified_name);
            }
        }
        OutputFormat::Json | OutputFormat::Pretty => {
            let response = TraverseResponse {
                entry_points: subgraph.entry_points,
                nodes: subgraph.nodes.into_values().collect(),
                edges: subgraph.edges,
                truncated: subgraph.stats.truncated,
            };
            let json_response = JsonResponse::new(response, &generate_execution_id());
            output_json(&json_response, output_format)?;
        }
    }
    Ok(())
}
