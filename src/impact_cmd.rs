//! `impact` command: bounded inbound blast radius of a node.

use std::path::Path;

use anyhow::Result;

use codegraph::graph;
use codegraph::output::{generate_execution_id, output_json, ImpactResponse, JsonResponse, OutputFormat};
use codegraph::query::{self, TraverseOptions};

pub fn run_impact(db_path: &Path, id: &str, max_depth: usize, max_nodes: usize, output_format: OutputFormat) -> Result<()> {
    let store = graph::open_store(db_path)?;
    let options = TraverseOptions { max_depth, max_nodes, edge_kinds: None, node_kinds: None };
    let subgraph = query::get_impact_radius(&store, id, &options)?;

    match output_format {
        OutputFormat::Human => {
            println!("impact radius of {id}: {} node(s){}", subgraph.stats.node_count, if subgraph.stats.truncated { " (truncated)" } else { "" });
            for node in subgraph.nodes.values() {
                if node.id != id {
                    println!("{}\t{}\t{}", node.id, node.kind, node.qualified_name);
                }
            }
        }
        OutputFormat::Json | OutputFormat::Pretty => {
            let response = ImpactResponse { subject_id: id.to_string(), nodes: subgraph.nodes.into_values().collect(), edges: subgraph.edges, truncated: subgraph.stats.truncated };
            let json_response = JsonResponse::new(response, &generate_execution_id());
            output_json(&json_response, output_format)?;
        }
    }
    Ok(())
}
