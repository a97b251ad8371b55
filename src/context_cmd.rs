//! `context` command: build a context document from a task description.

use std::path::Path;

use anyhow::Result;

use codegraph::context::{build_context, ContextOptions};
use codegraph::graph;
use codegraph::output::{generate_execution_id, output_json, JsonResponse, OutputFormat};

pub fn run_context(db_path: &Path, query: &str, output_format: OutputFormat) -> Result<()> {
    let store = graph::open_store(db_path)?;
    let response = build_context(&store, query, &ContextOptions::default())?;

    match output_format {
        OutputFormat::Human => {
            println!("entry points:");
            for node in &response.entry_points {
                println!("  {}\t{}", node.id, node.qualified_name);
            }
            println!("related:");
            for node in &response.related {
                println!("  {}\t{}", node.id, node.qualified_name);
            }
            for block in &response.code_blocks {
                println!("\n--- {} ({}) ---", block.node_id, block.span.file_path);
                println!("{}", block.code);
            }
        }
        OutputFormat::Json | OutputFormat::Pretty => {
            let json_response = JsonResponse::new(response, &generate_execution_id());
            output_json(&json_response, output_format)?;
        }
    }
    Ok(())
}
