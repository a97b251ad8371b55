//! `find-paths` command: every path between two nodes, up to a bound.

use std::path::Path;

use anyhow::Result;

use codegraph::graph;
use codegraph::output::{generate_execution_id, output_json, FindPathsResponse, JsonResponse, OutputFormat};
use codegraph::query;

pub fn run_find_paths(db_path: &Path, from: &str, to: &str, max_depth: usize, max_paths: usize, output_format: OutputFormat) -> Result<()> {
    let store = graph::open_store(db_path)?;
    let paths = query::find_paths(&store, from, to, max_depth, max_paths)?;

    match output_format {
        OutputFormat::Human => {
            println!("{} path(s) from {from} to {to}:", paths.len());
            for path in &paths {
                println!("{}", path.join(" -> "));
            }
        }
        OutputFormat::Json | OutputFormat::Pretty => {
            let response = FindPathsResponse { from: from.to_string(), to: to.to_string(), paths };
            let json_response = JsonResponse::new(response, &generate_execution_id());
            output_json(&json_response, output_format)?;
        }
    }
    Ok(())
}
