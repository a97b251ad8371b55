//! `status` command: database statistics.

use std::path::Path;

use anyhow::Result;

use codegraph::graph;
use codegraph::output::{generate_execution_id, output_json, JsonResponse, OutputFormat, StatusResponse};

pub fn run_status(db_path: &Path, output_format: OutputFormat) -> Result<()> {
    let store = graph::open_store(db_path)?;
    let response = StatusResponse {
        db_path: db_path.to_string_lossy().to_string(),
        files: store.get_all_files()?.len(),
        nodes: store.count_nodes()?,
        unresolved_references: store.all_unresolved_refs()?.len(),
    };

    match output_format {
        OutputFormat::Human => {
            println!("db: {}", response.db_path);
            println!("files: {}", response.files);
            println!("nodes: {}", response.nodes);
            println!("unresolved references: {}", response.unresolved_references);
        }
        OutputFormat::Json | OutputFormat::Pretty => {
            let json_response = JsonResponse::new(response, &generate_execution_id());
            output_json(&json_response, output_format)?;
        }
    }
    Ok(())
}
