//! `query` command: direct-neighbor lookups (callers/callees/dependencies/
//! dependents) for a node.

use std::path::Path;

use anyhow::Result;

use crate::cli::Relation;
use codegraph::graph;
use codegraph::output::{generate_execution_id, output_json, JsonResponse, OutputFormat, QueryResponse};
use codegraph::query;

pub fn run_query(db_path: &Path, relation: Relation, id: &str, output_format: OutputFormat) -> Result<()> {
    let store = graph::open_store(db_path)?;

    let nodes = match relation {
        Relation::Callers => query::get_callers(&store, id)?,
        Relation::Callees => query::get_callees(&store, id)?,
        Relation::Dependencies => query::get_dependencies(&store, id)?,
        Relation::Dependents => query::get_dependents(&store, id)?,
    };

    match output_format {
        OutputFormat::Human => {
            if nodes.is_empty() {
                println!("no {} found for {id}", relation.as_str());
            }
            for node in &nodes {
                println!("{}\t{}\t{}", node.id, node.kind, node.qualified_name);
            }
        }
        OutputFormat::Json | OutputFormat::Pretty => {
            let response = QueryResponse { subject_id: id.to_string(), relation: relation.as_str().to_string(), nodes };
            let json_response = JsonResponse::new(response, &generate_execution_id());
            output_json(&json_response, output_format)?;
        }
    }
    Ok(())
}
