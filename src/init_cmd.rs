//! `init` command: create a project's hidden data directory, its config
//! file, and an empty Graph Store database.

use std::path::Path;

use anyhow::{Context, Result};

use codegraph::config::{Config, ProjectLayout};
use codegraph::graph;
use codegraph::output::{generate_execution_id, output_json, JsonResponse, OutputFormat, StatusResponse};

pub fn run_init(root: &Path, output_format: OutputFormat) -> Result<()> {
    let layout = ProjectLayout::new(root);
    std::fs::create_dir_all(&layout.data_dir).with_context(|| format!("creating {}", layout.data_dir.display()))?;

    if !layout.config_path.exists() {
        Config::default().save(&layout.config_path)?;
    }

    let ignore_path = layout.data_dir.join(".gitignore");
    if !ignore_path.exists() {
        std::fs::write(&ignore_path, "*\n")?;
    }

    let store = graph::open_store(&layout.db_path)?;
    let response = StatusResponse { db_path: layout.db_path.to_string_lossy().to_string(), files: store.get_all_files()?.len(), nodes: store.count_nodes()?, unresolved_references: store.all_unresolved_refs()?.len() };

    match output_format {
        OutputFormat::Human => {
            println!("initialized {}", layout.data_dir.display());
        }
        OutputFormat::Json | OutputFormat::Pretty => {
            let json_response = JsonResponse::new(response, &generate_execution_id());
            output_json(&json_response, output_format)?;
        }
    }
    Ok(())
}
