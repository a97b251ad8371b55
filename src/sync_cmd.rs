//! `sync` command: incremental reconciliation of the Graph Store against
//! changes on disk since the last index/sync.

use std::path::Path;

use anyhow::Result;

use crate::cli_support::{load_filter, load_max_file_size, open_locked_store};
use codegraph::indexer::CancelToken;
use codegraph::output::{generate_execution_id, output_json, JsonResponse, OutputFormat, SyncResponse};
use codegraph::sync;

pub fn run_sync(root: &Path, db_path: &Path, output_format: OutputFormat) -> Result<()> {
    let (_lock, mut store) = open_locked_store(db_path)?;
    let filter = load_filter(root)?;
    let cancel = CancelToken::install()?;

    let result = sync::sync(&mut store, root, &filter, load_max_file_size(root)?, Box::new(|_, _, _, _| {}), &cancel)?;

    match output_format {
        OutputFormat::Human => {
            println!("files checked: {}", result.files_checked);
            println!("files added: {}", result.files_added);
            println!("files modified: {}", result.files_modified);
            println!("files removed: {}", result.files_removed);
            println!("nodes updated: {}", result.nodes_updated);
            for path in &result.changed_paths {
                println!("  {path}");
            }
        }
        OutputFormat::Json | OutputFormat::Pretty => {
            let response: SyncResponse = (&result).into();
            let json_response = JsonResponse::new(response, &generate_execution_id());
            output_json(&json_response, output_format)?;
        }
    }
    Ok(())
}
