//! `index` command: full indexing pass over a project.

use std::path::Path;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli_support::{load_filter, load_max_file_size, open_locked_store};
use codegraph::indexer::{self, CancelToken, Phase};
use codegraph::output::{generate_execution_id, output_json, IndexResponse, JsonResponse, OutputFormat};

pub fn run_index(root: &Path, db_path: &Path, output_format: OutputFormat) -> Result<()> {
    let (_lock, mut store) = open_locked_store(db_path)?;
    let filter = load_filter(root)?;
    let cancel = CancelToken::install()?;

    let bar = progress_bar(output_format);
    let progress = {
        let bar = bar.clone();
        Box::new(move |phase: Phase, current: usize, total: usize, file: Option<&str>| {
            if let Some(bar) = &bar {
                bar.set_length(total.max(1) as u64);
                bar.set_position(current as u64);
                bar.set_message(format!("{}{}", phase.as_str(), file.map(|f| format!(" {f}")).unwrap_or_default()));
            }
        })
    };

    let result = indexer::index_all(&mut store, root, &filter, load_max_file_size(root)?, progress, &cancel)?;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    match output_format {
        OutputFormat::Human => {
            println!("files indexed: {}", result.files_indexed);
            println!("files skipped: {}", result.files_skipped);
            println!("nodes added: {}", result.nodes_added);
            println!("edges added: {}", result.edges_added);
            println!("references resolved: {}", result.references_resolved);
            for diagnostic in &result.diagnostics {
                eprintln!("{diagnostic}");
            }
        }
        OutputFormat::Json | OutputFormat::Pretty => {
            let response: IndexResponse = (&result).into();
            let json_response = JsonResponse::new(response, &generate_execution_id());
            output_json(&json_response, output_format)?;
        }
    }

    if result.cancelled {
        return Err(anyhow::anyhow!("indexing cancelled; partial results committed"));
    }
    Ok(())
}

fn progress_bar(format: OutputFormat) -> Option<ProgressBar> {
    if format != OutputFormat::Human {
        return None;
    }
    let bar = ProgressBar::new(1);
    bar.set_style(ProgressStyle::with_template("{spinner} {pos}/{len} {msg}").unwrap());
    Some(bar)
}
