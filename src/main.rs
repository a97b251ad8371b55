//! codegraph CLI - local-first code knowledge graph engine
//!
//! Usage: codegraph <command> [arguments]

mod cli;
mod cli_support;
mod context_cmd;
mod find_paths_cmd;
mod impact_cmd;
mod index_cmd;
mod init_cmd;
mod query_cmd;
mod serve_cmd;
mod status_cmd;
mod sync_cmd;
mod traverse_cmd;

use std::process::ExitCode;

use cli::Command;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() >= 2 {
        match args[1].as_str() {
            "--help" | "-h" => {
                cli::print_short_usage();
                return ExitCode::SUCCESS;
            }
            "--help-full" | "-H" => {
                cli::print_full_usage();
                return ExitCode::SUCCESS;
            }
            "--version" | "-V" => {
                println!("{}", codegraph::version::version());
                return ExitCode::SUCCESS;
            }
            _ => {}
        }
    }

    if args.len() < 2 {
        cli::print_short_usage();
        return ExitCode::from(1);
    }

    let command = match cli::parse_args() {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {e}");
            cli::print_short_usage();
            return ExitCode::from(1);
        }
    };

    let result = match command {
        Command::Init { root, output_format } => init_cmd::run_init(&root, output_format),
        Command::Index { root, db_path, output_format } => index_cmd::run_index(&root, &db_path, output_format),
        Command::Sync { root, db_path, output_format } => sync_cmd::run_sync(&root, &db_path, output_format),
        Command::Query { db_path, relation, id, output_format } => query_cmd::run_query(&db_path, relation, &id, output_format),
        Command::Impact { db_path, id, max_depth, max_nodes, output_format } => impact_cmd::run_impact(&db_path, &id, max_depth, max_nodes, output_format),
        Command::Traverse { db_path, ids, max_depth, max_nodes, output_format } => traverse_cmd::run_traverse(&db_path, &ids, max_depth, max_nodes, output_format),
        Command::FindPaths { db_path, from, to, max_depth, max_paths, output_format } => find_paths_cmd::run_find_paths(&db_path, &from, &to, max_depth, max_paths, output_format),
        Command::Context { db_path, query, output_format } => context_cmd::run_context(&db_path, &query, output_format),
        Command::Status { db_path, output_format } => status_cmd::run_status(&db_path, output_format),
        Command::Serve { db_path } => serve_cmd::run_serve(&db_path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}
