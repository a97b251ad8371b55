//! CLI argument parsing for codegraph.
//!
//! Defines the Command enum and parse_args() function for all CLI commands.

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use codegraph::output::OutputFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Callers,
    Callees,
    Dependencies,
    Dependents,
}

impl Relation {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "callers" => Some(Relation::Callers),
            "callees" => Some(Relation::Callees),
            "dependencies" => Some(Relation::Dependencies),
            "dependents" => Some(Relation::Dependents),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Callers => "callers",
            Relation::Callees => "callees",
            Relation::Dependencies => "dependencies",
            Relation::Dependents => "dependents",
        }
    }
}

#[derive(Debug)]
pub enum Command {
    Init { root: PathBuf, output_format: OutputFormat },
    Index { root: PathBuf, db_path: PathBuf, output_format: OutputFormat },
    Sync { root: PathBuf, db_path: PathBuf, output_format: OutputFormat },
    Query { db_path: PathBuf, relation: Relation, id: String, output_format: OutputFormat },
    Impact { db_path: PathBuf, id: String, max_depth: usize, max_nodes: usize, output_format: OutputFormat },
    Traverse { db_path: PathBuf, ids: Vec<String>, max_depth: usize, max_nodes: usize, output_format: OutputFormat },
    FindPaths { db_path: PathBuf, from: String, to: String, max_depth: usize, max_paths: usize, output_format: OutputFormat },
    Context { db_path: PathBuf, query: String, output_format: OutputFormat },
    Status { db_path: PathBuf, output_format: OutputFormat },
    Serve { db_path: PathBuf },
}

pub fn print_short_usage() {
    eprintln!("codegraph - local-first code knowledge graph engine");
    eprintln!();
    eprintln!("Usage: codegraph <command> [arguments]");
    eprintln!();
    eprintln!("Run `codegraph --help-full` for the full command reference.");
}

pub fn print_full_usage() {
    eprintln!("codegraph - local-first code knowledge graph engine");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  codegraph init [--root <DIR>] [--output <FORMAT>]");
    eprintln!("  codegraph index [--root <DIR>] [--db <FILE>] [--output <FORMAT>]");
    eprintln!("  codegraph sync [--root <DIR>] [--db <FILE>] [--output <FORMAT>]");
    eprintln!("  codegraph query --db <FILE> --relation <callers|callees|dependencies|dependents> --id <ID> [--output <FORMAT>]");
    eprintln!("  codegraph impact --db <FILE> --id <ID> [--max-depth <N>] [--max-nodes <N>] [--output <FORMAT>]");
    eprintln!("  codegraph traverse --db <FILE> --ids <ID,ID,...> [--max-depth <N>] [--max-nodes <N>] [--output <FORMAT>]");
    eprintln!("  codegraph find-paths --db <FILE> --from <ID> --to <ID> [--max-depth <N>] [--max-paths <N>] [--output <FORMAT>]");
    eprintln!("  codegraph context --db <FILE> --query <TEXT> [--output <FORMAT>]");
    eprintln!("  codegraph status [--db <FILE>] [--output <FORMAT>]");
    eprintln!("  codegraph serve [--db <FILE>]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  init        Create the project's hidden data directory and config");
    eprintln!("  index       Index the project from scratch");
    eprintln!("  sync        Reconcile the graph with changes since the last index/sync");
    eprintln!("  query       List direct callers/callees/dependencies/dependents of a node");
    eprintln!("  impact      Compute the bounded blast radius of a node");
    eprintln!("  traverse    Bounded BFS subgraph from one or more starting nodes");
    eprintln!("  find-paths  List every path between two nodes, up to a bound");
    eprintln!("  context     Build a context document from a task description");
    eprintln!("  status      Show database statistics");
    eprintln!("  serve       Run the JSON-RPC 2.0 server over stdio");
    eprintln!();
    eprintln!("Output formats: human (default), json, pretty");
}

fn default_db_path(root: &std::path::Path) -> PathBuf {
    codegraph::config::ProjectLayout::new(root).db_path
}

pub fn parse_args() -> Result<Command> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        return Err(anyhow!("missing command"));
    }

    let command = args[1].as_str();
    let rest = &args[2..];
    let mut flags = Flags::parse(rest)?;

    let output_format = flags
        .take("--output")
        .map(|s| OutputFormat::from_str(&s).ok_or_else(|| anyhow!("invalid --output value: {s}")))
        .transpose()?
        .unwrap_or(OutputFormat::Human);

    match command {
        "init" => {
            let root = flags.take_path("--root").unwrap_or_else(|| PathBuf::from("."));
            Ok(Command::Init { root, output_format })
        }
        "index" => {
            let root = flags.take_path("--root").unwrap_or_else(|| PathBuf::from("."));
            let db_path = flags.take_path("--db").unwrap_or_else(|| default_db_path(&root));
            Ok(Command::Index { root, db_path, output_format })
        }
        "sync" => {
            let root = flags.take_path("--root").unwrap_or_else(|| PathBuf::from("."));
            let db_path = flags.take_path("--db").unwrap_or_else(|| default_db_path(&root));
            Ok(Command::Sync { root, db_path, output_format })
        }
        "query" => {
            let root = flags.take_path("--root").unwrap_or_else(|| PathBuf::from("."));
            let db_path = flags.take_path("--db").unwrap_or_else(|| default_db_path(&root));
            let relation_str = flags.take("--relation").ok_or_else(|| anyhow!("--relation is required"))?;
            let relation = Relation::from_str(&relation_str).ok_or_else(|| anyhow!("invalid --relation value: {relation_str}"))?;
            let id = flags.take("--id").ok_or_else(|| anyhow!("--id is required"))?;
            Ok(Command::Query { db_path, relation, id, output_format })
        }
        "impact" => {
            let root = flags.take_path("--root").unwrap_or_else(|| PathBuf::from("."));
            let db_path = flags.take_path("--db").unwrap_or_else(|| default_db_path(&root));
            let id = flags.take("--id").ok_or_else(|| anyhow!("--id is required"))?;
            let max_depth = flags.take("--max-depth").map(|s| s.parse()).transpose()?.unwrap_or(2);
            let max_nodes = flags.take("--max-nodes").map(|s| s.parse()).transpose()?.unwrap_or(50);
            Ok(Command::Impact { db_path, id, max_depth, max_nodes, output_format })
        }
        "traverse" => {
            let root = flags.take_path("--root").unwrap_or_else(|| PathBuf::from("."));
            let db_path = flags.take_path("--db").unwrap_or_else(|| default_db_path(&root));
            let ids_str = flags.take("--ids").ok_or_else(|| anyhow!("--ids is required"))?;
            let ids: Vec<String> = ids_str.split(',').map(str::to_string).collect();
            let max_depth = flags.take("--max-depth").map(|s| s.parse()).transpose()?.unwrap_or(2);
            let max_nodes = flags.take("--max-nodes").map(|s| s.parse()).transpose()?.unwrap_or(50);
            Ok(Command::Traverse { db_path, ids, max_depth, max_nodes, output_format })
        }
        "find-paths" => {
            let root = flags.take_path("--root").unwrap_or_else(|| PathBuf::from("."));
            let db_path = flags.take_path("--db").unwrap_or_else(|| default_db_path(&root));
            let from = flags.take("--from").ok_or_else(|| anyhow!("--from is required"))?;
            let to = flags.take("--to").ok_or_else(|| anyhow!("--to is required"))?;
            let max_depth = flags.take("--max-depth").map(|s| s.parse()).transpose()?.unwrap_or(2);
            let max_paths = flags.take("--max-paths").map(|s| s.parse()).transpose()?.unwrap_or(10);
            Ok(Command::FindPaths { db_path, from, to, max_depth, max_paths, output_format })
        }
        "context" => {
            let root = flags.take_path("--root").unwrap_or_else(|| PathBuf::from("."));
            let db_path = flags.take_path("--db").unwrap_or_else(|| default_db_path(&root));
            let query = flags.take("--query").ok_or_else(|| anyhow!("--query is required"))?;
            Ok(Command::Context { db_path, query, output_format })
        }
        "status" => {
            let root = flags.take_path("--root").unwrap_or_else(|| PathBuf::from("."));
            let db_path = flags.take_path("--db").unwrap_or_else(|| default_db_path(&root));
            Ok(Command::Status { db_path, output_format })
        }
        "serve" => {
            let root = flags.take_path("--root").unwrap_or_else(|| PathBuf::from("."));
            let db_path = flags.take_path("--db").unwrap_or_else(|| default_db_path(&root));
            Ok(Command::Serve { db_path })
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

/// Minimal `--flag value` / `--flag=value` parser; no positional arguments
/// in this command surface.
struct Flags {
    values: std::collections::HashMap<String, String>,
}

impl Flags {
    fn parse(args: &[String]) -> Result<Self> {
        let mut values = std::collections::HashMap::new();
        let mut i = 0;
        while i < args.len() {
            let arg = &args[i];
            if let Some((key, value)) = arg.split_once('=') {
                values.insert(key.to_string(), value.to_string());
                i += 1;
            } else if arg.starts_with("--") {
                let value = args.get(i + 1).ok_or_else(|| anyhow!("missing value for {arg}"))?;
                values.insert(arg.clone(), value.clone());
                i += 2;
            } else {
                return Err(anyhow!("unexpected argument: {arg}"));
            }
        }
        Ok(Flags { values })
    }

    fn take(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    fn take_path(&mut self, key: &str) -> Option<PathBuf> {
        self.take(key).map(PathBuf::from)
    }
}
