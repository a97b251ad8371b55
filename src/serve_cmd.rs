//! `serve` command: run the JSON-RPC 2.0 server over stdio.

use std::io::{stdin, stdout};
use std::path::Path;

use anyhow::Result;

use codegraph::graph;
use codegraph::rpc;

pub fn run_serve(db_path: &Path) -> Result<()> {
    let store = graph::open_store(db_path)?;
    let stdin = stdin();
    let stdout = stdout();
    rpc::serve(&store, stdin.lock(), stdout.lock())
}
