//! End-to-end seed scenarios: a fresh project is indexed, then mutated, then
//! queried through the full Indexer -> Sync Engine -> Query Engine -> Context
//! Builder pipeline.

use codegraph::graph::filter::FileFilter;
use codegraph::graph::store::GraphStore;
use codegraph::indexer::{self, CancelToken, ProgressFn};
use codegraph::{context, query, sync};
use tempfile::TempDir;

fn no_progress() -> Box<ProgressFn<'static>> {
    Box::new(|_, _, _, _| {})
}

fn fresh_project() -> (TempDir, TempDir, GraphStore) {
    let dir = TempDir::new().unwrap();
    let db_dir = TempDir::new().unwrap();
    let store = GraphStore::open(&db_dir.path().join("graph.db")).unwrap();
    (dir, db_dir, store)
}

fn filter_for(dir: &TempDir) -> FileFilter {
    FileFilter::new(dir.path(), &[], &[]).unwrap()
}

#[test]
fn seed_1_add_reports_new_file_and_makes_it_searchable() {
    let (dir, _db_dir, mut store) = fresh_project();
    std::fs::write(dir.path().join("hello.rs"), "fn hello() {}\n").unwrap();
    let filter = filter_for(&dir);
    let cancel = CancelToken::new();
    indexer::index_all(&mut store, dir.path(), &filter, 2 * 1024 * 1024, no_progress(), &cancel).unwrap();

    std::fs::write(dir.path().join("new.rs"), "fn new_func() {}\n").unwrap();
    let result = sync::sync(&mut store, dir.path(), &filter, 2 * 1024 * 1024, no_progress(), &cancel).unwrap();

    assert_eq!(result.files_added, 1);
    assert!(result.changed_paths.contains(&"new.rs".to_string()));
    let hits = query::search_nodes(&store, "new_func", &query::SearchOptions { limit: 10 }).unwrap();
    assert!(!hits.is_empty());
}

#[test]
fn seed_2_modify_drops_old_name_and_adds_new_one() {
    let (dir, _db_dir, mut store) = fresh_project();
    let path = dir.path().join("greet.rs");
    std::fs::write(&path, "fn hello() { }\n").unwrap();
    let filter = filter_for(&dir);
    let cancel = CancelToken::new();
    indexer::index_all(&mut store, dir.path(), &filter, 2 * 1024 * 1024, no_progress(), &cancel).unwrap();

    std::fs::write(&path, "fn goodbye() { }\n").unwrap();
    let result = sync::sync(&mut store, dir.path(), &filter, 2 * 1024 * 1024, no_progress(), &cancel).unwrap();

    assert_eq!(result.files_modified, 1);
    assert!(query::search_nodes(&store, "hello", &query::SearchOptions { limit: 10 }).unwrap().is_empty());
    assert!(!query::search_nodes(&store, "goodbye", &query::SearchOptions { limit: 10 }).unwrap().is_empty());
}

#[test]
fn seed_3_delete_removes_the_file_and_its_nodes() {
    let (dir, _db_dir, mut store) = fresh_project();
    let path = dir.path().join("greet.rs");
    std::fs::write(&path, "fn hello() {}\n").unwrap();
    let filter = filter_for(&dir);
    let cancel = CancelToken::new();
    indexer::index_all(&mut store, dir.path(), &filter, 2 * 1024 * 1024, no_progress(), &cancel).unwrap();

    std::fs::remove_file(&path).unwrap();
    let result = sync::sync(&mut store, dir.path(), &filter, 2 * 1024 * 1024, no_progress(), &cancel).unwrap();

    assert_eq!(result.files_removed, 1);
    assert!(query::search_nodes(&store, "hello", &query::SearchOptions { limit: 10 }).unwrap().is_empty());
}

const AUTH_PROJECT: &str = r#"
fn generate_token() {}
fn auth_register() { generate_token(); }
fn auth_login() { db_find_user_by_email(); verify_password(); generate_token(); }
fn payment_process_payment() { generate_token(); }
fn payment_refund_payment() { generate_token(); }
fn order_pay_order() { payment_process_payment(); }
fn order_cancel_order() {}
fn db_find_user_by_email() {}
fn verify_password() {}
"#;

fn auth_project() -> (TempDir, TempDir, GraphStore) {
    let (dir, db_dir, mut store) = fresh_project();
    std::fs::write(dir.path().join("auth.rs"), AUTH_PROJECT).unwrap();
    let filter = filter_for(&dir);
    let cancel = CancelToken::new();
    indexer::index_all(&mut store, dir.path(), &filter, 2 * 1024 * 1024, no_progress(), &cancel).unwrap();
    (dir, db_dir, store)
}

fn node_id_for(store: &GraphStore, name: &str) -> String {
    store.get_nodes_by_name(name).unwrap().into_iter().next().unwrap().id
}

#[test]
fn seed_4_callers_returns_exactly_the_four_invokers() {
    let (_dir, _db_dir, store) = auth_project();
    let generate_token = node_id_for(&store, "generate_token");

    let callers = query::get_callers(&store, &generate_token).unwrap();
    let names: Vec<&str> = callers.iter().map(|n| n.name.as_str()).collect();

    assert_eq!(callers.len(), 4);
    for expected in ["auth_register", "auth_login", "payment_process_payment", "payment_refund_payment"] {
        assert!(names.contains(&expected), "missing caller {expected}");
    }
}

#[test]
fn seed_5_callees_returns_exactly_the_three_invoked() {
    let (_dir, _db_dir, store) = auth_project();
    let auth_login = node_id_for(&store, "auth_login");

    let callees = query::get_callees(&store, &auth_login).unwrap();
    let names: Vec<&str> = callees.iter().map(|n| n.name.as_str()).collect();

    assert_eq!(callees.len(), 3);
    for expected in ["db_find_user_by_email", "verify_password", "generate_token"] {
        assert!(names.contains(&expected), "missing callee {expected}");
    }
}

#[test]
fn seed_6_impact_radius_reaches_two_hops_of_callers() {
    let (_dir, _db_dir, store) = auth_project();
    let generate_token = node_id_for(&store, "generate_token");

    let options = query::TraverseOptions { max_depth: 2, max_nodes: 50, edge_kinds: None, node_kinds: None };
    let subgraph = query::get_impact_radius(&store, &generate_token, &options).unwrap();
    let names: Vec<&str> = subgraph.nodes.values().map(|n| n.name.as_str()).collect();

    for expected in ["auth_register", "auth_login", "payment_process_payment", "payment_refund_payment", "order_pay_order"] {
        assert!(names.contains(&expected), "impact radius missing {expected}");
    }
}

#[test]
fn seed_7_context_includes_related_entities_and_excludes_unrelated_ones() {
    let (_dir, _db_dir, store) = auth_project();

    let response = context::build_context(&store, "fix login bug", &context::ContextOptions::default()).unwrap();
    let all_names: Vec<&str> = response.entry_points.iter().chain(response.related.iter()).map(|n| n.name.as_str()).collect();

    assert!(all_names.contains(&"auth_login"));
    assert!(all_names.contains(&"verify_password"));
    assert!(!all_names.contains(&"order_cancel_order"));
}
