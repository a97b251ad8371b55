//! Query Engine: bounded breadth-first traversal and lexical search over a
//! Graph Store. Every traversal respects `max_depth`/`max_nodes`; search
//! ranks by kind bonus, path relevance, and textual match.

use std::collections::{BTreeMap, HashSet, VecDeque};

use anyhow::Result;

use crate::graph::schema::{Edge, EdgeKind, Node, NodeKind};
use crate::graph::store::GraphStore;

pub const DEFAULT_MAX_DEPTH: usize = 2;
pub const DEFAULT_MAX_NODES: usize = 50;

#[derive(Debug, Clone)]
pub struct TraverseOptions {
    pub max_depth: usize,
    pub max_nodes: usize,
    pub edge_kinds: Option<Vec<EdgeKind>>,
    pub node_kinds: Option<Vec<NodeKind>>,
}

impl Default for TraverseOptions {
    fn default() -> Self {
        TraverseOptions { max_depth: DEFAULT_MAX_DEPTH, max_nodes: DEFAULT_MAX_NODES, edge_kinds: None, node_kinds: None }
    }
}

#[derive(Debug, Default)]
pub struct SubgraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub truncated: bool,
}

#[derive(Debug, Default)]
pub struct Subgraph {
    pub nodes: BTreeMap<String, Node>,
    pub edges: Vec<Edge>,
    pub entry_points: Vec<String>,
    pub stats: SubgraphStats,
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions { limit: 20 }
    }
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub node: Node,
    pub score: u32,
}

const DEPENDENCY_KINDS: [EdgeKind; 5] = [EdgeKind::Imports, EdgeKind::Calls, EdgeKind::Extends, EdgeKind::Implements, EdgeKind::References];

/// Nodes with an outbound `calls` edge into `id`.
pub fn get_callers(store: &GraphStore, id: &str) -> Result<Vec<Node>> {
    neighbor_nodes(store, id, &[EdgeKind::Calls], Direction::Incoming)
}

/// Nodes `id` has an outbound `calls` edge into.
pub fn get_callees(store: &GraphStore, id: &str) -> Result<Vec<Node>> {
    neighbor_nodes(store, id, &[EdgeKind::Calls], Direction::Outgoing)
}

/// Direct neighbors of `id` on any dependency-like edge kind, outbound.
pub fn get_dependencies(store: &GraphStore, id: &str) -> Result<Vec<Node>> {
    neighbor_nodes(store, id, &DEPENDENCY_KINDS, Direction::Outgoing)
}

/// Direct neighbors of `id` on any dependency-like edge kind, inbound.
pub fn get_dependents(store: &GraphStore, id: &str) -> Result<Vec<Node>> {
    neighbor_nodes(store, id, &DEPENDENCY_KINDS, Direction::Incoming)
}

enum Direction {
    Incoming,
    Outgoing,
}

fn neighbor_nodes(store: &GraphStore, id: &str, kinds: &[EdgeKind], direction: Direction) -> Result<Vec<Node>> {
    let edges = match direction {
        Direction::Outgoing => store.get_edges_from(id)?,
        Direction::Incoming => store.get_edges_to(id)?,
    };
    let mut out = Vec::new();
    for edge in edges.iter().filter(|e| kinds.contains(&e.kind)) {
        let other_id = match direction {
            Direction::Outgoing => &edge.target_id,
            Direction::Incoming => &edge.source_id,
        };
        if let Some(node) = store.get_node(other_id)? {
            out.push(node);
        }
    }
    out.sort_by(|a, b| a.id.cmp(&b.id));
    out.dedup_by(|a, b| a.id == b.id);
    Ok(out)
}

/// Outbound bounded BFS from `starts`.
pub fn traverse(store: &GraphStore, starts: &[String], options: &TraverseOptions) -> Result<Subgraph> {
    bfs(store, starts, options, Direction::Outgoing)
}

/// Inbound bounded BFS from `id`: everything that could be affected by a
/// change to it.
pub fn get_impact_radius(store: &GraphStore, id: &str, options: &TraverseOptions) -> Result<Subgraph> {
    bfs(store, &[id.to_string()], options, Direction::Incoming)
}

fn bfs(store: &GraphStore, starts: &[String], options: &TraverseOptions, direction: Direction) -> Result<Subgraph> {
    let mut subgraph = Subgraph { entry_points: starts.to_vec(), ..Default::default() };
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(String, usize)> = VecDeque::new();

    for start in starts {
        if let Some(node) = store.get_node(start)? {
            if node_kind_allowed(&node, options) {
                subgraph.nodes.insert(node.id.clone(), node);
                visited.insert(start.clone());
                queue.push_back((start.clone(), 0));
            }
        }
    }

    if options.max_depth == 0 {
        subgraph.stats.node_count = subgraph.nodes.len();
        return Ok(subgraph);
    }

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= options.max_depth {
            continue;
        }
        if subgraph.nodes.len() >= options.max_nodes {
            subgraph.stats.truncated = true;
            break;
        }

        let edges = match direction {
            Direction::Outgoing => store.get_edges_from(&current)?,
            Direction::Incoming => store.get_edges_to(&current)?,
        };

        for edge in &edges {
            if let Some(kinds) = &options.edge_kinds {
                if !kinds.contains(&edge.kind) {
                    continue;
                }
            }

            let neighbor_id = match direction {
                Direction::Outgoing => edge.target_id.clone(),
                Direction::Incoming => edge.source_id.clone(),
            };

            if subgraph.nodes.len() >= options.max_nodes && !visited.contains(&neighbor_id) {
                subgraph.stats.truncated = true;
                continue;
            }

            subgraph.edges.push(edge.clone());

            if visited.contains(&neighbor_id) {
                continue;
            }
            visited.insert(neighbor_id.clone());

            let Some(node) = store.get_node(&neighbor_id)? else { continue };
            if !node_kind_allowed(&node, options) {
                continue;
            }
            subgraph.nodes.insert(neighbor_id.clone(), node);
            queue.push_back((neighbor_id, depth + 1));
        }
    }

    subgraph.stats.node_count = subgraph.nodes.len();
    subgraph.stats.edge_count = subgraph.edges.len();
    Ok(subgraph)
}

fn node_kind_allowed(node: &Node, options: &TraverseOptions) -> bool {
    options.node_kinds.as_ref().map(|kinds| kinds.contains(&node.kind)).unwrap_or(true)
}

/// Enumerate up to `max_paths` simple outbound paths from `from` to `to`,
/// shortest first, by depth-capped DFS.
pub fn find_paths(store: &GraphStore, from: &str, to: &str, max_depth: usize, max_paths: usize) -> Result<Vec<Vec<String>>> {
    let mut results = Vec::new();
    let mut path = vec![from.to_string()];
    let mut visited = HashSet::new();
    visited.insert(from.to_string());
    find_paths_dfs(store, from, to, max_depth, max_paths, &mut path, &mut visited, &mut results)?;
    results.sort_by_key(|p| p.len());
    results.truncate(max_paths);
    Ok(results)
}

fn find_paths_dfs(
    store: &GraphStore,
    current: &str,
    to: &str,
    max_depth: usize,
    max_paths: usize,
    path: &mut Vec<String>,
    visited: &mut HashSet<String>,
    results: &mut Vec<Vec<String>>,
) -> Result<()> {
    if results.len() >= max_paths {
        return Ok(());
    }
    if current == to {
        results.push(path.clone());
        return Ok(());
    }
    if path.len() as u32 > max_depth as u32 {
        return Ok(());
    }

    for edge in store.get_edges_from(current)? {
        if visited.contains(&edge.target_id) {
            continue;
        }
        visited.insert(edge.target_id.clone());
        path.push(edge.target_id.clone());
        find_paths_dfs(store, &edge.target_id, to, max_depth, max_paths, path, visited, results)?;
        path.pop();
        visited.remove(&edge.target_id);
        if results.len() >= max_paths {
            return Ok(());
        }
    }
    Ok(())
}

/// Lexical search over node name/qualified_name/path, ranked by kind bonus,
/// path relevance, and textual match; stop-words and short terms dropped.
pub fn search_nodes(store: &GraphStore, text: &str, options: &SearchOptions) -> Result<Vec<SearchHit>> {
    let terms = query_terms(text);
    if terms.is_empty() {
        return Ok(Vec::new());
    }

    let mut hits: Vec<SearchHit> = Vec::new();
    for node in store.all_nodes()? {
        let score = score_node(&node, &terms);
        if score > 0 {
            hits.push(SearchHit { node, score });
        }
    }

    hits.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.node.file_path.len().cmp(&b.node.file_path.len())).then_with(|| a.node.id.cmp(&b.node.id)));
    hits.truncate(options.limit);
    Ok(hits)
}

const STOP_WORDS: &[&str] = &["the", "a", "an", "of", "to", "in", "and", "or", "is", "for"];

fn query_terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(|s| s.to_ascii_lowercase())
        .filter(|s| s.len() >= 2 && !STOP_WORDS.contains(&s.as_str()))
        .collect()
}

/// Splits `name` on `_`/`-` and camelCase boundaries into lowercase tokens,
/// so `getUserById` and `get_user_by_id` both yield `["get", "user", "by",
/// "id"]`. Used for a weaker partial-match signal in `score_node` beyond a
/// verbatim substring match.
fn name_tokens(name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in name.chars() {
        if c == '_' || c == '-' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        current.push(c.to_ascii_lowercase());
        prev_lower = c.is_lowercase() || c.is_numeric();
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn score_node(node: &Node, terms: &[String]) -> u32 {
    let mut score = 0u32;
    let name_lower = node.name.to_ascii_lowercase();
    let qn_lower = node.qualified_name.to_ascii_lowercase();
    let path_lower = node.file_path.to_ascii_lowercase();
    let file_stem = std::path::Path::new(&node.file_path).file_stem().map(|s| s.to_string_lossy().to_ascii_lowercase()).unwrap_or_default();
    let name_tokens = name_tokens(&node.name);

    let mut matched_any = false;
    for term in terms {
        if name_lower == *term {
            score += 50;
            matched_any = true;
        } else if name_lower.contains(term) {
            score += 25;
            matched_any = true;
        } else if qn_lower.contains(term) {
            score += 15;
            matched_any = true;
        }

        // Stackable bonus on top of the above: a term that matches one of
        // the name's case/separator-split tokens whole (not just somewhere
        // inside a longer word) is a cleaner hit than a mid-word substring.
        if name_tokens.iter().any(|t| t == term) {
            score += 10;
            matched_any = true;
        }

        if file_stem == *term {
            score += 20;
            matched_any = true;
        } else if path_lower.contains(term) {
            score += 5;
            matched_any = true;
        }
    }

    if !matched_any {
        return 0;
    }

    score + node.kind.search_bonus()
}
