//! Graph Store: schema-backed operations over `sqlitegraph`, plus a small
//! set of auxiliary rusqlite-backed tables (`file_records`, `unresolved_refs`,
//! `meta`) for data that isn't part of the node/edge graph itself.
//!
//! Nodes and (resolved) edges live as `sqlitegraph` entities/edges so that
//! traversal (`neighbors`, `get_node`) goes through the real graph engine.
//! Lookups by kind/name/qualified-name/file scan `entity_ids()` directly;
//! there is no secondary index over entity data, so these are O(n) scans.
//!
//! `sqlitegraph`'s own edge payload (set via `EdgeSpec::data`) isn't given
//! back by `neighbors()`, which only returns the neighboring entity ids, so
//! `edge_attrs` mirrors each edge's `line_number`/`target_name`/`metadata`
//! alongside the node id map for the read path to join against.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;
use serde_json::json;
use sqlitegraph::{BackendDirection, EdgeSpec, GraphBackend, NeighborQuery, NodeSpec, SnapshotId, SqliteGraph, SqliteGraphBackend};

use crate::graph::schema::{Edge, EdgeKind, FileRecord, Node, NodeKind, UnresolvedReference, Visibility, CODEGRAPH_SCHEMA_VERSION};

pub struct GraphStore {
    backend: Rc<SqliteGraphBackend>,
    aux: Connection,
    db_path: PathBuf,
}

fn node_to_json(node: &Node) -> serde_json::Value {
    serde_json::to_value(node).unwrap_or(json!({}))
}

fn json_to_node(data: &serde_json::Value) -> Option<Node> {
    serde_json::from_value(data.clone()).ok()
}

impl GraphStore {
    /// Open (creating if absent) the graph store at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }

        let graph = SqliteGraph::open(db_path).with_context(|| format!("opening graph store at {}", db_path.display()))?;
        let backend = Rc::new(SqliteGraphBackend::from_graph(graph));

        let aux = Connection::open(db_path).with_context(|| format!("opening aux connection to {}", db_path.display()))?;
        Self::init_aux_schema(&aux)?;

        Ok(GraphStore { backend, aux, db_path: db_path.to_path_buf() })
    }

    fn init_aux_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS file_records (
                path TEXT PRIMARY KEY,
                content_hash TEXT NOT NULL,
                language TEXT NOT NULL,
                size INTEGER NOT NULL,
                modified_at TEXT NOT NULL,
                indexed_at TEXT NOT NULL,
                node_count INTEGER NOT NULL,
                errors TEXT
            );
            CREATE TABLE IF NOT EXISTS unresolved_refs (
                from_node_id TEXT NOT NULL,
                reference_name TEXT NOT NULL,
                reference_kind TEXT NOT NULL,
                line INTEGER NOT NULL,
                column INTEGER NOT NULL,
                file_path TEXT NOT NULL,
                language TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_unresolved_file ON unresolved_refs(file_path);
            CREATE INDEX IF NOT EXISTS idx_unresolved_name ON unresolved_refs(reference_name);
            CREATE TABLE IF NOT EXISTS node_entity_map (
                logical_id TEXT PRIMARY KEY,
                entity_id INTEGER NOT NULL,
                file_path TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_node_entity_file ON node_entity_map(file_path);
            CREATE TABLE IF NOT EXISTS edge_attrs (
                source_entity_id INTEGER NOT NULL,
                target_entity_id INTEGER NOT NULL,
                edge_type TEXT NOT NULL,
                line_number INTEGER NOT NULL,
                target_name TEXT,
                metadata TEXT,
                PRIMARY KEY (source_entity_id, target_entity_id, edge_type)
            );
            CREATE TABLE IF NOT EXISTS codegraph_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO codegraph_meta(key, value) VALUES ('schema_version', ?1)",
            rusqlite::params![CODEGRAPH_SCHEMA_VERSION.to_string()],
        )?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Run `f` inside one transaction on the auxiliary connection. The
    /// sqlitegraph writes inside `f` are issued first; if `f` returns `Err`
    /// the auxiliary transaction rolls back, leaving the secondary index
    /// consistent with whatever sqlitegraph state was actually committed.
    pub fn transaction<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.aux.execute("BEGIN", [])?;
        match f(self) {
            Ok(value) => {
                self.aux.execute("COMMIT", [])?;
                Ok(value)
            }
            Err(err) => {
                let _ = self.aux.execute("ROLLBACK", []);
                Err(err)
            }
        }
    }

    // -- files --------------------------------------------------------

    pub fn upsert_file(&self, record: &FileRecord) -> Result<()> {
        self.aux.execute(
            "INSERT INTO file_records(path, content_hash, language, size, modified_at, indexed_at, node_count, errors)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(path) DO UPDATE SET
                content_hash=excluded.content_hash, language=excluded.language, size=excluded.size,
                modified_at=excluded.modified_at, indexed_at=excluded.indexed_at,
                node_count=excluded.node_count, errors=excluded.errors",
            rusqlite::params![
                record.path,
                record.content_hash,
                record.language,
                record.size,
                record.modified_at.to_rfc3339(),
                record.indexed_at.to_rfc3339(),
                record.node_count,
                record.errors.as_ref().map(|e| serde_json::to_string(e).unwrap_or_default()),
            ],
        )?;
        Ok(())
    }

    pub fn get_file_by_path(&self, path: &str) -> Result<Option<FileRecord>> {
        let mut stmt = self.aux.prepare(
            "SELECT path, content_hash, language, size, modified_at, indexed_at, node_count, errors
             FROM file_records WHERE path = ?1",
        )?;
        let mut rows = stmt.query(rusqlite::params![path])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::row_to_file_record(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn get_all_files(&self) -> Result<Vec<FileRecord>> {
        let mut stmt = self.aux.prepare(
            "SELECT path, content_hash, language, size, modified_at, indexed_at, node_count, errors
             FROM file_records ORDER BY path",
        )?;
        let rows = stmt.query_map([], Self::row_to_file_record)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    fn row_to_file_record(row: &rusqlite::Row) -> rusqlite::Result<FileRecord> {
        let errors_json: Option<String> = row.get(7)?;
        Ok(FileRecord {
            path: row.get(0)?,
            content_hash: row.get(1)?,
            language: row.get(2)?,
            size: row.get(3)?,
            modified_at: parse_rfc3339(&row.get::<_, String>(4)?),
            indexed_at: parse_rfc3339(&row.get::<_, String>(5)?),
            node_count: row.get(6)?,
            errors: errors_json.and_then(|s| serde_json::from_str(&s).ok()),
        })
    }

    /// Delete a file record and cascade to its nodes, outbound edges, and
    /// unresolved references.
    pub fn delete_file(&mut self, path: &str) -> Result<()> {
        let entity_ids: Vec<(String, i64)> = {
            let mut stmt = self.aux.prepare("SELECT logical_id, entity_id FROM node_entity_map WHERE file_path = ?1")?;
            let rows = stmt.query_map(rusqlite::params![path], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };

        for (_, entity_id) in &entity_ids {
            self.backend.delete_entity(*entity_id).with_context(|| format!("deleting entity {entity_id}"))?;
            self.aux.execute(
                "DELETE FROM edge_attrs WHERE source_entity_id = ?1 OR target_entity_id = ?1",
                rusqlite::params![entity_id],
            )?;
        }

        self.aux.execute("DELETE FROM node_entity_map WHERE file_path = ?1", rusqlite::params![path])?;
        self.aux.execute("DELETE FROM unresolved_refs WHERE file_path = ?1", rusqlite::params![path])?;
        self.aux.execute("DELETE FROM file_records WHERE path = ?1", rusqlite::params![path])?;
        Ok(())
    }

    // -- nodes --------------------------------------------------------

    pub fn insert_nodes(&mut self, nodes: &[Node]) -> Result<()> {
        for node in nodes {
            let entity_id = self
                .backend
                .create_node(NodeSpec {
                    kind: node.kind.as_str().to_string(),
                    data: node_to_json(node),
                    file_path: Some(node.file_path.clone()),
                })
                .with_context(|| format!("inserting node {}", node.id))?;

            self.aux.execute(
                "INSERT OR REPLACE INTO node_entity_map(logical_id, entity_id, file_path) VALUES (?1, ?2, ?3)",
                rusqlite::params![node.id, entity_id.as_i64(), node.file_path],
            )?;
        }
        Ok(())
    }

    pub fn get_node(&self, id: &str) -> Result<Option<Node>> {
        let Some(entity_id) = self.entity_id_for(id)? else { return Ok(None) };
        let snapshot = SnapshotId::current();
        let record = self.backend.get_node(snapshot, entity_id)?;
        Ok(json_to_node(&record.data))
    }

    fn entity_id_for(&self, logical_id: &str) -> Result<Option<i64>> {
        let mut stmt = self.aux.prepare("SELECT entity_id FROM node_entity_map WHERE logical_id = ?1")?;
        let mut rows = stmt.query(rusqlite::params![logical_id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    fn logical_id_for(&self, entity_id: i64) -> Result<Option<String>> {
        let mut stmt = self.aux.prepare("SELECT logical_id FROM node_entity_map WHERE entity_id = ?1")?;
        let mut rows = stmt.query(rusqlite::params![entity_id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    /// Full entity scan: every node currently stored, deserialized.
    pub fn all_nodes(&self) -> Result<Vec<Node>> {
        let snapshot = SnapshotId::current();
        let ids = self.backend.entity_ids()?;
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let record = self.backend.get_node(snapshot, id)?;
            if let Some(node) = json_to_node(&record.data) {
                out.push(node);
            }
        }
        Ok(out)
    }

    pub fn get_node_by_qualified_name(&self, qn: &str) -> Result<Option<Node>> {
        Ok(self.all_nodes()?.into_iter().find(|n| n.qualified_name == qn))
    }

    pub fn get_nodes_by_kind(&self, kind: NodeKind) -> Result<Vec<Node>> {
        Ok(self.all_nodes()?.into_iter().filter(|n| n.kind == kind).collect())
    }

    pub fn get_nodes_by_name(&self, name: &str) -> Result<Vec<Node>> {
        Ok(self.all_nodes()?.into_iter().filter(|n| n.name == name).collect())
    }

    // -- edges ----------------------------------------------------------

    pub fn insert_edges(&mut self, edges: &[Edge]) -> Result<()> {
        for edge in edges {
            self.insert_edge(edge)?;
        }
        Ok(())
    }

    pub fn insert_edge(&mut self, edge: &Edge) -> Result<()> {
        let Some(source_entity) = self.entity_id_for(&edge.source_id)? else {
            return Err(anyhow!("edge source {} has no stored node", edge.source_id));
        };
        let Some(target_entity) = self.entity_id_for(&edge.target_id)? else {
            return Err(anyhow!("edge target {} has no stored node", edge.target_id));
        };

        if self.edge_exists(edge)? {
            return Ok(());
        }

        self.backend
            .create_edge(EdgeSpec {
                from: source_entity,
                to: target_entity,
                edge_type: edge.kind.as_str().to_string(),
                data: json!({
                    "line_number": edge.line_number,
                    "target_name": edge.target_name,
                    "metadata": edge.metadata,
                }),
            })
            .with_context(|| format!("inserting edge {} -> {}", edge.source_id, edge.target_id))?;

        let metadata_text = edge.metadata.as_ref().map(|m| m.to_string());
        self.aux.execute(
            "INSERT OR REPLACE INTO edge_attrs(source_entity_id, target_entity_id, edge_type, line_number, target_name, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![source_entity, target_entity, edge.kind.as_str(), edge.line_number, edge.target_name, metadata_text],
        )?;
        Ok(())
    }

    fn edge_exists(&self, edge: &Edge) -> Result<bool> {
        let existing = self.get_edges_from(&edge.source_id)?;
        Ok(existing
            .iter()
            .any(|e| e.target_id == edge.target_id && e.kind == edge.kind && e.line_number == edge.line_number))
    }

    /// Looks up the `line_number`/`target_name`/`metadata` side table row for
    /// an edge between two entities, falling back to defaults if the backend
    /// somehow has an edge with no matching `edge_attrs` row.
    fn edge_attrs_for(&self, source_entity: i64, target_entity: i64, kind: &str) -> Result<(u32, Option<String>, Option<serde_json::Value>)> {
        let mut stmt = self.aux.prepare(
            "SELECT line_number, target_name, metadata FROM edge_attrs
             WHERE source_entity_id = ?1 AND target_entity_id = ?2 AND edge_type = ?3",
        )?;
        let mut rows = stmt.query(rusqlite::params![source_entity, target_entity, kind])?;
        if let Some(row) = rows.next()? {
            let line_number: i64 = row.get(0)?;
            let target_name: Option<String> = row.get(1)?;
            let metadata_text: Option<String> = row.get(2)?;
            let metadata = metadata_text.and_then(|t| serde_json::from_str(&t).ok());
            Ok((line_number as u32, target_name, metadata))
        } else {
            Ok((0, None, None))
        }
    }

    pub fn get_edges_from(&self, id: &str) -> Result<Vec<Edge>> {
        let Some(entity_id) = self.entity_id_for(id)? else { return Ok(vec![]) };
        let snapshot = SnapshotId::current();
        let mut out = Vec::new();
        for kind in all_edge_kinds() {
            let neighbors = self.backend.neighbors(
                snapshot,
                entity_id,
                NeighborQuery { direction: BackendDirection::Outgoing, edge_type: Some(kind.as_str().to_string()) },
            )?;
            for target in neighbors {
                if let Some(target_id) = self.logical_id_for(target)? {
                    let (line_number, target_name, metadata) = self.edge_attrs_for(entity_id, target, kind.as_str())?;
                    out.push(Edge {
                        source_id: id.to_string(),
                        target_id,
                        kind,
                        resolved: true,
                        target_name,
                        line_number,
                        metadata,
                    });
                }
            }
        }
        Ok(out)
    }

    pub fn get_edges_to(&self, id: &str) -> Result<Vec<Edge>> {
        let Some(entity_id) = self.entity_id_for(id)? else { return Ok(vec![]) };
        let snapshot = SnapshotId::current();
        let mut out = Vec::new();
        for kind in all_edge_kinds() {
            let neighbors = self.backend.neighbors(
                snapshot,
                entity_id,
                NeighborQuery { direction: BackendDirection::Incoming, edge_type: Some(kind.as_str().to_string()) },
            )?;
            for source in neighbors {
                if let Some(source_id) = self.logical_id_for(source)? {
                    let (line_number, target_name, metadata) = self.edge_attrs_for(source, entity_id, kind.as_str())?;
                    out.push(Edge {
                        source_id,
                        target_id: id.to_string(),
                        kind,
                        resolved: true,
                        target_name,
                        line_number,
                        metadata,
                    });
                }
            }
        }
        Ok(out)
    }

    pub fn get_edges_between(&self, ids: &[String]) -> Result<Vec<Edge>> {
        let set: std::collections::HashSet<&str> = ids.iter().map(|s| s.as_str()).collect();
        let mut out = Vec::new();
        for id in ids {
            for edge in self.get_edges_from(id)? {
                if set.contains(edge.target_id.as_str()) {
                    out.push(edge);
                }
            }
        }
        Ok(out)
    }

    // -- unresolved references ------------------------------------------

    pub fn insert_unresolved_refs(&mut self, refs: &[UnresolvedReference]) -> Result<()> {
        for r in refs {
            self.aux.execute(
                "INSERT INTO unresolved_refs(from_node_id, reference_name, reference_kind, line, column, file_path, language)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![r.from_node_id, r.reference_name, r.reference_kind.as_str(), r.line, r.column, r.file_path, r.language],
            )?;
        }
        Ok(())
    }

    pub fn all_unresolved_refs(&self) -> Result<Vec<UnresolvedReference>> {
        let mut stmt = self
            .aux
            .prepare("SELECT from_node_id, reference_name, reference_kind, line, column, file_path, language FROM unresolved_refs")?;
        let rows = stmt.query_map([], |row| {
            let kind_str: String = row.get(2)?;
            Ok(UnresolvedReference {
                from_node_id: row.get(0)?,
                reference_name: row.get(1)?,
                reference_kind: edge_kind_from_str(&kind_str).unwrap_or(EdgeKind::References),
                line: row.get(3)?,
                column: row.get(4)?,
                file_path: row.get(5)?,
                language: row.get(6)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Best-effort resolution: for every unresolved reference, look for a
    /// node whose name matches exactly. A match in the referencing file wins
    /// over a match anywhere else in the project; still-unmatched references
    /// remain as first-class unresolved rows rather than errors.
    pub fn resolve_references(&mut self) -> Result<usize> {
        let pending = self.all_unresolved_refs()?;
        if pending.is_empty() {
            return Ok(0);
        }
        let nodes = self.all_nodes()?;
        let mut resolved_count = 0;

        for r in &pending {
            let mut candidates: Vec<&Node> = nodes.iter().filter(|n| n.name == r.reference_name).collect();
            if candidates.is_empty() {
                continue;
            }
            candidates.sort_by_key(|n| (n.file_path != r.file_path, n.qualified_name.clone()));
            let target = candidates[0];

            let edge = Edge {
                source_id: r.from_node_id.clone(),
                target_id: target.id.clone(),
                kind: r.reference_kind,
                resolved: true,
                target_name: None,
                line_number: r.line,
                metadata: None,
            };
            if self.insert_edge(&edge).is_ok() {
                resolved_count += 1;
            }
        }
        Ok(resolved_count)
    }

    pub fn count_nodes(&self) -> Result<usize> {
        Ok(self.backend.entity_ids()?.len())
    }
}

fn all_edge_kinds() -> [EdgeKind; 15] {
    [
        EdgeKind::Contains,
        EdgeKind::Imports,
        EdgeKind::Exports,
        EdgeKind::Calls,
        EdgeKind::Extends,
        EdgeKind::Implements,
        EdgeKind::ReturnsType,
        EdgeKind::Throws,
        EdgeKind::Reads,
        EdgeKind::Writes,
        EdgeKind::Renders,
        EdgeKind::Instantiates,
        EdgeKind::Decorates,
        EdgeKind::DependsOn,
        EdgeKind::References,
    ]
}

fn edge_kind_from_str(s: &str) -> Option<EdgeKind> {
    all_edge_kinds().into_iter().find(|k| k.as_str() == s)
}

fn parse_rfc3339(s: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(s).map(|d| d.with_timezone(&chrono::Utc)).unwrap_or_else(|_| chrono::Utc::now())
}

#[allow(dead_code)]
fn default_visibility() -> Visibility {
    Visibility::Public
}
