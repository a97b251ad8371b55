//! Graph data model: `Node`, `Edge`, `FileRecord`, `UnresolvedReference`.
//!
//! One open `kind` field per type rather than a struct-per-kind hierarchy —
//! adding a node or edge kind never requires a new Rust type.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    File,
    Module,
    Namespace,
    Class,
    Interface,
    Trait,
    Struct,
    Enum,
    Function,
    Method,
    Variable,
    Constant,
    Property,
    Field,
    Parameter,
    TypeAlias,
    Component,
    Route,
    Import,
    Export,
    Protocol,
    EnumMember,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Module => "module",
            NodeKind::Namespace => "namespace",
            NodeKind::Class => "class",
            NodeKind::Interface => "interface",
            NodeKind::Trait => "trait",
            NodeKind::Struct => "struct",
            NodeKind::Enum => "enum",
            NodeKind::Function => "function",
            NodeKind::Method => "method",
            NodeKind::Variable => "variable",
            NodeKind::Constant => "constant",
            NodeKind::Property => "property",
            NodeKind::Field => "field",
            NodeKind::Parameter => "parameter",
            NodeKind::TypeAlias => "type_alias",
            NodeKind::Component => "component",
            NodeKind::Route => "route",
            NodeKind::Import => "import",
            NodeKind::Export => "export",
            NodeKind::Protocol => "protocol",
            NodeKind::EnumMember => "enum_member",
        }
    }

    /// Kind bonus used by `search_nodes` ranking: functions/methods rank
    /// highest, routes/components next, parameters/files contribute nothing.
    pub fn search_bonus(&self) -> u32 {
        match self {
            NodeKind::Function | NodeKind::Method => 30,
            NodeKind::Route | NodeKind::Component => 20,
            NodeKind::Class | NodeKind::Struct | NodeKind::Interface | NodeKind::Trait | NodeKind::Enum => 15,
            NodeKind::Module | NodeKind::Namespace => 10,
            NodeKind::Property | NodeKind::Field | NodeKind::Constant | NodeKind::Variable => 5,
            NodeKind::Parameter | NodeKind::File => 0,
            _ => 5,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
    Protected,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Contains,
    Imports,
    Exports,
    Calls,
    Extends,
    Implements,
    ReturnsType,
    Throws,
    Reads,
    Writes,
    Renders,
    Instantiates,
    Decorates,
    DependsOn,
    References,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Contains => "contains",
            EdgeKind::Imports => "imports",
            EdgeKind::Exports => "exports",
            EdgeKind::Calls => "calls",
            EdgeKind::Extends => "extends",
            EdgeKind::Implements => "implements",
            EdgeKind::ReturnsType => "returns_type",
            EdgeKind::Throws => "throws",
            EdgeKind::Reads => "reads",
            EdgeKind::Writes => "writes",
            EdgeKind::Renders => "renders",
            EdgeKind::Instantiates => "instantiates",
            EdgeKind::Decorates => "decorates",
            EdgeKind::DependsOn => "depends_on",
            EdgeKind::References => "references",
        }
    }

    /// Edge kinds the Query Engine treats as "dependency-like" for
    /// `get_dependencies`/`get_dependents` and Context Builder expansion.
    pub fn significant() -> &'static [EdgeKind] {
        &[
            EdgeKind::Calls,
            EdgeKind::Extends,
            EdgeKind::Implements,
            EdgeKind::Imports,
            EdgeKind::References,
        ]
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A code entity: file, class, function, and so on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub name: String,
    pub qualified_name: String,
    pub file_path: String,
    pub language: String,

    pub start_line: u32,
    pub end_line: u32,
    pub start_column: u32,
    pub end_column: u32,

    pub signature: Option<String>,
    pub docstring: Option<String>,
    pub code_snippet: Option<String>,
    pub code_hash: Option<String>,
    pub metadata: Option<serde_json::Value>,

    pub visibility: Visibility,
    pub is_exported: bool,
    pub is_async: bool,
    pub is_static: bool,

    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// A directed, typed relationship between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: String,
    pub target_id: String,
    pub kind: EdgeKind,
    pub resolved: bool,
    pub target_name: Option<String>,
    pub line_number: u32,
    pub metadata: Option<serde_json::Value>,
}

/// One per indexed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub content_hash: String,
    pub language: String,
    pub size: u64,
    pub modified_at: chrono::DateTime<chrono::Utc>,
    pub indexed_at: chrono::DateTime<chrono::Utc>,
    pub node_count: u32,
    pub errors: Option<Vec<String>>,
}

/// A pending edge whose target is a name, not an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnresolvedReference {
    pub from_node_id: String,
    pub reference_name: String,
    pub reference_kind: EdgeKind,
    pub line: u32,
    pub column: u32,
    pub file_path: String,
    pub language: String,
}

/// Schema version recorded in the `meta` table; bump when the stored shape
/// of `Node`/`Edge` changes in a way that isn't forward-compatible.
pub const CODEGRAPH_SCHEMA_VERSION: i64 = 1;
