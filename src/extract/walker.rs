//! Generic depth-first tree walker. One implementation for every language;
//! behavior is parameterized entirely by a `LanguageRules` row.

use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tree_sitter::Node as TsNode;

use crate::extract::rules::{rules_for, LanguageRules};
use crate::grammar::{GrammarRegistry, Language};
use crate::graph::schema::{Edge, EdgeKind, Node, NodeKind, UnresolvedReference, Visibility};

pub struct ExtractionResult {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub unresolved: Vec<UnresolvedReference>,
    pub errors: Vec<String>,
    pub duration: Duration,
}

/// An open containing scope on the walk stack. `node_id` is `None` for an
/// `impl` block reopening a type whose definition wasn't seen in this file
/// (an external or not-yet-visited type): methods inside still classify as
/// `Method`, they just can't be linked by a `contains` edge to anything.
struct ScopeFrame {
    node_id: Option<String>,
    name: String,
    is_type: bool,
}

struct Walker<'a> {
    file_path: &'a str,
    source: &'a str,
    language: &'a Language,
    rules: LanguageRules,
    stack: Vec<ScopeFrame>,
    /// Type name -> node id, populated as struct/enum/trait/class/interface
    /// nodes are created, consulted when an `impl` block reopens a type by
    /// name to link its methods back to it.
    type_node_ids: std::collections::HashMap<String, String>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    unresolved: Vec<UnresolvedReference>,
    file_node_id: String,
}

/// `id = "<kind>:<digest16(filepath, kind, name, start_line)>"`.
pub fn node_id(kind: NodeKind, file_path: &str, name: &str, start_line: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file_path.as_bytes());
    hasher.update(b"\0");
    hasher.update(kind.as_str().as_bytes());
    hasher.update(b"\0");
    hasher.update(name.as_bytes());
    hasher.update(b"\0");
    hasher.update(start_line.to_le_bytes());
    let digest = hasher.finalize();
    let hex = hex::encode(digest);
    format!("{}:{}", kind.as_str(), &hex[..16])
}

pub fn extract(file_path: &str, source: &str, language: &Language, registry: &GrammarRegistry) -> ExtractionResult {
    let start = Instant::now();
    let mut errors = Vec::new();

    let Some(mut parser) = registry.get_parser(language) else {
        errors.push(format!("no parser available for language {}", language.as_str()));
        return ExtractionResult { nodes: vec![], edges: vec![], unresolved: vec![], errors, duration: start.elapsed() };
    };

    let Some(tree) = parser.parse(source, None) else {
        errors.push("parser returned no tree".to_string());
        return ExtractionResult { nodes: vec![], edges: vec![], unresolved: vec![], errors, duration: start.elapsed() };
    };

    let root = tree.root_node();
    if root.has_error() {
        errors.push(format!("{} contains syntax errors; partial extraction", file_path));
    }

    let file_start_line = root.start_position().row as u32 + 1;
    let file_end_line = root.end_position().row as u32 + 1;
    let file_node_id = node_id(NodeKind::File, file_path, file_path, file_start_line);
    let file_node = Node {
        id: file_node_id.clone(),
        kind: NodeKind::File,
        name: file_path.to_string(),
        qualified_name: file_path.to_string(),
        file_path: file_path.to_string(),
        language: language.as_str().to_string(),
        start_line: file_start_line,
        end_line: file_end_line,
        start_column: 0,
        end_column: root.end_position().column as u32,
        signature: None,
        docstring: None,
        code_snippet: None,
        code_hash: None,
        metadata: None,
        visibility: Visibility::Public,
        is_exported: true,
        is_async: false,
        is_static: false,
        updated_at: chrono::Utc::now(),
    };

    let mut walker = Walker {
        file_path,
        source,
        language,
        rules: rules_for(language),
        stack: Vec::new(),
        type_node_ids: std::collections::HashMap::new(),
        nodes: vec![file_node],
        edges: Vec::new(),
        unresolved: Vec::new(),
        file_node_id,
    };

    walker.walk(root);

    ExtractionResult {
        nodes: walker.nodes,
        edges: walker.edges,
        unresolved: walker.unresolved,
        errors,
        duration: start.elapsed(),
    }
}

impl<'a> Walker<'a> {
    fn text(&self, node: TsNode) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn qualified_name(&self, name: &str) -> String {
        let mut parts: Vec<&str> = vec![self.file_path];
        parts.extend(self.stack.iter().map(|f| f.name.as_str()));
        parts.push(name);
        parts.join("::")
    }

    fn innermost_node_id(&self) -> Option<String> {
        self.stack.last().and_then(|f| f.node_id.clone())
    }

    fn innermost_is_type(&self) -> bool {
        self.stack.last().map(|f| f.is_type).unwrap_or(false)
    }

    fn node_name(&self, node: TsNode) -> String {
        if let Some(name_node) = node.child_by_field_name(self.rules.name_field) {
            return self.text(name_node).to_string();
        }
        // Fall back to the first identifier-like child.
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            let kind = child.kind();
            if kind.ends_with("identifier") || kind == "field_identifier" || kind == "type_identifier" {
                return self.text(child).to_string();
            }
        }
        "<anonymous>".to_string()
    }

    fn docstring(&self, node: TsNode) -> Option<String> {
        let mut lines: Vec<&str> = Vec::new();
        let mut cursor = node;
        loop {
            let prev = cursor.prev_sibling()?;
            if !self.rules.is_comment(prev.kind()) {
                break;
            }
            let mut text = self.text(prev);
            for prefix in self.rules.line_comment_prefixes {
                if let Some(stripped) = text.strip_prefix(prefix) {
                    text = stripped.trim();
                    break;
                }
            }
            if let Some((open, close)) = self.rules.block_comment_delims {
                if let Some(stripped) = text.strip_prefix(open).and_then(|s| s.strip_suffix(close)) {
                    text = stripped.trim();
                }
            }
            lines.push(text);
            cursor = prev;
        }
        if lines.is_empty() {
            None
        } else {
            lines.reverse();
            Some(lines.join("\n"))
        }
    }

    fn visibility(&self, node: TsNode) -> Visibility {
        let prefix = &self.source.as_bytes()[..node.start_byte().min(self.source.len())];
        let prefix_text = std::str::from_utf8(prefix).unwrap_or("");
        let window_start = prefix_text.len().saturating_sub(64);
        let window = &prefix_text[window_start..];
        for tok in self.rules.private_modifier_tokens {
            if !tok.is_empty() && window.contains(tok) {
                return Visibility::Private;
            }
        }
        for tok in self.rules.public_modifier_tokens {
            if !tok.is_empty() && window.contains(tok) {
                return Visibility::Public;
            }
        }
        if self.rules.default_visibility_public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }

    fn has_modifier_nearby(&self, node: TsNode, tokens: &[&str]) -> bool {
        if tokens.is_empty() {
            return false;
        }
        let prefix = &self.source.as_bytes()[..node.start_byte().min(self.source.len())];
        let prefix_text = std::str::from_utf8(prefix).unwrap_or("");
        let window_start = prefix_text.len().saturating_sub(32);
        let window = &prefix_text[window_start..];
        tokens.iter().any(|t| window.contains(t))
    }

    fn signature(&self, node: TsNode) -> Option<String> {
        let params = self.rules.params_field.and_then(|f| node.child_by_field_name(f)).map(|n| self.text(n));
        let ret = self.rules.return_type_field.and_then(|f| node.child_by_field_name(f)).map(|n| self.text(n));
        match (params, ret) {
            (Some(p), Some(r)) => Some(format!("{} -> {}", p, r)),
            (Some(p), None) => Some(p.to_string()),
            (None, Some(r)) => Some(r.to_string()),
            (None, None) => None,
        }
    }

    fn code_snippet(&self, node: TsNode) -> String {
        let text = self.text(node);
        text.chars().take(500).collect()
    }

    fn code_hash(&self, node: TsNode) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.text(node).as_bytes());
        hex::encode(hasher.finalize())
    }

    fn push_contains_edge(&mut self, child_id: &str, line: u32) {
        if let Some(parent_id) = self.innermost_node_id() {
            self.edges.push(Edge {
                source_id: parent_id,
                target_id: child_id.to_string(),
                kind: EdgeKind::Contains,
                resolved: true,
                target_name: None,
                line_number: line,
                metadata: None,
            });
        }
    }

    fn make_node(&self, kind: NodeKind, ts_node: TsNode, name: &str) -> Node {
        let start_line = ts_node.start_position().row as u32 + 1;
        let end_line = ts_node.end_position().row as u32 + 1;
        let id = node_id(kind, self.file_path, name, start_line);
        Node {
            id,
            kind,
            name: name.to_string(),
            qualified_name: self.qualified_name(name),
            file_path: self.file_path.to_string(),
            language: self.language.as_str().to_string(),
            start_line,
            end_line,
            start_column: ts_node.start_position().column as u32,
            end_column: ts_node.end_position().column as u32,
            signature: self.signature(ts_node),
            docstring: self.docstring(ts_node),
            code_snippet: Some(self.code_snippet(ts_node)),
            code_hash: Some(self.code_hash(ts_node)),
            metadata: None,
            visibility: self.visibility(ts_node),
            is_exported: matches!(self.visibility(ts_node), Visibility::Public),
            is_async: self.has_modifier_nearby(ts_node, self.rules.async_modifier_tokens),
            is_static: self.has_modifier_nearby(ts_node, self.rules.static_modifier_tokens),
            updated_at: chrono::Utc::now(),
        }
    }

    fn record_unresolved(&mut self, kind: EdgeKind, name: &str, line: u32, column: u32) {
        let from = self.innermost_node_id().unwrap_or_else(|| self.file_node_id.clone());
        self.unresolved.push(UnresolvedReference {
            from_node_id: from,
            reference_name: name.to_string(),
            reference_kind: kind,
            line,
            column,
            file_path: self.file_path.to_string(),
            language: self.language.as_str().to_string(),
        });
    }

    fn callee_name(&self, call_node: TsNode) -> Option<String> {
        let callee = call_node.child_by_field_name("function").or_else(|| call_node.child(0))?;
        match callee.kind() {
            "field_expression" | "member_expression" | "attribute" | "field_access" => callee
                .child_by_field_name("field")
                .or_else(|| callee.child_by_field_name("property"))
                .or_else(|| callee.child_by_field_name("attribute"))
                .map(|n| self.text(n).to_string()),
            "scoped_identifier" => callee.child_by_field_name("name").map(|n| self.text(n).to_string()),
            _ => Some(self.text(callee).to_string()),
        }
    }

    /// Name of the type an `impl` block reopens, unwrapping a generic
    /// argument list (`impl Foo<T>` -> `Foo`) and a trait impl's `for`
    /// target (`impl Trait for Foo` -> `Foo`, not `Trait`).
    fn impl_type_name(&self, node: TsNode) -> Option<String> {
        let ty = node.child_by_field_name("type")?;
        fn find_ident(n: TsNode) -> Option<TsNode> {
            if n.kind() == "type_identifier" {
                return Some(n);
            }
            let mut cursor = n.walk();
            for child in n.children(&mut cursor) {
                if let Some(found) = find_ident(child) {
                    return Some(found);
                }
            }
            None
        }
        find_ident(ty).map(|n| self.text(n).to_string())
    }

    fn extends_implements(&mut self, node: TsNode) {
        for field in ["superclass", "extends_clause", "implements_clause", "supertrait_clause", "interfaces"] {
            let Some(clause) = node.child_by_field_name(field) else { continue };
            let mut cursor = clause.walk();
            for child in clause.children(&mut cursor) {
                let kind = child.kind();
                if kind.ends_with("identifier") || kind == "type_identifier" || kind == "generic_type" {
                    let name = self.text(child).to_string();
                    let edge_kind = if field.contains("implements") { EdgeKind::Implements } else { EdgeKind::Extends };
                    let line = child.start_position().row as u32 + 1;
                    let col = child.start_position().column as u32;
                    self.record_unresolved(edge_kind, &name, line, col);
                }
            }
        }
    }

    fn walk(&mut self, node: TsNode) {
        let kind = node.kind();
        let line = node.start_position().row as u32 + 1;
        let column = node.start_position().column as u32;

        if self.rules.is_import(kind) {
            let name = self.text(node).trim().to_string();
            self.record_unresolved(EdgeKind::Imports, &name, line, column);
            return;
        }

        if self.rules.is_call(kind) {
            if let Some(callee) = self.callee_name(node) {
                self.record_unresolved(EdgeKind::Calls, &callee, line, column);
            }
        }

        if let Some(type_kind) = self.rules.node_kind_for(kind) {
            let name = self.node_name(node);
            if name != "<anonymous>" {
                let n = self.make_node(type_kind, node, &name);
                let id = n.id.clone();
                self.push_contains_edge(&id, line);
                self.type_node_ids.insert(name.clone(), id.clone());
                self.nodes.push(n);
                self.extends_implements(node);

                self.stack.push(ScopeFrame { node_id: Some(id), name, is_type: true });
                self.walk_children(node);
                self.stack.pop();
                return;
            }
        }

        if self.rules.is_impl(kind) {
            if let Some(type_name) = self.impl_type_name(node) {
                let node_id = self.type_node_ids.get(&type_name).cloned();
                self.stack.push(ScopeFrame { node_id, name: type_name, is_type: true });
                self.walk_children(node);
                self.stack.pop();
                return;
            }
        }

        if self.rules.is_function_like(kind) {
            let is_method = self.rules.is_always_method(kind) || self.innermost_is_type();
            // Skip anonymous top-level functions (arrow functions assigned
            // nowhere identifiable); named closures still get a node.
            let name = self.node_name(node);
            if name != "<anonymous>" || is_method {
                let node_kind = if is_method { NodeKind::Method } else { NodeKind::Function };
                let resolved_name = if name == "<anonymous>" { "<anonymous>".to_string() } else { name };
                if resolved_name != "<anonymous>" {
                    let n = self.make_node(node_kind, node, &resolved_name);
                    let id = n.id.clone();
                    self.push_contains_edge(&id, line);
                    self.nodes.push(n);

                    self.stack.push(ScopeFrame { node_id: Some(id), name: resolved_name, is_type: false });
                    self.walk_children(node);
                    self.stack.pop();
                    return;
                }
            }
        }

        self.walk_children(node);
    }

    fn walk_children(&mut self, node: TsNode) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child);
        }
    }
}
