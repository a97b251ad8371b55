//! Extractor: walks a parse tree with language-specific rules and emits
//! nodes, edges, and unresolved references for one file at a time.

pub mod rules;
pub mod walker;

pub use walker::{extract, node_id, ExtractionResult};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{GrammarRegistry, Language};
    use crate::graph::schema::{EdgeKind, NodeKind};

    #[test]
    fn extracts_rust_function_and_call() {
        let source = "fn helper() {}\nfn main() { helper(); }\n";
        let registry = GrammarRegistry::new();
        let result = extract("src/main.rs", source, &Language::Rust, &registry);
        assert!(result.errors.is_empty());
        let names: Vec<_> = result.nodes.iter().map(|n| n.name.as_str()).collect();
        assert!(names.contains(&"helper"));
        assert!(names.contains(&"main"));
        assert!(result.nodes.iter().any(|n| n.kind == NodeKind::File));
        assert!(result.nodes.iter().filter(|n| n.kind != NodeKind::File).all(|n| n.kind == NodeKind::Function));
        assert!(result.unresolved.iter().any(|r| r.reference_name == "helper" && r.reference_kind == EdgeKind::Calls));
    }

    #[test]
    fn extracts_rust_struct_and_trait_and_method() {
        let source = "struct Foo { x: i32 }\ntrait Bar {}\nimpl Foo { fn go(&self) {} }\n";
        let registry = GrammarRegistry::new();
        let result = extract("src/lib.rs", source, &Language::Rust, &registry);
        let struct_node = result.nodes.iter().find(|n| n.kind == NodeKind::Struct);
        assert!(struct_node.is_some());
        let trait_node = result.nodes.iter().find(|n| n.kind == NodeKind::Trait);
        assert!(trait_node.is_some());
    }

    #[test]
    fn impl_block_methods_are_methods_contained_by_their_type() {
        let source = "struct Foo { x: i32 }\nimpl Foo { fn go(&self) {} }\n";
        let registry = GrammarRegistry::new();
        let result = extract("src/lib.rs", source, &Language::Rust, &registry);
        let foo = result.nodes.iter().find(|n| n.kind == NodeKind::Struct && n.name == "Foo").unwrap();
        let go = result.nodes.iter().find(|n| n.name == "go").unwrap();
        assert_eq!(go.kind, NodeKind::Method);
        assert!(result
            .edges
            .iter()
            .any(|e| e.kind == EdgeKind::Contains && e.source_id == foo.id && e.target_id == go.id));
    }

    #[test]
    fn top_level_import_resolves_against_the_file_node() {
        let source = "use std::collections::HashMap;\n";
        let registry = GrammarRegistry::new();
        let result = extract("src/lib.rs", source, &Language::Rust, &registry);
        let file_node = result.nodes.iter().find(|n| n.kind == NodeKind::File).unwrap();
        assert!(result
            .unresolved
            .iter()
            .any(|r| r.reference_kind == EdgeKind::Imports && r.from_node_id == file_node.id));
    }

    #[test]
    fn node_ids_are_deterministic() {
        let source = "fn helper() {}\n";
        let registry = GrammarRegistry::new();
        let r1 = extract("src/a.rs", source, &Language::Rust, &registry);
        let r2 = extract("src/a.rs", source, &Language::Rust, &registry);
        assert_eq!(r1.nodes[0].id, r2.nodes[0].id);
    }

    #[test]
    fn python_class_and_method() {
        let source = "class Greeter:\n    def hello(self):\n        print('hi')\n";
        let registry = GrammarRegistry::new();
        let result = extract("app.py", source, &Language::Python, &registry);
        assert!(result.nodes.iter().any(|n| n.kind == NodeKind::Class && n.name == "Greeter"));
        assert!(result.nodes.iter().any(|n| n.kind == NodeKind::Method && n.name == "hello"));
    }

    #[test]
    fn unsupported_grammar_failure_is_non_fatal() {
        // A language whose grammar genuinely fails to load would still
        // return an empty, non-panicking result; we can't force a load
        // failure for a bundled grammar, so this asserts the contract on
        // the happy path instead: extraction never panics on valid input.
        let source = "";
        let registry = GrammarRegistry::new();
        let result = extract("empty.rs", source, &Language::Rust, &registry);
        assert!(result.nodes.iter().all(|n| n.kind == NodeKind::File));
    }
}
