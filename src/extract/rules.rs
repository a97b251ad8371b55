//! Per-language rule tables consumed by the generic walker in `walker.rs`.
//!
//! Adding a language means adding a `LanguageRules` value here, never a new
//! walker implementation.

use crate::grammar::Language;
use crate::graph::schema::NodeKind;

/// Node-type sets and field names that let one walker interpret many
/// grammars. All string slices are tree-sitter node kind names (`.kind()`)
/// or field names (`.child_by_field_name()`), taken from each grammar's own
/// node-types.json vocabulary.
pub struct LanguageRules {
    pub language: Language,

    pub class_types: &'static [&'static str],
    pub struct_types: &'static [&'static str],
    pub enum_types: &'static [&'static str],
    pub interface_types: &'static [&'static str],
    pub trait_types: &'static [&'static str],
    pub function_types: &'static [&'static str],
    pub import_types: &'static [&'static str],
    pub call_types: &'static [&'static str],

    /// Syntax kinds that reopen an existing type's scope without declaring a
    /// node of their own (Rust's `impl Foo { ... }`): methods inside are
    /// scoped to the named type but the block itself isn't a node.
    pub impl_types: &'static [&'static str],

    /// Syntax kinds that unconditionally denote a method regardless of
    /// containing scope (languages where methods carry an explicit receiver
    /// as a top-level form).
    pub always_method_types: &'static [&'static str],

    pub name_field: &'static str,
    pub body_field: &'static str,
    pub params_field: Option<&'static str>,
    pub return_type_field: Option<&'static str>,

    pub async_modifier_tokens: &'static [&'static str],
    pub static_modifier_tokens: &'static [&'static str],
    pub public_modifier_tokens: &'static [&'static str],
    pub private_modifier_tokens: &'static [&'static str],

    pub line_comment_prefixes: &'static [&'static str],
    pub block_comment_delims: Option<(&'static str, &'static str)>,
    pub comment_types: &'static [&'static str],

    /// Default visibility when no modifier token is present.
    pub default_visibility_public: bool,
}

pub fn rules_for(language: &Language) -> LanguageRules {
    match language {
        Language::Rust => LanguageRules {
            language: Language::Rust,
            class_types: &[],
            struct_types: &["struct_item"],
            enum_types: &["enum_item"],
            interface_types: &[],
            trait_types: &["trait_item"],
            function_types: &["function_item", "function_signature_item"],
            import_types: &["use_declaration"],
            call_types: &["call_expression", "macro_invocation"],
            impl_types: &["impl_item"],
            always_method_types: &[],
            name_field: "name",
            body_field: "body",
            params_field: Some("parameters"),
            return_type_field: Some("return_type"),
            async_modifier_tokens: &["async"],
            static_modifier_tokens: &["static"],
            public_modifier_tokens: &["pub"],
            private_modifier_tokens: &[],
            line_comment_prefixes: &["//"],
            block_comment_delims: Some(("/*", "*/")),
            comment_types: &["line_comment", "block_comment"],
            default_visibility_public: false,
        },
        Language::Python => LanguageRules {
            language: Language::Python,
            class_types: &["class_definition"],
            struct_types: &[],
            enum_types: &[],
            interface_types: &[],
            trait_types: &[],
            function_types: &["function_definition"],
            import_types: &["import_statement", "import_from_statement"],
            call_types: &["call"],
            impl_types: &[],
            always_method_types: &[],
            name_field: "name",
            body_field: "body",
            params_field: Some("parameters"),
            return_type_field: Some("return_type"),
            async_modifier_tokens: &["async"],
            static_modifier_tokens: &["staticmethod"],
            public_modifier_tokens: &[],
            private_modifier_tokens: &[],
            line_comment_prefixes: &["#"],
            block_comment_delims: None,
            comment_types: &["comment"],
            default_visibility_public: true,
        },
        Language::JavaScript => LanguageRules {
            language: Language::JavaScript,
            class_types: &["class_declaration", "class"],
            struct_types: &[],
            enum_types: &[],
            interface_types: &[],
            trait_types: &[],
            function_types: &[
                "function_declaration",
                "function",
                "method_definition",
                "arrow_function",
                "generator_function_declaration",
            ],
            import_types: &["import_statement"],
            call_types: &["call_expression"],
            impl_types: &[],
            always_method_types: &["method_definition"],
            name_field: "name",
            body_field: "body",
            params_field: Some("parameters"),
            return_type_field: None,
            async_modifier_tokens: &["async"],
            static_modifier_tokens: &["static"],
            public_modifier_tokens: &[],
            private_modifier_tokens: &["#"],
            line_comment_prefixes: &["//"],
            block_comment_delims: Some(("/*", "*/")),
            comment_types: &["comment"],
            default_visibility_public: true,
        },
        Language::TypeScript | Language::Tsx => LanguageRules {
            language: language.clone(),
            class_types: &["class_declaration", "class"],
            struct_types: &[],
            enum_types: &["enum_declaration"],
            interface_types: &["interface_declaration"],
            trait_types: &[],
            function_types: &[
                "function_declaration",
                "function",
                "method_definition",
                "method_signature",
                "arrow_function",
            ],
            import_types: &["import_statement"],
            call_types: &["call_expression"],
            impl_types: &[],
            always_method_types: &["method_definition", "method_signature"],
            name_field: "name",
            body_field: "body",
            params_field: Some("parameters"),
            return_type_field: Some("return_type"),
            async_modifier_tokens: &["async"],
            static_modifier_tokens: &["static"],
            public_modifier_tokens: &["public"],
            private_modifier_tokens: &["private", "#"],
            line_comment_prefixes: &["//"],
            block_comment_delims: Some(("/*", "*/")),
            comment_types: &["comment"],
            default_visibility_public: true,
        },
        Language::Java => LanguageRules {
            language: Language::Java,
            class_types: &["class_declaration"],
            struct_types: &[],
            enum_types: &["enum_declaration"],
            interface_types: &["interface_declaration"],
            trait_types: &[],
            function_types: &["method_declaration", "constructor_declaration"],
            import_types: &["import_declaration"],
            call_types: &["method_invocation"],
            impl_types: &[],
            always_method_types: &["method_declaration", "constructor_declaration"],
            name_field: "name",
            body_field: "body",
            params_field: Some("parameters"),
            return_type_field: Some("type"),
            async_modifier_tokens: &[],
            static_modifier_tokens: &["static"],
            public_modifier_tokens: &["public"],
            private_modifier_tokens: &["private"],
            line_comment_prefixes: &["//"],
            block_comment_delims: Some(("/*", "*/")),
            comment_types: &["line_comment", "block_comment"],
            default_visibility_public: false,
        },
        Language::C => LanguageRules {
            language: Language::C,
            class_types: &[],
            struct_types: &["struct_specifier"],
            enum_types: &["enum_specifier"],
            interface_types: &[],
            trait_types: &[],
            function_types: &["function_definition"],
            import_types: &["preproc_include"],
            call_types: &["call_expression"],
            impl_types: &[],
            always_method_types: &[],
            name_field: "declarator",
            body_field: "body",
            params_field: None,
            return_type_field: Some("type"),
            async_modifier_tokens: &[],
            static_modifier_tokens: &["static"],
            public_modifier_tokens: &[],
            private_modifier_tokens: &["static"],
            line_comment_prefixes: &["//"],
            block_comment_delims: Some(("/*", "*/")),
            comment_types: &["comment"],
            default_visibility_public: true,
        },
        Language::Cpp => LanguageRules {
            language: Language::Cpp,
            class_types: &["class_specifier"],
            struct_types: &["struct_specifier"],
            enum_types: &["enum_specifier"],
            interface_types: &[],
            trait_types: &[],
            function_types: &["function_definition"],
            import_types: &["preproc_include"],
            call_types: &["call_expression"],
            impl_types: &[],
            always_method_types: &[],
            name_field: "declarator",
            body_field: "body",
            params_field: None,
            return_type_field: Some("type"),
            async_modifier_tokens: &[],
            static_modifier_tokens: &["static"],
            public_modifier_tokens: &["public"],
            private_modifier_tokens: &["private"],
            line_comment_prefixes: &["//"],
            block_comment_delims: Some(("/*", "*/")),
            comment_types: &["comment"],
            default_visibility_public: true,
        },
    }
}

impl LanguageRules {
    pub fn node_kind_for(&self, ts_kind: &str) -> Option<NodeKind> {
        if self.struct_types.contains(&ts_kind) {
            return Some(NodeKind::Struct);
        }
        if self.enum_types.contains(&ts_kind) {
            return Some(NodeKind::Enum);
        }
        if self.trait_types.contains(&ts_kind) {
            return Some(NodeKind::Trait);
        }
        if self.interface_types.contains(&ts_kind) {
            return Some(NodeKind::Interface);
        }
        if self.class_types.contains(&ts_kind) {
            return Some(NodeKind::Class);
        }
        None
    }

    pub fn is_function_like(&self, ts_kind: &str) -> bool {
        self.function_types.contains(&ts_kind)
    }

    pub fn is_impl(&self, ts_kind: &str) -> bool {
        self.impl_types.contains(&ts_kind)
    }

    pub fn is_always_method(&self, ts_kind: &str) -> bool {
        self.always_method_types.contains(&ts_kind)
    }

    pub fn is_import(&self, ts_kind: &str) -> bool {
        self.import_types.contains(&ts_kind)
    }

    pub fn is_call(&self, ts_kind: &str) -> bool {
        self.call_types.contains(&ts_kind)
    }

    pub fn is_comment(&self, ts_kind: &str) -> bool {
        self.comment_types.contains(&ts_kind)
    }
}
