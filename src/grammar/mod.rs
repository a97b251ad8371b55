//! Grammar Registry: extension-to-language detection and cached parser
//! loading, with graceful degradation when a grammar is unavailable.

use std::sync::{Mutex, OnceLock};

use tree_sitter::Parser;

/// A supported source language. `Unknown` carries the raw extension so
/// callers can still report what was seen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Java,
    C,
    Cpp,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }

    fn ts_language(&self) -> tree_sitter::Language {
        match self {
            Language::Rust => tree_sitter_rust::language(),
            Language::Python => tree_sitter_python::language(),
            Language::JavaScript => tree_sitter_javascript::language(),
            Language::TypeScript => tree_sitter_typescript::language_typescript(),
            Language::Tsx => tree_sitter_typescript::language_tsx(),
            Language::Java => tree_sitter_java::language(),
            Language::C => tree_sitter_c::language(),
            Language::Cpp => tree_sitter_cpp::language(),
        }
    }
}

/// Detect a language from a file path's extension. Pure function, no I/O.
pub fn detect_language(path: &std::path::Path) -> Option<Language> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "rs" => Language::Rust,
        "py" | "pyi" => Language::Python,
        "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
        "ts" | "mts" | "cts" => Language::TypeScript,
        "tsx" => Language::Tsx,
        "java" => Language::Java,
        "c" | "h" => Language::C,
        "cc" | "cpp" | "cxx" | "hpp" | "hh" | "hxx" => Language::Cpp,
        _ => return None,
    })
}

/// One slot per language: `None` until first attempted, then `Some(true)` or
/// `Some(false)` recording whether the grammar initialized successfully.
struct ParserCache {
    slots: Mutex<std::collections::HashMap<&'static str, Option<()>>>,
}

static CACHE: OnceLock<ParserCache> = OnceLock::new();

fn cache() -> &'static ParserCache {
    CACHE.get_or_init(|| ParserCache { slots: Mutex::new(std::collections::HashMap::new()) })
}

/// Registry over languages and their tree-sitter parsers.
///
/// A grammar that fails to initialize is recorded once; subsequent lookups
/// return `None` without retrying the failing call.
pub struct GrammarRegistry;

impl GrammarRegistry {
    pub fn new() -> Self {
        GrammarRegistry
    }

    /// True if `language` has a working tree-sitter grammar, attempting
    /// initialization at most once per process.
    pub fn is_supported(&self, language: &Language) -> bool {
        self.get_parser(language).is_some()
    }

    /// Build a fresh `tree_sitter::Parser` for `language`, or `None` if the
    /// grammar is unavailable on this host. Cheap enough to call per file:
    /// `tree_sitter::Language` handles are `Copy` and setting them on a new
    /// `Parser` does no real work beyond the first successful load.
    pub fn get_parser(&self, language: &Language) -> Option<Parser> {
        let key = language.as_str();
        {
            let slots = cache().slots.lock().unwrap();
            if let Some(result) = slots.get(key) {
                return result.map(|_| build_parser(language)).flatten();
            }
        }

        let parser = build_parser(language);
        let mut slots = cache().slots.lock().unwrap();
        slots.insert(key, parser.as_ref().map(|_| ()));
        parser
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn build_parser(language: &Language) -> Option<Parser> {
    let mut parser = Parser::new();
    parser.set_language(&language.ts_language()).ok()?;
    Some(parser)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn detects_common_extensions() {
        assert_eq!(detect_language(Path::new("src/main.rs")), Some(Language::Rust));
        assert_eq!(detect_language(Path::new("a/b.py")), Some(Language::Python));
        assert_eq!(detect_language(Path::new("a/b.tsx")), Some(Language::Tsx));
        assert_eq!(detect_language(Path::new("a/b.unknownext")), None);
    }

    #[test]
    fn registry_loads_rust_parser() {
        let registry = GrammarRegistry::new();
        assert!(registry.is_supported(&Language::Rust));
        assert!(registry.get_parser(&Language::Rust).is_some());
    }

    #[test]
    fn registry_caches_after_first_attempt() {
        let registry = GrammarRegistry::new();
        assert!(registry.get_parser(&Language::Python).is_some());
        // second call hits the recorded "available" slot, not a retry path
        assert!(registry.get_parser(&Language::Python).is_some());
    }
}
