//! Structured, deterministically-ordered diagnostics for the indexing pipeline.
//!
//! Per-file problems accumulate as `Diagnostic` values instead of going
//! straight to a log sink, so `--output json` and human stderr output stay
//! reproducible across runs: both are built by sorting the same collection.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Reason why a file was skipped during indexing.
///
/// The order of variants reflects precedence when a file could be skipped
/// for more than one reason: internal ignores win, then gitignore, then
/// explicit excludes, then unsupported-language detection, then anything
/// else about the path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Path is not a regular file (directory, symlink, etc.)
    NotAFile,
    /// Detected language has no available extractor
    UnsupportedLanguage,
    /// Internal hard-coded ignore rule (db files, .git/, target/, etc.)
    IgnoredInternal,
    /// Matched by a gitignore-style rule
    IgnoredByGitignore,
    /// Excluded by a configured exclude glob
    ExcludedByGlob,
    /// File exceeds the configured max_file_size
    TooLarge,
}

impl SkipReason {
    /// Stable sort key for deterministic ordering. Lower sorts first.
    pub fn sort_key(&self) -> u8 {
        match self {
            SkipReason::IgnoredInternal => 0,
            SkipReason::IgnoredByGitignore => 1,
            SkipReason::ExcludedByGlob => 2,
            SkipReason::TooLarge => 3,
            SkipReason::UnsupportedLanguage => 4,
            SkipReason::NotAFile => 5,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SkipReason::NotAFile => "not a regular file",
            SkipReason::UnsupportedLanguage => "language not supported",
            SkipReason::IgnoredInternal => "internal ignore rule",
            SkipReason::IgnoredByGitignore => "matched by gitignore",
            SkipReason::ExcludedByGlob => "excluded by pattern",
            SkipReason::TooLarge => "exceeds max_file_size",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl PartialOrd for SkipReason {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SkipReason {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// Stage in the indexing pipeline where an error occurred.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DiagnosticStage {
    /// Failed to read file from filesystem
    Read,
    /// Failed to parse source code
    Parse,
    /// Failed to extract nodes/edges from the parse tree
    Extract,
    /// Failed to write the extracted facts to the store
    Store,
    /// Other error not categorized above
    Other,
}

impl DiagnosticStage {
    pub fn sort_key(&self) -> u8 {
        match self {
            DiagnosticStage::Read => 0,
            DiagnosticStage::Parse => 1,
            DiagnosticStage::Extract => 2,
            DiagnosticStage::Store => 3,
            DiagnosticStage::Other => 4,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DiagnosticStage::Read => "reading file",
            DiagnosticStage::Parse => "parsing source",
            DiagnosticStage::Extract => "extracting nodes and edges",
            DiagnosticStage::Store => "writing to the graph store",
            DiagnosticStage::Other => "processing",
        }
    }
}

impl fmt::Display for DiagnosticStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl PartialOrd for DiagnosticStage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DiagnosticStage {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// A diagnostic event from the indexing pipeline: either a skipped file or a
/// per-file processing error. Neither aborts the run; both are collected and
/// sorted for reproducible reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Diagnostic {
    /// File was skipped during scanning or indexing
    Skipped {
        /// Path relative to the project root
        path: String,
        reason: SkipReason,
    },
    /// Error occurred while processing a file
    Error {
        /// Path relative to the project root
        path: String,
        stage: DiagnosticStage,
        message: String,
    },
}

impl Diagnostic {
    pub fn path(&self) -> &str {
        match self {
            Diagnostic::Skipped { path, .. } => path,
            Diagnostic::Error { path, .. } => path,
        }
    }

    /// Stable sort key: path first, then errors before skips, then the
    /// stage/reason's own precedence.
    pub fn sort_key(&self) -> (&str, u8, u8) {
        match self {
            Diagnostic::Error { path, stage, .. } => (path, 0, stage.sort_key()),
            Diagnostic::Skipped { path, reason } => (path, 1, reason.sort_key()),
        }
    }

    pub fn skipped(path: String, reason: SkipReason) -> Self {
        Diagnostic::Skipped { path, reason }
    }

    pub fn error(path: String, stage: DiagnosticStage, message: String) -> Self {
        Diagnostic::Error { path, stage, message }
    }

    /// Format for human-readable stderr output.
    ///
    /// Examples:
    /// - "SKIP src/ignored.rs: internal ignore rule"
    /// - "ERROR src/bad.rs: parsing source: syntax error at line 5"
    pub fn format_stderr(&self) -> String {
        match self {
            Diagnostic::Skipped { path, reason } => format!("SKIP {}: {}", path, reason),
            Diagnostic::Error { path, stage, message } => {
                format!("ERROR {}: {}: {}", path, stage, message)
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_stderr())
    }
}

impl PartialOrd for Diagnostic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Diagnostic {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}
