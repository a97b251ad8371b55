//! Stable error codes presented at CLI/JSON-RPC boundaries.
//!
//! Error codes follow the pattern: CG-{CATEGORY}-{3-digit number}
//!
//! Categories (1-3 uppercase letters):
//! - REF: reference/lookup errors (symbol not found, ambiguous symbol)
//! - QRY: query errors (invalid query, file not found in graph)
//! - IO: filesystem errors
//! - DB: database/store errors
//! - V: validation/consistency errors
//! - CFG: configuration errors
//!
//! Each error code is stable and is never reused or renumbered once shipped.

/// Symbol not found in the graph
pub const CG_REF_001_SYMBOL_NOT_FOUND: &str = "CG-REF-001";

/// Ambiguous symbol (multiple matches for a name)
pub const CG_REF_002_AMBIGUOUS_SYMBOL: &str = "CG-REF-002";

/// Invalid span (start > end, out of file bounds)
pub const CG_REF_003_INVALID_SPAN: &str = "CG-REF-003";

/// Invalid query syntax
pub const CG_QRY_001_INVALID_QUERY: &str = "CG-QRY-001";

/// File not found in the indexed graph
pub const CG_QRY_002_FILE_NOT_FOUND: &str = "CG-QRY-002";

/// Invalid query parameters
pub const CG_QRY_003_INVALID_PARAMS: &str = "CG-QRY-003";

/// File not found on the filesystem
pub const CG_IO_001_FILE_NOT_FOUND: &str = "CG-IO-001";

/// Permission denied
pub const CG_IO_002_PERMISSION_DENIED: &str = "CG-IO-002";

/// Invalid or unsafe file path
pub const CG_IO_003_INVALID_PATH: &str = "CG-IO-003";

/// Database file exists but is not a valid graph store, or another writer
/// already holds the lock
pub const CG_DB_001_INCOMPATIBLE_DATABASE: &str = "CG-DB-001";

/// A database operation failed
pub const CG_DB_002_OPERATION_FAILED: &str = "CG-DB-002";

/// The write lock is held by another live process
pub const CG_DB_003_LOCK_HELD: &str = "CG-DB-003";

/// Checksum mismatch between stored and on-disk content
pub const CG_V_001_CHECKSUM_MISMATCH: &str = "CG-V-001";

/// Span validation failed
pub const CG_V_002_SPAN_INVALID: &str = "CG-V-002";

/// Database corruption detected
pub const CG_V_003_DB_CORRUPTION: &str = "CG-V-003";

/// Configuration structure or values are invalid
pub const CG_CFG_001_INVALID_CONFIG: &str = "CG-CFG-001";

/// Error code documentation.
///
/// # Reference Errors (CG-REF-*)
///
/// | Code | Description | Remediation |
/// |------|-------------|-------------|
/// | CG-REF-001 | Symbol not found | Verify the name or id; use `codegraph query search` |
/// | CG-REF-002 | Ambiguous symbol | Use the fully-qualified name or a node id |
/// | CG-REF-003 | Invalid span | Check line offsets are within file bounds and start <= end |
///
/// # Query Errors (CG-QRY-*)
///
/// | Code | Description | Remediation |
/// |------|-------------|-------------|
/// | CG-QRY-001 | Invalid query syntax | Check argument format; see command help |
/// | CG-QRY-002 | File not found in graph | Run `codegraph index` or `codegraph sync` |
/// | CG-QRY-003 | Invalid parameters | Check required arguments for the command |
///
/// # I/O Errors (CG-IO-*)
///
/// | Code | Description | Remediation |
/// |------|-------------|-------------|
/// | CG-IO-001 | File not found on filesystem | Check the path and that the file exists |
/// | CG-IO-002 | Permission denied | Check file/directory read permissions |
/// | CG-IO-003 | Invalid path | Path escapes the project root or cannot be resolved |
///
/// # Database Errors (CG-DB-*)
///
/// | Code | Description | Remediation |
/// |------|-------------|-------------|
/// | CG-DB-001 | Incompatible database file | Remove the stale database or point at the right project |
/// | CG-DB-002 | Operation failed | Re-run; if persistent, re-index from scratch |
/// | CG-DB-003 | Lock held by another process | Wait for the other process to exit, or remove a stale lock |
///
/// # Validation Errors (CG-V-*)
///
/// | Code | Description | Remediation |
/// |------|-------------|-------------|
/// | CG-V-001 | Checksum mismatch | Re-index the file; data may be stale |
/// | CG-V-002 | Span validation failed | Re-index; the file may have changed since indexing |
/// | CG-V-003 | Database corruption | Re-build the database from source |
///
/// # Configuration Errors (CG-CFG-*)
///
/// | Code | Description | Remediation |
/// |------|-------------|-------------|
/// | CG-CFG-001 | Invalid configuration | Check field names/types against the documented schema |
pub const ERROR_CODE_DOCUMENTATION: &str = "Error code documentation available in source";

#[cfg(test)]
mod tests {
    use super::*;

    fn all_codes() -> Vec<&'static str> {
        vec![
            CG_REF_001_SYMBOL_NOT_FOUND,
            CG_REF_002_AMBIGUOUS_SYMBOL,
            CG_REF_003_INVALID_SPAN,
            CG_QRY_001_INVALID_QUERY,
            CG_QRY_002_FILE_NOT_FOUND,
            CG_QRY_003_INVALID_PARAMS,
            CG_IO_001_FILE_NOT_FOUND,
            CG_IO_002_PERMISSION_DENIED,
            CG_IO_003_INVALID_PATH,
            CG_DB_001_INCOMPATIBLE_DATABASE,
            CG_DB_002_OPERATION_FAILED,
            CG_DB_003_LOCK_HELD,
            CG_V_001_CHECKSUM_MISMATCH,
            CG_V_002_SPAN_INVALID,
            CG_V_003_DB_CORRUPTION,
            CG_CFG_001_INVALID_CONFIG,
        ]
    }

    #[test]
    fn test_error_codes_are_unique() {
        let mut unique = std::collections::HashSet::new();
        for code in all_codes() {
            assert!(unique.insert(code), "Duplicate error code detected: {}", code);
        }
    }

    #[test]
    fn test_error_code_format() {
        for code in all_codes() {
            assert!(code.starts_with("CG-"), "Error code must start with 'CG-': {}", code);
            let parts: Vec<&str> = code.split('-').collect();
            assert_eq!(parts.len(), 3, "Error code must have 3 parts: {}", code);

            assert!(parts[1].len() >= 1 && parts[1].len() <= 3, "Category must be 1-3 chars: {}", code);
            assert!(parts[1].chars().all(|c| c.is_ascii_uppercase()));

            assert_eq!(parts[2].len(), 3, "Number must be 3 digits: {}", code);
            assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
        }
    }
}
