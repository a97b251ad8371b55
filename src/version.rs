//! Version and build information for codegraph.

/// Full version string including build metadata.
///
/// Format: "codegraph {version} ({commit} {date}) rustc {rustc_version}"
pub fn version() -> String {
    let version = env!("CARGO_PKG_VERSION");
    let commit = build_commit();
    let date = build_date();
    let rustc_version = rustc_version();

    format!("codegraph {} ({} {}) rustc {}", version, commit, date, rustc_version)
}

/// Package version (e.g., "0.1.0").
pub fn package_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Build commit SHA, or "unknown" if not built with commit info.
pub fn build_commit() -> &'static str {
    option_env!("CODEGRAPH_COMMIT_SHA").unwrap_or("unknown")
}

/// Build date, or "unknown" if not built with date info.
pub fn build_date() -> &'static str {
    option_env!("CODEGRAPH_BUILD_DATE").unwrap_or("unknown")
}

/// Rust compiler version used for the build, or "unknown".
pub fn rustc_version() -> &'static str {
    option_env!("CODEGRAPH_RUSTC_VERSION").unwrap_or("unknown")
}
