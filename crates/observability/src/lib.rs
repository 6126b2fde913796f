//! Tracing/logging setup shared by every process that embeds the engine.

/// Initialize process-wide tracing with `default_filter` as the fallback
/// directive when `RUST_LOG` is unset or invalid.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(default_filter: &str) {
    tracing::init(default_filter);
}

/// Tracing configuration (filters, layers).
pub mod tracing;
