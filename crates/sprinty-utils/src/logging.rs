// Logging utilities

/// Initialize the process-wide `tracing` subscriber. `level` is an
/// `EnvFilter` directive (e.g. `"info"`, `"sprinty=debug"`); callers usually
/// pass `RUST_LOG` when set, falling back to a sane default.
pub fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .init();
}

/// Same as `init_logging`, but emits newline-delimited JSON records instead
/// of the human-readable formatter. Used when Sprinty itself is run inside a
/// container and its own logs are being scraped by a supervising process.
pub fn init_json_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .json()
        .init();
}
