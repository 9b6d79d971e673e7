//! Shared tracing initialization for the three pipeline binaries.
//!
//! Reads `RUST_LOG` (level filter) and `LOG_FILE` (path) from the process
//! environment. When `LOG_FILE` is set, logs are appended to that file as
//! plain text; otherwise they are dropped. None of these binaries print
//! logs to stdout/stderr by default — the Hook's stdout is reserved for its
//! exit-code contract, and the Orchestrator's captured stdout/stderr belong
//! to the headless CLI subprocess, not this process's own logging.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Initializes the global tracing subscriber. Call once, at the top of
/// `main`. Safe to call with `LOG_FILE` unset — logs are simply dropped.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Ok(path) = std::env::var("LOG_FILE") {
        let file = std::fs::OpenOptions::new().create(true).append(true).open(&path)?;
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_filter(filter);
        tracing_subscriber::registry().with(layer).init();
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::sink)
            .with_filter(filter);
        tracing_subscriber::registry().with(layer).init();
    }
    Ok(())
}
