//! Logging utilities.
//!
//! Thin helpers over `tracing` so library consumers get structured,
//! searchable logs for the blocking server round trips without configuring
//! a subscriber themselves.

use std::time::Instant;
use tracing::{debug, info};

/// Initialize the tracing subscriber with the given default log level.
/// `RUST_LOG` takes precedence when set.
pub fn init_tracing(log_level: &str) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(val) => val,
        Err(_) => log_level.to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Run `f`, logging the operation name and wall-clock duration. Every
/// remote round trip in this crate is blocking, so durations here are a
/// direct read on server latency.
pub fn log_timed_operation<F, R>(operation: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    let start = Instant::now();
    debug!(operation = operation, "Starting operation");

    let result = f();

    info!(
        operation = operation,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Operation completed"
    );

    result
}
