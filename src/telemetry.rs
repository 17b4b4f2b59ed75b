//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! LOG_LEVEL takes a tracing filter, either a bare level ("debug") or full
//! directives ("info,challenge=debug,prepdeck_backend=debug"). LOG_FORMAT
//! switches between human-readable output (default) and "json" for log
//! shippers. Targets, file and line are always included so the challenge
//! logs are easy to tell apart from the HTTP trace layer's spans.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,challenge=debug,prepdeck_backend=debug,tower_http=info,axum=info";

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // The json/pretty builders are different types, so init inside the match
    // instead of trying to store one of them.
    if matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}
