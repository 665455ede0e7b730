//! Logging service

use crate::models::LogLevel;
use tracing_subscriber::EnvFilter;

/// Initialize logging with the specified level.
///
/// `RUST_LOG`, when set, overrides `level`. Output goes to stderr so command
/// output on stdout stays clean.
pub fn init_logging(level: LogLevel) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.as_str();
        EnvFilter::new(format!(
            "pushcast={level},pushcast_core={level},pushcast_cli={level},warp=warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
}

/// Log the outcome of one multicast send
pub fn log_send(provider: &str, token_count: usize, success_count: usize, failure_count: usize) {
    tracing::info!(
        provider = provider,
        tokens = token_count,
        success = success_count,
        failure = failure_count,
        "Multicast sent"
    );
}

/// Log a template store operation
pub fn log_template_event(event_type: &str, name: &str) {
    tracing::info!(event_type = event_type, template = name, "Template event");
}

/// Log a system error
pub fn log_error(error: &str, context: Option<&str>) {
    tracing::error!(
        error = error,
        context = context.unwrap_or(""),
        "System error occurred"
    );
}
