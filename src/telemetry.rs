use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;

/// Initialize structured logging.
///
/// `RUST_LOG` wins over the configured level when set. JSON output carries the
/// current span and span list so operation correlation ids end up on every line.
pub fn init_telemetry(settings: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.json_logs {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .with(filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .with(filter)
            .try_init()?;
    }

    tracing::info!(json = settings.json_logs, "Stagehand telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking the log lines of one remote operation
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span wrapping everything a background operation logs
pub fn create_operation_span(
    operation: &str,
    agent_id: &str,
    operation_id: &str,
    correlation_id: &str,
) -> tracing::Span {
    tracing::info_span!(
        "agent_operation",
        operation = operation,
        agent.id = agent_id,
        operation.id = operation_id,
        correlation.id = correlation_id,
    )
}

/// Span for one console-side session action
pub fn create_session_span(action: &str, environment: Option<&str>, user: &str) -> tracing::Span {
    tracing::info_span!(
        "session_action",
        action = action,
        environment = environment,
        user = user,
    )
}

pub fn shutdown_telemetry() {
    tracing::info!("Stagehand telemetry shutdown complete");
}
