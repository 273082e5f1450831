//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Core error: {0}")]
    Core(#[from] qg_core::CoreError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] qg_gateway::GatewayError),

    #[error("Venue error: {0}")]
    Venue(#[from] qg_venue::VenueError),

    #[error("Filter error: {0}")]
    Filter(#[from] qg_filter::FilterError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] qg_telemetry::TelemetryError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
