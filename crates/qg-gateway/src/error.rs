//! Gateway error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Bad status code {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("Venue reported failure: {0}")]
    Unsuccessful(String),

    #[error("Response decode error: {0}")]
    Decode(String),

    #[error("Request encode error: {0}")]
    Encode(String),

    #[error("Egress route {route} could not be re-established: {reason}")]
    Egress { route: String, reason: String },

    #[error("Deadline of {deadline_ms}ms exceeded")]
    DeadlineExceeded { deadline_ms: u64 },

    #[error("Requested {requested} rows but the venue returned only {available}")]
    OutOfRange { requested: usize, available: usize },

    #[error("No credentials configured for signed request")]
    NoCredentials,

    #[error("Invalid gateway configuration: {0}")]
    Config(String),
}

impl GatewayError {
    /// Errors the backoff loop retries.
    ///
    /// Transport failures, non-2xx statuses, venue failure flags and
    /// undecodable bodies can change on the next attempt; everything else is
    /// local and deterministic.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::BadStatus { .. } | Self::Unsuccessful(_) | Self::Decode(_)
        )
    }

    /// Short label for metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::BadStatus { .. } => "status",
            Self::Unsuccessful(_) => "unsuccessful",
            Self::Decode(_) => "decode",
            Self::Encode(_) => "encode",
            Self::Egress { .. } => "egress",
            Self::DeadlineExceeded { .. } => "deadline",
            Self::OutOfRange { .. } => "out_of_range",
            Self::NoCredentials => "no_credentials",
            Self::Config(_) => "config",
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
