use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a single weather request.
///
/// Carries rendered messages instead of the underlying `reqwest` errors so it
/// can travel inside an [`Action`](crate::action::Action).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FetchError {
    #[error("weather request rejected with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("weather request failed: {0}")]
    Network(String),
    #[error("malformed weather response: {0}")]
    Decode(String),
}

impl FetchError {
    /// True when the provider answered with a non-success status.
    pub fn is_rejection(&self) -> bool {
        matches!(self, FetchError::Status { .. })
    }
}

/// Geolocation errors
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service not supported")]
    Unsupported,
    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown units '{0}'. Supported units: metric, imperial.")]
pub struct UnitsParseError(pub String);
