//! Request Executor Error Types
//!
//! Failures of calls against the remote notes service. Errors are `Clone`
//! because a cache entry keeps the error its last load finished with.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Transport failure or non-success HTTP status (transient)
    #[error("Network error{}: {message}", status_suffix(.status))]
    Network {
        status: Option<u16>,
        message: String,
    },

    /// Credential rejected by the service (HTTP 401), fatal for the session
    #[error("Unauthorized: credential rejected by the notes service")]
    Auth,

    /// Note not found by ID
    #[error("Note not found: {id}")]
    NotFound { id: String },

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Client could not be built from its configuration
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" [{}]", s)).unwrap_or_default()
}

impl ApiError {
    pub fn network(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Network {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth)
    }

    /// HTTP status attached to the failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Network { status, .. } => *status,
            ApiError::Auth => Some(401),
            ApiError::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            ApiError::Decode(error.to_string())
        } else {
            ApiError::network(error.status().map(|s| s.as_u16()), error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_status() {
        let err = ApiError::network(Some(503), "Service Unavailable");
        assert_eq!(err.to_string(), "Network error [503]: Service Unavailable");

        let err = ApiError::network(None, "connection refused");
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::Auth.status(), Some(401));
        assert_eq!(ApiError::not_found("n1").status(), Some(404));
        assert_eq!(ApiError::Decode("bad".into()).status(), None);
        assert!(ApiError::Auth.is_auth());
        assert!(!ApiError::network(Some(500), "boom").is_auth());
    }
}
