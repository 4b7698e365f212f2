//! Recogate error types

use std::time::Duration;

/// Recogate error types
///
/// `Clone` so that a single outcome can be handed to every caller joined on
/// a collapsed fetch (see [`RequestCollapser`](crate::collapse::RequestCollapser)).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    // Upstream/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// The upstream answered with (or embedded) a failure status.
    #[error("upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("rate limited by upstream, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    // Request errors
    /// One or more category labels have no upstream identifier.
    #[error("unknown {domain} label(s): {}", labels.join(", "))]
    Resolution { domain: String, labels: Vec<String> },

    #[error("invalid request: {0}")]
    Validation(String),

    // Infrastructure errors
    #[error("store error: {0}")]
    Store(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl GatewayError {
    /// HTTP status a front end should answer with for this error.
    ///
    /// Upstream failures keep the upstream's own status code.
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::Upstream { status, .. } => *status,
            GatewayError::RateLimited { .. } => 429,
            GatewayError::Resolution { .. } | GatewayError::Validation(_) => 422,
            GatewayError::Http(_) => 502,
            GatewayError::Store(_) | GatewayError::Json(_) | GatewayError::Configuration(_) => 500,
        }
    }

    /// Whether the error is the caller's fault (4xx range).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Json(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for GatewayError {
    fn from(err: redis::RedisError) -> Self {
        GatewayError::Store(err.to_string())
    }
}

/// Result type alias for Recogate operations
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_is_preserved() {
        let err = GatewayError::Upstream {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(err.status_code(), 500);
        assert!(!err.is_client_error());
    }

    #[test]
    fn resolution_error_names_labels() {
        let err = GatewayError::Resolution {
            domain: "genres:anime".into(),
            labels: vec!["space opera".into(), "isekaii".into()],
        };
        assert!(err.is_client_error());
        assert_eq!(
            err.to_string(),
            "unknown genres:anime label(s): space opera, isekaii"
        );
    }

    #[test]
    fn rate_limited_maps_to_429() {
        let err = GatewayError::RateLimited { retry_after: None };
        assert_eq!(err.status_code(), 429);
    }
}
