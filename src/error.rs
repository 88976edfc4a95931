use std::time::Duration;
use thiserror::Error;

/// Main error type for cluster status operations
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Malformed JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected status page layout: {0}")]
    InvalidDocument(String),

    #[error("Status page {url} has no field '{field}'")]
    MissingField { url: String, field: String },

    #[error("Metric not found: {0}")]
    MetricNotFound(String),

    #[error("Metric '{name}' is not an integer: {value}")]
    MetricParse { name: String, value: String },

    #[error("Invalid poll settings: {0}")]
    InvalidPollSettings(String),

    #[error("Timed out after {elapsed:?} waiting for {what}")]
    Timeout { what: String, elapsed: Duration },

    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl ProbeError {
    /// True when the error means the cluster could not be reached or answered garbage,
    /// as opposed to a missing or unparseable value.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ProbeError::Http(_)
                | ProbeError::HttpStatus { .. }
                | ProbeError::Json(_)
                | ProbeError::InvalidDocument(_)
                | ProbeError::ConnectionError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProbeError::MetricNotFound("impala-server.num-sessions-expired".to_string());
        assert_eq!(
            err.to_string(),
            "Metric not found: impala-server.num-sessions-expired"
        );

        let err = ProbeError::HttpStatus {
            url: "http://localhost:25000/jsonmetrics?json".to_string(),
            status: 503,
        };
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_transport_classification() {
        assert!(ProbeError::ConnectionError("refused".to_string()).is_transport());
        assert!(ProbeError::HttpStatus {
            url: "x".to_string(),
            status: 500
        }
        .is_transport());
        assert!(ProbeError::InvalidDocument("array".to_string()).is_transport());
        assert!(!ProbeError::MetricNotFound("x".to_string()).is_transport());
        assert!(!ProbeError::Timeout {
            what: "x".to_string(),
            elapsed: Duration::from_secs(1)
        }
        .is_transport());
    }
}
