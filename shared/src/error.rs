//! Error types for the appointment webhook functions.

use thiserror::Error;

use crate::payload::PayloadError;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while ingesting an appointment webhook.
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// AWS SDK error
    #[error("AWS error: {0}")]
    Aws(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The inbound payload failed schema validation
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// The named service is not in the catalog
    #[error("Service '{0}' not found. Register the service first.")]
    ServiceNotFound(String),

    /// Store rejected an operation (non-SQL backends)
    #[error("Store error: {0}")]
    Store(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Payload(_) | Error::ServiceNotFound(_) => 400,
            _ => 500,
        }
    }

    /// Machine-checkable reason code placed next to the message in error bodies.
    pub fn reason(&self) -> &'static str {
        match self {
            Error::Payload(e) => e.reason(),
            Error::ServiceNotFound(_) => "service_not_found",
            _ => "internal_error",
        }
    }

    /// Short diagnostic safe to hand back to the caller.
    ///
    /// SQL errors can carry constraint names and query fragments, so they
    /// collapse to a fixed phrase; the full error only goes to the log.
    pub fn diagnostic(&self) -> String {
        match self {
            Error::Database(_) => "database operation failed".to_string(),
            Error::Aws(_) | Error::Config(_) => "service misconfigured".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_400() {
        let missing = Error::from(PayloadError::MissingFields(vec!["staff"]));
        assert_eq!(missing.status_code(), 400);
        assert_eq!(missing.reason(), "missing_required_fields");

        let unknown = Error::ServiceNotFound("Corte".to_string());
        assert_eq!(unknown.status_code(), 400);
        assert_eq!(unknown.reason(), "service_not_found");
        assert!(unknown.to_string().contains("'Corte'"));
    }

    #[test]
    fn test_database_diagnostic_hides_details() {
        let err = Error::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.reason(), "internal_error");
        assert_eq!(err.diagnostic(), "database operation failed");
    }
}
