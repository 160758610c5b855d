//! Error taxonomy shared by the generic engine and its specializations.

use thiserror::Error;

/// Errors raised while driving an invocation through the lifecycle.
///
/// Configuration errors indicate a setup defect and are never shaped into a
/// response. Every other kind is routed through error shaping so the caller
/// receives a structured rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// The handler was wired incorrectly (missing route, missing executor).
    #[error("{0}")]
    Configuration(String),

    /// The protection scanner found a disallowed pattern.
    #[error("{0}")]
    Detection(String),

    /// The request body could not be decoded.
    #[error("{0}")]
    Decoding(String),

    /// Schema validation failed.
    #[error("{message}")]
    Validation {
        /// Human-readable summary.
        message: String,
        /// Offending fields, in the order they were checked.
        fields: Vec<String>,
    },

    /// Identity validation rejected the credentials.
    #[error("{0}")]
    Authentication(String),

    /// Failure raised by user business logic or hooks.
    #[error("{message}")]
    Business {
        /// HTTP status to report.
        status: u16,
        /// Error type name reported in the response body.
        kind: String,
        /// Error message.
        message: String,
    },

    /// Building the response envelope failed.
    #[error("{0}")]
    Shaping(String),
}

impl LifecycleError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a detection error.
    pub fn detection(message: impl Into<String>) -> Self {
        Self::Detection(message.into())
    }

    /// Create a decoding error.
    pub fn decoding(message: impl Into<String>) -> Self {
        Self::Decoding(message.into())
    }

    /// Create a validation error naming the offending fields.
    pub fn validation(message: impl Into<String>, fields: Vec<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields,
        }
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    /// Create a generic business error (500).
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_status(500, message)
    }

    /// Create a business error with a specific status.
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self::Business {
            status,
            kind: "Error".to_string(),
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(404, message)
    }

    /// Create a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(400, message)
    }

    /// Replace the type name reported for a business error.
    pub fn named(self, name: impl Into<String>) -> Self {
        match self {
            Self::Business {
                status, message, ..
            } => Self::Business {
                status,
                kind: name.into(),
                message,
            },
            other => other,
        }
    }

    /// Whether this error indicates a setup defect.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// HTTP status used when this error is shaped into a response.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Configuration(_) | Self::Shaping(_) => 500,
            Self::Detection(_) => 400,
            Self::Decoding(_) | Self::Validation { .. } => 422,
            Self::Authentication(_) => 403,
            Self::Business { status, .. } => *status,
        }
    }

    /// Type name reported in shaped error bodies.
    pub fn kind(&self) -> &str {
        match self {
            Self::Configuration(_) => "ConfigurationError",
            Self::Detection(_) => "DetectionError",
            Self::Decoding(_) | Self::Validation { .. } => "ValidationError",
            Self::Authentication(_) => "AuthenticationFailureError",
            Self::Business { kind, .. } => kind,
            Self::Shaping(_) => "ShapingError",
        }
    }

    /// Offending fields for validation errors, empty otherwise.
    pub fn fields(&self) -> &[String] {
        match self {
            Self::Validation { fields, .. } => fields,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(LifecycleError::configuration("x").status_code(), 500);
        assert_eq!(LifecycleError::detection("x").status_code(), 400);
        assert_eq!(LifecycleError::decoding("x").status_code(), 422);
        assert_eq!(LifecycleError::authentication("x").status_code(), 403);
        assert_eq!(LifecycleError::not_found("x").status_code(), 404);
    }

    #[test]
    fn test_named_business_error() {
        let err = LifecycleError::bad_request("bad id").named("InputError");
        assert_eq!(err.kind(), "InputError");
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "bad id");
    }

    #[test]
    fn test_named_leaves_other_kinds() {
        let err = LifecycleError::detection("sql").named("Other");
        assert_eq!(err.kind(), "DetectionError");
    }

    #[test]
    fn test_validation_fields() {
        let err = LifecycleError::validation("missing", vec!["body.id".into()]);
        assert_eq!(err.fields(), ["body.id".to_string()]);
        assert!(LifecycleError::new("x").fields().is_empty());
    }
}
