//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Domain crates keep their own precise error enums and convert into this
/// one at the boundary where callers only need a coarse classification.
#[derive(Debug, Error)]
pub enum AppError {
    /// Caller-correctable input problem.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation is not allowed in the document's current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Operation was already performed (e.g., document already posted).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Access denied.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Environment or configuration problem (e.g., missing fiscal period).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal invariant violation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the error code for callers that need a stable identifier.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Conflict(_) => "CONFLICT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the caller can fix the problem and try again.
    #[must_use]
    pub const fn is_caller_correctable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::InvalidState(_) | Self::Conflict(_) | Self::NotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::Validation(String::new()).error_code(), "VALIDATION_ERROR");
        assert_eq!(AppError::InvalidState(String::new()).error_code(), "INVALID_STATE");
        assert_eq!(AppError::Conflict(String::new()).error_code(), "CONFLICT");
        assert_eq!(AppError::NotFound(String::new()).error_code(), "NOT_FOUND");
        assert_eq!(AppError::Forbidden(String::new()).error_code(), "FORBIDDEN");
        assert_eq!(
            AppError::Configuration(String::new()).error_code(),
            "CONFIGURATION_ERROR"
        );
        assert_eq!(AppError::Database(String::new()).error_code(), "DATABASE_ERROR");
        assert_eq!(AppError::Internal(String::new()).error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_caller_correctable() {
        assert!(AppError::Validation(String::new()).is_caller_correctable());
        assert!(AppError::Conflict(String::new()).is_caller_correctable());
        assert!(!AppError::Configuration(String::new()).is_caller_correctable());
        assert!(!AppError::Internal(String::new()).is_caller_correctable());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::Validation("msg".into()).to_string(),
            "Validation error: msg"
        );
        assert_eq!(
            AppError::Conflict("msg".into()).to_string(),
            "Conflict: msg"
        );
        assert_eq!(
            AppError::Configuration("msg".into()).to_string(),
            "Configuration error: msg"
        );
    }
}
