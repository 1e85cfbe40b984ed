//! Result and error types for soft assertions.

use thiserror::Error;

use crate::report::SoftAssertionError;

/// Result type for soft-assert operations
pub type SoftAssertResult<T> = Result<T, SoftAssertError>;

/// Errors that stop a check instead of being recorded as soft failures
#[derive(Debug, Error)]
pub enum SoftAssertError {
    /// Locator could not be evaluated (malformed XPath or CSS)
    #[error("Invalid locator `{locator}`: {message}")]
    InvalidLocator {
        /// Locator as written by the test
        locator: String,
        /// Evaluator message
        message: String,
    },

    /// The document root could not be obtained
    #[error("Document unavailable: {message}")]
    DocumentUnavailable {
        /// Error message
        message: String,
    },

    /// The visibility probe failed to evaluate
    #[error("Visibility evaluation failed: {message}")]
    VisibilityError {
        /// Error message
        message: String,
    },

    /// Page error (CDP transport)
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Awaiting the document or the probe took too long
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Configuration could not be loaded
    #[error("Invalid configuration: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Soft assertions failed at flush time
    #[error(transparent)]
    SoftAssertions(#[from] SoftAssertionError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SoftAssertError {
    /// Build an invalid-locator error
    #[must_use]
    pub fn invalid_locator(locator: &str, message: impl Into<String>) -> Self {
        Self::InvalidLocator {
            locator: locator.to_string(),
            message: message.into(),
        }
    }

    /// Whether this error came from evaluating the locator itself
    #[must_use]
    pub const fn is_resolution_error(&self) -> bool {
        matches!(self, Self::InvalidLocator { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_locator_display() {
        let err = SoftAssertError::invalid_locator("//div[", "unbalanced predicate");
        assert_eq!(
            err.to_string(),
            "Invalid locator `//div[`: unbalanced predicate"
        );
        assert!(err.is_resolution_error());
    }

    #[test]
    fn test_timeout_display() {
        let err = SoftAssertError::Timeout { ms: 250 };
        assert_eq!(err.to_string(), "Operation timed out after 250ms");
        assert!(!err.is_resolution_error());
    }

    #[test]
    fn test_soft_assertions_is_transparent() {
        let inner = SoftAssertionError::new(vec!["first".to_string()]);
        let expected = inner.to_string();
        let err = SoftAssertError::from(inner);
        assert_eq!(err.to_string(), expected);
    }
}
