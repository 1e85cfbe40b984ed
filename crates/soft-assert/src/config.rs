//! Accumulator configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::result::{SoftAssertError, SoftAssertResult};

/// Default bound on awaiting the document or the visibility probe (5 seconds)
pub const DEFAULT_DOCUMENT_TIMEOUT_MS: u64 = 5000;

/// Settings for a [`SoftAssert`](crate::SoftAssert) accumulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftAssertConfig {
    /// Upper bound for each await on a collaborator, in milliseconds.
    /// Only enforced when the checks run inside a tokio runtime
    pub document_timeout_ms: u64,
    /// Emit a warning event for every recorded soft failure
    pub log_failures: bool,
}

impl Default for SoftAssertConfig {
    fn default() -> Self {
        Self {
            document_timeout_ms: DEFAULT_DOCUMENT_TIMEOUT_MS,
            log_failures: true,
        }
    }
}

impl SoftAssertConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the collaborator timeout
    #[must_use]
    pub const fn with_document_timeout_ms(mut self, ms: u64) -> Self {
        self.document_timeout_ms = ms;
        self
    }

    /// Enable or disable per-failure warnings
    #[must_use]
    pub const fn with_log_failures(mut self, enabled: bool) -> Self {
        self.log_failures = enabled;
        self
    }

    /// Collaborator timeout as a duration
    #[must_use]
    pub const fn document_timeout(&self) -> Duration {
        Duration::from_millis(self.document_timeout_ms)
    }

    /// Parse from YAML; missing keys keep their defaults
    ///
    /// # Errors
    ///
    /// Returns error if the YAML is malformed or the timeout is zero
    pub fn from_yaml_str(yaml: &str) -> SoftAssertResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml).map_err(|e| SoftAssertError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn from_yaml_file(path: impl AsRef<Path>) -> SoftAssertResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Check the values are usable
    ///
    /// # Errors
    ///
    /// Returns error if the timeout is zero
    pub fn validate(&self) -> SoftAssertResult<()> {
        if self.document_timeout_ms == 0 {
            return Err(SoftAssertError::Config {
                message: "document_timeout_ms must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SoftAssertConfig::default();
        assert_eq!(config.document_timeout_ms, 5000);
        assert!(config.log_failures);
        assert_eq!(config.document_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_builder() {
        let config = SoftAssertConfig::new()
            .with_document_timeout_ms(250)
            .with_log_failures(false);
        assert_eq!(config.document_timeout_ms, 250);
        assert!(!config.log_failures);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = SoftAssertConfig::from_yaml_str("document_timeout_ms: 1500\n").unwrap();
        assert_eq!(config.document_timeout_ms, 1500);
        assert!(config.log_failures);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = SoftAssertConfig::from_yaml_str("document_timeout_ms: 0\n").unwrap_err();
        assert!(matches!(err, SoftAssertError::Config { .. }));
    }

    #[test]
    fn test_malformed_yaml_rejected() {
        let err = SoftAssertConfig::from_yaml_str("log_failures: [").unwrap_err();
        assert!(matches!(err, SoftAssertError::Config { .. }));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_failures: false").unwrap();
        let config = SoftAssertConfig::from_yaml_file(file.path()).unwrap();
        assert!(!config.log_failures);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SoftAssertConfig::from_yaml_file("/nonexistent/soft-assert.yaml").unwrap_err();
        assert!(matches!(err, SoftAssertError::Io(_)));
    }
}
