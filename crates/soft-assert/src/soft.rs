//! Soft assertions over a live document.
//!
//! Checks resolve a locator, evaluate a condition and record a message when
//! the condition does not hold. They never fail the test themselves; `flush`
//! turns everything recorded into a single [`SoftAssertionError`].
//!
//! ## Example
//!
//! ```ignore
//! let mut soft = SoftAssert::new(page.clone(), page);
//! soft.on_test_start();
//! soft.check_exists("#login", "login form is rendered").await?;
//! soft.check_count(".item", 3, "three items listed").await?;
//! soft.check_visible("//div[@id='toast']", false, "toast is dismissed").await?;
//! soft.flush()?;
//! ```

use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, info, warn};

use crate::config::SoftAssertConfig;
use crate::dom::{DocumentProvider, ElementSet};
use crate::locator::Locator;
use crate::report::{format_message, SoftAssertionError, TestFailure};
use crate::resolver;
use crate::result::{SoftAssertError, SoftAssertResult};
use crate::visibility::{VisibilityMode, VisibilityProbe};

/// Summary of the checks run in the current test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionSummary {
    /// Checks evaluated
    pub total: usize,
    /// Checks that held
    pub passed: usize,
    /// Checks that recorded a failure
    pub failed: usize,
}

/// Soft assertion accumulator.
///
/// Owns the failure log for one test scope. `P` supplies the document each
/// check resolves against and `V` decides visibility.
#[derive(Debug)]
pub struct SoftAssert<P, V> {
    provider: P,
    probe: V,
    config: SoftAssertConfig,
    failures: Vec<String>,
    checks: usize,
}

impl<P, V> SoftAssert<P, V>
where
    P: DocumentProvider,
    V: VisibilityProbe,
{
    /// Create an accumulator with the default configuration
    #[must_use]
    pub fn new(provider: P, probe: V) -> Self {
        Self::with_config(provider, probe, SoftAssertConfig::default())
    }

    /// Create an accumulator with a specific configuration
    #[must_use]
    pub fn with_config(provider: P, probe: V, config: SoftAssertConfig) -> Self {
        Self {
            provider,
            probe,
            config,
            failures: Vec::new(),
            checks: 0,
        }
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &SoftAssertConfig {
        &self.config
    }

    /// Document provider
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Visibility probe
    #[must_use]
    pub const fn probe(&self) -> &V {
        &self.probe
    }

    /// Clear the failure log and the check counter
    pub fn reset(&mut self) {
        self.failures.clear();
        self.checks = 0;
    }

    /// Hook for the harness to call before every test
    pub fn on_test_start(&mut self) {
        if !self.failures.is_empty() {
            debug!(
                discarded = self.failures.len(),
                "discarding soft failures from previous test"
            );
        }
        self.reset();
    }

    /// Hook for the harness to call with any error about to reach the runner
    #[must_use]
    pub fn on_unhandled_error(&self, error: TestFailure) -> TestFailure {
        self.enrich_error(error, None)
    }

    /// Append the current report to an error.
    ///
    /// A step label is appended to the name as `". STEP: <step>"`. Aggregated
    /// soft-assertion failures always end up named `SoftAssertionError`.
    #[must_use]
    pub fn enrich_error(&self, mut error: TestFailure, step: Option<&str>) -> TestFailure {
        if let Some(step) = step.filter(|s| !s.is_empty()) {
            error.name.push_str(". STEP: ");
            error.name.push_str(step);
        }
        if error.is_soft_assertion() {
            error.name = SoftAssertionError::NAME.to_string();
        }
        error.message.push_str(&self.report());
        error
    }

    /// Append a message to the failure log.
    ///
    /// Counts as one failed check in [`summary`](Self::summary).
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.checks += 1;
        self.push_failure(message.into());
    }

    fn push_failure(&mut self, message: String) {
        if self.config.log_failures {
            warn!(index = self.failures.len(), failure = %message, "soft assertion failed");
        }
        self.failures.push(message);
    }

    /// Messages recorded so far, in order
    #[must_use]
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Number of recorded failures
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Whether nothing has been recorded
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of checks evaluated since the last reset
    #[must_use]
    pub const fn checks_run(&self) -> usize {
        self.checks
    }

    /// Summary of the checks since the last reset
    #[must_use]
    pub fn summary(&self) -> AssertionSummary {
        let failed = self.failures.len();
        AssertionSummary {
            total: self.checks,
            passed: self.checks.saturating_sub(failed),
            failed,
        }
    }

    /// Formatted report of the current log, or an empty string
    #[must_use]
    pub fn report(&self) -> String {
        if self.failures.is_empty() {
            String::new()
        } else {
            format_message(&self.failures)
        }
    }

    /// Fail with every recorded message, or succeed if there are none.
    ///
    /// The log is captured by the error and cleared.
    ///
    /// # Errors
    ///
    /// Returns [`SoftAssertionError`] when at least one check failed
    pub fn flush(&mut self) -> Result<(), SoftAssertionError> {
        if self.failures.is_empty() {
            info!(checks = self.checks, "all soft assertions passed");
            return Ok(());
        }
        let failures = std::mem::take(&mut self.failures);
        info!(
            checks = self.checks,
            failed = failures.len(),
            "soft assertions failed"
        );
        Err(SoftAssertionError::new(failures))
    }

    /// Record `message` unless `condition` holds
    pub fn check_true(&mut self, condition: bool, message: &str) {
        self.checks += 1;
        if !condition {
            self.push_failure(message.to_string());
        }
    }

    /// Record `message` if the locator matches nothing
    ///
    /// # Errors
    ///
    /// Returns error if the locator cannot be resolved
    pub async fn check_exists(
        &mut self,
        locator: impl Into<Locator>,
        message: &str,
    ) -> SoftAssertResult<()> {
        self.check_existence(locator, message, true).await
    }

    /// Record `message` if the locator's presence differs from `should_exist`
    ///
    /// # Errors
    ///
    /// Returns error if the locator cannot be resolved
    pub async fn check_existence(
        &mut self,
        locator: impl Into<Locator>,
        message: &str,
        should_exist: bool,
    ) -> SoftAssertResult<()> {
        let locator = locator.into();
        self.checks += 1;
        let elements = self.resolve(&locator).await?;
        let exists = !elements.is_empty();
        debug!(locator = %locator, matched = elements.len(), should_exist, "existence check");
        if exists != should_exist {
            self.push_failure(message.to_string());
        }
        Ok(())
    }

    /// Record `message` if the locator does not match exactly `expected` nodes
    ///
    /// # Errors
    ///
    /// Returns error if the locator cannot be resolved
    pub async fn check_count(
        &mut self,
        locator: impl Into<Locator>,
        expected: usize,
        message: &str,
    ) -> SoftAssertResult<()> {
        let locator = locator.into();
        self.checks += 1;
        let elements = self.resolve(&locator).await?;
        debug!(locator = %locator, matched = elements.len(), expected, "count check");
        if elements.len() != expected {
            self.push_failure(message.to_string());
        }
        Ok(())
    }

    /// Record `message` if nothing matches or the matches' visibility differs
    /// from `expect_visible`
    ///
    /// # Errors
    ///
    /// Returns error if the locator cannot be resolved or the probe fails
    pub async fn check_visible(
        &mut self,
        locator: impl Into<Locator>,
        expect_visible: bool,
        message: &str,
    ) -> SoftAssertResult<()> {
        let locator = locator.into();
        self.checks += 1;
        let elements = self.resolve(&locator).await?;
        if elements.is_empty() {
            debug!(locator = %locator, "visibility check matched nothing");
            self.push_failure(message.to_string());
            return Ok(());
        }
        let mode = VisibilityMode::expecting(expect_visible);
        let satisfied = self
            .bounded(self.probe.satisfies(&elements, mode))
            .await?;
        debug!(
            locator = %locator,
            matched = elements.len(),
            mode = mode.pseudo_selector(),
            satisfied,
            "visibility check"
        );
        if !satisfied {
            self.push_failure(message.to_string());
        }
        Ok(())
    }

    /// Resolve a locator against the provider's current document
    ///
    /// # Errors
    ///
    /// Returns error if the document is unavailable or the locator is invalid
    pub async fn resolve(&self, locator: &Locator) -> SoftAssertResult<ElementSet> {
        let root = self.bounded(self.provider.document()).await?;
        self.bounded(resolver::resolve(locator, &root)).await
    }

    async fn bounded<T, F>(&self, fut: F) -> SoftAssertResult<T>
    where
        F: Future<Output = SoftAssertResult<T>>,
    {
        // The timeout needs a tokio reactor; other executors await unbounded
        if tokio::runtime::Handle::try_current().is_err() {
            return fut.await;
        }
        tokio::time::timeout(self.config.document_timeout(), fut)
            .await
            .map_err(|_| SoftAssertError::Timeout {
                ms: self.config.document_timeout_ms,
            })?
    }
}
