//! Soft assertions for browser end-to-end tests.
//!
//! Checks on a page (does an element exist, how many match, are they
//! visible) are recorded instead of failing the test on the spot. At the end
//! of the test [`SoftAssert::flush`] reports every failed check at once.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  check_*   ┌─────────────┐  resolve   ┌──────────────────┐
//! │ Test code  │───────────►│ SoftAssert  │───────────►│ DocumentProvider │
//! │            │◄───────────│ failure log │◄───────────│ + DocumentRoot   │
//! └────────────┘  flush()   └─────────────┘            └──────────────────┘
//!                                  │  satisfies   ┌─────────────────┐
//!                                  └─────────────►│ VisibilityProbe │
//!                                                 └─────────────────┘
//! ```
//!
//! Locators starting with `/` are XPath; everything else is CSS.
//!
//! The `browser` feature provides a Chromium page implementing all three
//! collaborators; [`mock::StaticDocument`] does the same in memory.

#![warn(missing_docs)]

mod config;
mod dom;
mod locator;
mod logging;
mod report;
mod resolver;
mod result;
mod soft;
mod visibility;

#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::doc_markdown)]
mod browser;

/// In-memory document for running checks without a browser
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod mock;

pub use config::{SoftAssertConfig, DEFAULT_DOCUMENT_TIMEOUT_MS};
pub use dom::{DocumentProvider, DocumentRoot, ElementSet, NodeRef};
pub use locator::{Locator, LocatorKind};
pub use logging::{init_json_tracing, init_tracing, DEFAULT_FILTER};
pub use report::{
    format_message, FailureOrigin, SoftAssertionError, TestFailure, REPORT_FOOTER, REPORT_HEADER,
};
pub use resolver::resolve;
pub use result::{SoftAssertError, SoftAssertResult};
pub use soft::{AssertionSummary, SoftAssert};
pub use visibility::{VisibilityMode, VisibilityProbe};

#[cfg(feature = "browser")]
pub use browser::{Browser, BrowserConfig, PageDocument};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::mock::{MockElement, StaticDocument};
    pub use super::{
        format_message, resolve, DocumentProvider, DocumentRoot, ElementSet, Locator,
        LocatorKind, NodeRef, SoftAssert, SoftAssertConfig, SoftAssertError, SoftAssertResult,
        SoftAssertionError, TestFailure, VisibilityMode, VisibilityProbe,
    };

    #[cfg(feature = "browser")]
    pub use super::{Browser, BrowserConfig, PageDocument};
}
