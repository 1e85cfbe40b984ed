//! Locators: CSS selectors and XPath expressions.
//!
//! A locator is XPath when it starts with `/` and CSS otherwise. Nothing else
//! about its structure is checked here; malformed expressions surface when
//! the document evaluates them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Syntax a locator is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocatorKind {
    /// XPath expression (e.g. `//div[@id='x']`)
    XPath,
    /// CSS selector (e.g. `#x`)
    Css,
}

impl LocatorKind {
    /// Classify a raw locator string
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        if raw.starts_with('/') {
            Self::XPath
        } else {
            Self::Css
        }
    }
}

impl fmt::Display for LocatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::XPath => f.write_str("xpath"),
            Self::Css => f.write_str("css"),
        }
    }
}

/// A classified locator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    raw: String,
    kind: LocatorKind,
}

impl Locator {
    /// Classify and wrap a locator string
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let kind = LocatorKind::classify(&raw);
        Self { raw, kind }
    }

    /// The locator as written
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Syntax of the locator
    #[must_use]
    pub const fn kind(&self) -> LocatorKind {
        self.kind
    }

    /// Whether the locator is an XPath expression
    #[must_use]
    pub fn is_xpath(&self) -> bool {
        self.kind == LocatorKind::XPath
    }
}

impl From<&str> for Locator {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Locator {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&String> for Locator {
    fn from(raw: &String) -> Self {
        Self::new(raw.as_str())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slash_prefix_is_xpath() {
        assert_eq!(LocatorKind::classify("//div[@id='x']"), LocatorKind::XPath);
        assert_eq!(LocatorKind::classify("/html/body"), LocatorKind::XPath);
    }

    #[test]
    fn test_everything_else_is_css() {
        assert_eq!(LocatorKind::classify("#x"), LocatorKind::Css);
        assert_eq!(LocatorKind::classify(".item"), LocatorKind::Css);
        assert_eq!(LocatorKind::classify("div > span"), LocatorKind::Css);
        assert_eq!(LocatorKind::classify(""), LocatorKind::Css);
        // Leading whitespace is not trimmed
        assert_eq!(LocatorKind::classify(" //div"), LocatorKind::Css);
    }

    #[test]
    fn test_locator_keeps_raw_text() {
        let locator = Locator::from("//li[2]");
        assert_eq!(locator.as_str(), "//li[2]");
        assert!(locator.is_xpath());
        assert_eq!(locator.to_string(), "//li[2]");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(LocatorKind::XPath.to_string(), "xpath");
        assert_eq!(LocatorKind::Css.to_string(), "css");
    }
}
