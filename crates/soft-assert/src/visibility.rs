//! Visibility collaborator.
//!
//! What "visible" means belongs to the probe. The accumulator only asks
//! whether an element set as a whole satisfies a mode.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::dom::ElementSet;
use crate::result::SoftAssertResult;

/// Desired visibility of an element set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisibilityMode {
    /// Set should be visible (`:visible`)
    Visible,
    /// Set should not be visible (`:not(:visible)`)
    Hidden,
}

impl VisibilityMode {
    /// Mode for an expected visibility flag
    #[must_use]
    pub const fn expecting(visible: bool) -> Self {
        if visible {
            Self::Visible
        } else {
            Self::Hidden
        }
    }

    /// jQuery pseudo-selector for this mode
    #[must_use]
    pub const fn pseudo_selector(self) -> &'static str {
        match self {
            Self::Visible => ":visible",
            Self::Hidden => ":not(:visible)",
        }
    }
}

/// Decides whether an element set satisfies a visibility mode
#[async_trait]
pub trait VisibilityProbe: Send + Sync {
    /// `true` when `elements` satisfies `mode`
    async fn satisfies(&self, elements: &ElementSet, mode: VisibilityMode)
        -> SoftAssertResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expecting() {
        assert_eq!(VisibilityMode::expecting(true), VisibilityMode::Visible);
        assert_eq!(VisibilityMode::expecting(false), VisibilityMode::Hidden);
    }

    #[test]
    fn test_pseudo_selector() {
        assert_eq!(VisibilityMode::Visible.pseudo_selector(), ":visible");
        assert_eq!(VisibilityMode::Hidden.pseudo_selector(), ":not(:visible)");
    }
}
