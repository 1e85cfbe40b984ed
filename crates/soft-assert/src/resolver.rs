//! Element resolution for CSS and XPath locators.

use tracing::trace;

use crate::dom::{DocumentRoot, ElementSet};
use crate::locator::{Locator, LocatorKind};
use crate::result::SoftAssertResult;

/// Resolve a locator against a document root.
///
/// XPath locators keep the evaluator's snapshot order; CSS locators keep
/// document order with empty slots dropped. Nothing matching yields an empty
/// set.
///
/// # Errors
///
/// Returns the root's error when the locator cannot be evaluated, so callers
/// can tell an invalid locator apart from one that matched nothing.
pub async fn resolve<R>(locator: &Locator, root: &R) -> SoftAssertResult<ElementSet>
where
    R: DocumentRoot + ?Sized,
{
    let set: ElementSet = match locator.kind() {
        LocatorKind::XPath => root.evaluate_xpath(locator.as_str()).await?.into(),
        LocatorKind::Css => root
            .query_selector_all(locator.as_str())
            .await?
            .into_iter()
            .flatten()
            .collect(),
    };
    trace!(locator = %locator, kind = %locator.kind(), matched = set.len(), "resolved locator");
    Ok(set)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::dom::NodeRef;
    use crate::mock::{MockElement, StaticDocument};
    use crate::result::SoftAssertError;
    use async_trait::async_trait;

    fn fixture() -> StaticDocument {
        StaticDocument::new()
            .with(MockElement::new("div").id("x"))
            .with(MockElement::new("li").class("item"))
            .with(MockElement::new("li").class("item").class("last"))
            .with(MockElement::new("span").class("item"))
    }

    /// Root whose CSS query hands back empty slots
    struct SparseRoot;

    #[async_trait]
    impl DocumentRoot for SparseRoot {
        async fn query_selector_all(&self, _: &str) -> SoftAssertResult<Vec<Option<NodeRef>>> {
            Ok(vec![Some(NodeRef(4)), None, Some(NodeRef(9)), None])
        }

        async fn evaluate_xpath(&self, _: &str) -> SoftAssertResult<Vec<NodeRef>> {
            Ok(vec![NodeRef(9), NodeRef(4)])
        }
    }

    #[tokio::test]
    async fn test_css_filters_empty_slots() {
        let set = resolve(&Locator::new(".anything"), &SparseRoot).await.unwrap();
        assert_eq!(set.as_slice(), &[NodeRef(4), NodeRef(9)]);
    }

    #[tokio::test]
    async fn test_xpath_keeps_snapshot_order() {
        let set = resolve(&Locator::new("//anything"), &SparseRoot).await.unwrap();
        assert_eq!(set.as_slice(), &[NodeRef(9), NodeRef(4)]);
    }

    #[tokio::test]
    async fn test_css_and_xpath_agree() {
        let doc = fixture();
        let css = resolve(&Locator::new("#x"), &doc).await.unwrap();
        let xpath = resolve(&Locator::new("//div[@id='x']"), &doc).await.unwrap();
        assert_eq!(css.len(), 1);
        assert_eq!(css, xpath);

        let css = resolve(&Locator::new("li.item"), &doc).await.unwrap();
        let xpath = resolve(&Locator::new("//li[@class='item']"), &doc)
            .await
            .unwrap();
        // @class compares the whole attribute, so only the first li matches
        assert_eq!(css.len(), 2);
        assert_eq!(xpath.len(), 1);
        assert_eq!(css.as_slice()[0], xpath.as_slice()[0]);
    }

    #[tokio::test]
    async fn test_no_match_is_empty_not_error() {
        let doc = fixture();
        assert!(resolve(&Locator::new(".missing"), &doc).await.unwrap().is_empty());
        assert!(resolve(&Locator::new("//table"), &doc).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_xpath_is_error() {
        let doc = fixture();
        let err = resolve(&Locator::new("//div[@id='x'"), &doc)
            .await
            .unwrap_err();
        assert!(matches!(err, SoftAssertError::InvalidLocator { .. }));
    }
}
