//! Document collaborators and the element sets resolved from them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::SoftAssertResult;

/// Opaque reference to a node owned by a document root.
///
/// Two references are equal when they point at the same node of the same
/// document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRef(pub u64);

impl NodeRef {
    /// Raw node id
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Ordered nodes produced by resolving a locator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSet {
    nodes: Vec<NodeRef>,
}

impl ElementSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing matched
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in resolution order
    #[must_use]
    pub fn as_slice(&self) -> &[NodeRef] {
        &self.nodes
    }

    /// Iterate over the nodes
    pub fn iter(&self) -> std::slice::Iter<'_, NodeRef> {
        self.nodes.iter()
    }

    /// Consume into the underlying nodes
    #[must_use]
    pub fn into_vec(self) -> Vec<NodeRef> {
        self.nodes
    }
}

impl From<Vec<NodeRef>> for ElementSet {
    fn from(nodes: Vec<NodeRef>) -> Self {
        Self { nodes }
    }
}

impl FromIterator<NodeRef> for ElementSet {
    fn from_iter<I: IntoIterator<Item = NodeRef>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ElementSet {
    type Item = &'a NodeRef;
    type IntoIter = std::slice::Iter<'a, NodeRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

/// A document that locators are evaluated against
#[async_trait]
pub trait DocumentRoot: Send + Sync {
    /// All elements matching a CSS selector, in document order.
    ///
    /// Entries may be `None` when the host hands back empty slots.
    async fn query_selector_all(&self, selector: &str) -> SoftAssertResult<Vec<Option<NodeRef>>>;

    /// Ordered node snapshot for an XPath expression.
    ///
    /// A malformed expression is an error, not an empty snapshot.
    async fn evaluate_xpath(&self, expression: &str) -> SoftAssertResult<Vec<NodeRef>>;
}

/// Supplies the current document root; awaited before every resolution
#[async_trait]
pub trait DocumentProvider: Send + Sync {
    /// Root type handed out by this provider
    type Root: DocumentRoot;

    /// Current document
    async fn document(&self) -> SoftAssertResult<Self::Root>;
}
