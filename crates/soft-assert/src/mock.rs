//! In-memory document for running soft checks without a browser.
//!
//! [`StaticDocument`] is a small element tree with layout sizes. It
//! understands enough CSS and XPath for harness unit tests:
//!
//! - CSS: `tag`, `*`, `#id`, `.class`, `[attr]`, `[attr=value]`, compounds of
//!   those, descendant (` `) and child (`>`) combinators, selector lists.
//! - XPath: `/` and `//` steps, `*` or tag name tests, `[@attr]`,
//!   `[@attr='value']` and `[n]` predicates.
//!
//! Anything outside that subset is reported as an invalid locator.
//!
//! ## Example
//!
//! ```rust,ignore
//! let doc = StaticDocument::new()
//!     .with(MockElement::new("li").class("item"))
//!     .with(MockElement::new("li").class("item").hidden());
//! let mut soft = SoftAssert::new(doc.clone(), doc);
//! soft.check_count(".item", 2, "two items").await?;
//! ```

use async_trait::async_trait;

use crate::dom::{DocumentProvider, DocumentRoot, ElementSet, NodeRef};
use crate::result::{SoftAssertError, SoftAssertResult};
use crate::visibility::{VisibilityMode, VisibilityProbe};

/// Default layout size for elements that were not sized explicitly
const DEFAULT_WIDTH: f64 = 100.0;
const DEFAULT_HEIGHT: f64 = 20.0;

/// An element of a [`StaticDocument`]
#[derive(Debug, Clone, PartialEq)]
pub struct MockElement {
    /// Lower-case tag name
    pub tag: String,
    /// Attributes in declaration order
    pub attributes: Vec<(String, String)>,
    /// Rendered width in CSS pixels
    pub width: f64,
    /// Rendered height in CSS pixels
    pub height: f64,
    /// `display: none` (hides the element and all descendants)
    pub display_none: bool,
    parent: Option<usize>,
}

impl MockElement {
    /// Create an element with the default layout size
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: Vec::new(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            display_none: false,
            parent: None,
        }
    }

    /// Set an attribute, replacing an existing value
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.attributes.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.attributes.push((name, value));
        }
        self
    }

    /// Set the `id` attribute
    #[must_use]
    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Append a class to the `class` attribute
    #[must_use]
    pub fn class(self, class: &str) -> Self {
        let classes = match self.attribute("class") {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.attr("class", classes)
    }

    /// Set the rendered size
    #[must_use]
    pub const fn size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Give the element a zero-size box
    #[must_use]
    pub const fn hidden(self) -> Self {
        self.size(0.0, 0.0)
    }

    /// Mark the element `display: none`
    #[must_use]
    pub const fn display_none(mut self) -> Self {
        self.display_none = true;
        self
    }

    /// Attribute value by name
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }
}

/// In-memory document tree
#[derive(Debug, Clone, Default)]
pub struct StaticDocument {
    elements: Vec<MockElement>,
}

impl StaticDocument {
    /// Create an empty document
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a top-level element
    #[must_use]
    pub fn with(mut self, element: MockElement) -> Self {
        self.push(None, element);
        self
    }

    /// Append an element under `parent`
    #[must_use]
    pub fn with_child(mut self, parent: NodeRef, element: MockElement) -> Self {
        self.push(Some(parent), element);
        self
    }

    /// Append a top-level element and return its reference
    pub fn append(&mut self, element: MockElement) -> NodeRef {
        self.push(None, element)
    }

    /// Append an element under `parent` and return its reference
    pub fn append_child(&mut self, parent: NodeRef, element: MockElement) -> NodeRef {
        self.push(Some(parent), element)
    }

    /// Element behind a reference
    #[must_use]
    pub fn element(&self, node: NodeRef) -> Option<&MockElement> {
        usize::try_from(node.0).ok().and_then(|i| self.elements.get(i))
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the document has no elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether an element has a layout box (jQuery `:visible`)
    #[must_use]
    pub fn is_visible(&self, node: NodeRef) -> bool {
        let Some(index) = usize::try_from(node.0).ok() else {
            return false;
        };
        let Some(element) = self.elements.get(index) else {
            return false;
        };
        if self.ancestors_or_self(index).any(|i| self.elements[i].display_none) {
            return false;
        }
        element.width > 0.0 || element.height > 0.0
    }

    fn push(&mut self, parent: Option<NodeRef>, mut element: MockElement) -> NodeRef {
        element.parent = parent
            .and_then(|p| usize::try_from(p.0).ok())
            .filter(|&p| p < self.elements.len());
        self.elements.push(element);
        NodeRef((self.elements.len() - 1) as u64)
    }

    fn children(&self, parent: Option<usize>) -> impl Iterator<Item = usize> + '_ {
        self.elements
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.parent == parent)
            .map(|(i, _)| i)
    }

    /// Pre-order traversal from the document node
    fn document_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.elements.len());
        let mut stack: Vec<usize> = self.children(None).collect();
        stack.reverse();
        while let Some(index) = stack.pop() {
            order.push(index);
            let mut kids: Vec<usize> = self.children(Some(index)).collect();
            kids.reverse();
            stack.extend(kids);
        }
        order
    }

    fn ancestors_or_self(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(Some(index), move |&i| self.elements[i].parent)
    }

    /// Context node plus every node below it, in document order
    fn descendants_or_self(&self, context: Option<usize>) -> Vec<Option<usize>> {
        let order = self.document_order();
        let mut out = vec![context];
        out.extend(
            order
                .into_iter()
                .filter(|&i| match context {
                    None => true,
                    Some(c) => i != c && self.ancestors_or_self(i).any(|a| a == c),
                })
                .map(Some),
        );
        out
    }

    fn sort_document_order(&self, mut nodes: Vec<usize>) -> Vec<usize> {
        let order = self.document_order();
        nodes.sort_by_key(|n| order.iter().position(|o| o == n));
        nodes.dedup();
        nodes
    }
}

#[async_trait]
impl DocumentRoot for StaticDocument {
    async fn query_selector_all(&self, selector: &str) -> SoftAssertResult<Vec<Option<NodeRef>>> {
        let list =
            css::parse(selector).map_err(|m| SoftAssertError::invalid_locator(selector, m))?;
        Ok(self
            .document_order()
            .into_iter()
            .filter(|&i| list.iter().any(|chain| css::matches_chain(self, i, chain)))
            .map(|i| Some(NodeRef(i as u64)))
            .collect())
    }

    async fn evaluate_xpath(&self, expression: &str) -> SoftAssertResult<Vec<NodeRef>> {
        let steps =
            xpath::parse(expression).map_err(|m| SoftAssertError::invalid_locator(expression, m))?;
        let mut context: Vec<Option<usize>> = vec![None];
        for step in &steps {
            let mut next = Vec::new();
            for &ctx in &context {
                let parents = match step.axis {
                    xpath::Axis::Child => vec![ctx],
                    xpath::Axis::Descendant => self.descendants_or_self(ctx),
                };
                for parent in parents {
                    next.extend(xpath::select_children(self, parent, step));
                }
            }
            context = self.sort_document_order(next).into_iter().map(Some).collect();
        }
        Ok(context
            .into_iter()
            .flatten()
            .map(|i| NodeRef(i as u64))
            .collect())
    }
}

#[async_trait]
impl DocumentProvider for StaticDocument {
    type Root = Self;

    async fn document(&self) -> SoftAssertResult<Self> {
        Ok(self.clone())
    }
}

#[async_trait]
impl VisibilityProbe for StaticDocument {
    async fn satisfies(
        &self,
        elements: &ElementSet,
        mode: VisibilityMode,
    ) -> SoftAssertResult<bool> {
        // jQuery `.is()` holds when any member matches
        let want_visible = mode == VisibilityMode::Visible;
        Ok(elements
            .iter()
            .any(|&node| self.is_visible(node) == want_visible))
    }
}

mod css {
    use super::{MockElement, StaticDocument};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(super) enum Combinator {
        Descendant,
        Child,
    }

    #[derive(Debug, Default)]
    pub(super) struct Compound {
        tag: Option<String>,
        id: Option<String>,
        classes: Vec<String>,
        attributes: Vec<(String, Option<String>)>,
    }

    impl Compound {
        fn matches(&self, element: &MockElement) -> bool {
            self.tag.as_ref().map_or(true, |t| *t == element.tag)
                && self
                    .id
                    .as_ref()
                    .map_or(true, |id| element.attribute("id") == Some(id.as_str()))
                && self.classes.iter().all(|c| element.has_class(c))
                && self.attributes.iter().all(|(name, value)| {
                    match (element.attribute(name), value) {
                        (Some(actual), Some(expected)) => actual == expected,
                        (Some(_), None) => true,
                        (None, _) => false,
                    }
                })
        }
    }

    /// Compounds right-to-left; each carries the combinator to its left
    pub(super) type Chain = Vec<(Compound, Option<Combinator>)>;

    pub(super) fn parse(selector: &str) -> Result<Vec<Chain>, String> {
        split_list(selector).into_iter().map(parse_chain).collect()
    }

    /// Characters outside attribute brackets and quoted strings
    fn top_level(text: &str) -> impl Iterator<Item = (usize, char)> + '_ {
        let mut quote: Option<char> = None;
        let mut depth = 0usize;
        text.char_indices().filter(move |&(_, c)| {
            if let Some(open) = quote {
                if c == open {
                    quote = None;
                }
                return false;
            }
            match c {
                '\'' | '"' => {
                    quote = Some(c);
                    false
                }
                '[' => {
                    depth += 1;
                    false
                }
                ']' => {
                    depth = depth.saturating_sub(1);
                    false
                }
                _ => depth == 0,
            }
        })
    }

    fn split_list(selector: &str) -> Vec<&str> {
        let mut parts = Vec::new();
        let mut start = 0;
        for (i, _) in top_level(selector).filter(|&(_, c)| c == ',') {
            parts.push(&selector[start..i]);
            start = i + 1;
        }
        parts.push(&selector[start..]);
        parts
    }

    /// Compound selectors and `>` combinators of one chain
    fn tokens(text: &str) -> Vec<&str> {
        let mut tokens = Vec::new();
        let mut start = 0;
        for (i, c) in top_level(text).filter(|&(_, c)| c == '>' || c.is_ascii_whitespace()) {
            if start < i {
                tokens.push(&text[start..i]);
            }
            if c == '>' {
                tokens.push(">");
            }
            start = i + c.len_utf8();
        }
        if start < text.len() {
            tokens.push(&text[start..]);
        }
        tokens
    }

    /// Offset of the `]` closing the attribute selector that opens `rest`
    fn attribute_end(rest: &str) -> Option<usize> {
        let mut quote: Option<char> = None;
        for (i, c) in rest.char_indices().skip(1) {
            match quote {
                Some(open) if c == open => quote = None,
                Some(_) => {}
                None if c == '\'' || c == '"' => quote = Some(c),
                None if c == ']' => return Some(i),
                None => {}
            }
        }
        None
    }

    fn parse_chain(text: &str) -> Result<Chain, String> {
        let text = text.trim();
        if text.is_empty() {
            return Err("empty selector".to_string());
        }
        let mut chain = Vec::new();
        let mut pending: Option<Combinator> = None;
        for token in tokens(text) {
            if token == ">" {
                if chain.is_empty() || pending == Some(Combinator::Child) {
                    return Err("dangling `>` combinator".to_string());
                }
                pending = Some(Combinator::Child);
                continue;
            }
            let compound = parse_compound(token)?;
            let combinator = if chain.is_empty() {
                None
            } else {
                Some(pending.take().unwrap_or(Combinator::Descendant))
            };
            pending = None;
            chain.push((compound, combinator));
        }
        if pending.is_some() {
            return Err("dangling `>` combinator".to_string());
        }
        chain.reverse();
        Ok(chain)
    }

    fn is_ident(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '-' || c == '_'
    }

    fn take_ident(rest: &str) -> (&str, &str) {
        let end = rest.find(|c| !is_ident(c)).unwrap_or(rest.len());
        rest.split_at(end)
    }

    fn parse_compound(token: &str) -> Result<Compound, String> {
        let mut compound = Compound::default();
        let mut rest = token;
        if let Some(after) = rest.strip_prefix('*') {
            rest = after;
        } else {
            let (tag, after) = take_ident(rest);
            if !tag.is_empty() {
                compound.tag = Some(tag.to_ascii_lowercase());
            }
            rest = after;
        }
        while let Some(first) = rest.chars().next() {
            match first {
                '#' | '.' => {
                    let (name, after) = take_ident(&rest[1..]);
                    if name.is_empty() {
                        return Err(format!("expected a name after `{first}`"));
                    }
                    if first == '#' {
                        compound.id = Some(name.to_string());
                    } else {
                        compound.classes.push(name.to_string());
                    }
                    rest = after;
                }
                '[' => {
                    let close = attribute_end(rest)
                        .ok_or_else(|| "unterminated attribute selector".to_string())?;
                    let body = &rest[1..close];
                    let (name, value) = match body.split_once('=') {
                        Some((n, v)) => (n.trim(), Some(unquote(v.trim()).to_string())),
                        None => (body.trim(), None),
                    };
                    if name.is_empty() || !name.chars().all(is_ident) {
                        return Err(format!("invalid attribute name `{name}`"));
                    }
                    compound.attributes.push((name.to_string(), value));
                    rest = &rest[close + 1..];
                }
                other => return Err(format!("unsupported selector syntax at `{other}`")),
            }
        }
        Ok(compound)
    }

    fn unquote(value: &str) -> &str {
        value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
            .unwrap_or(value)
    }

    pub(super) fn matches_chain(
        doc: &StaticDocument,
        index: usize,
        chain: &[(Compound, Option<Combinator>)],
    ) -> bool {
        let Some(((compound, combinator), rest)) = chain.split_first() else {
            return true;
        };
        if !compound.matches(&doc.elements[index]) {
            return false;
        }
        match combinator {
            None => true,
            Some(Combinator::Child) => doc.elements[index]
                .parent
                .is_some_and(|p| matches_chain(doc, p, rest)),
            Some(Combinator::Descendant) => doc
                .ancestors_or_self(index)
                .skip(1)
                .any(|a| matches_chain(doc, a, rest)),
        }
    }
}

mod xpath {
    use super::StaticDocument;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(super) enum Axis {
        Child,
        Descendant,
    }

    #[derive(Debug)]
    enum Predicate {
        HasAttribute(String),
        AttributeEquals(String, String),
        Position(usize),
    }

    #[derive(Debug)]
    pub(super) struct Step {
        pub(super) axis: Axis,
        name: Option<String>,
        predicates: Vec<Predicate>,
    }

    pub(super) fn parse(expression: &str) -> Result<Vec<Step>, String> {
        let mut steps = Vec::new();
        let mut rest = expression;
        while !rest.is_empty() {
            let axis = if let Some(after) = rest.strip_prefix("//") {
                rest = after;
                Axis::Descendant
            } else if let Some(after) = rest.strip_prefix('/') {
                rest = after;
                Axis::Child
            } else {
                return Err(format!("expected `/` before `{rest}`"));
            };
            let end = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '*'))
                .unwrap_or(rest.len());
            let name = &rest[..end];
            rest = &rest[end..];
            let name = match name {
                "" => return Err("empty location step".to_string()),
                "*" => None,
                n if n.contains('*') => return Err(format!("invalid name test `{n}`")),
                n => Some(n.to_ascii_lowercase()),
            };
            let mut predicates = Vec::new();
            while rest.starts_with('[') {
                let close =
                    closing_bracket(rest).ok_or_else(|| "unterminated predicate".to_string())?;
                predicates.push(parse_predicate(&rest[1..close])?);
                rest = &rest[close + 1..];
            }
            steps.push(Step {
                axis,
                name,
                predicates,
            });
        }
        if steps.is_empty() {
            return Err("empty expression".to_string());
        }
        Ok(steps)
    }

    /// Index of the `]` closing the predicate at the start of `text`
    fn closing_bracket(text: &str) -> Option<usize> {
        let mut quote: Option<char> = None;
        for (i, c) in text.char_indices().skip(1) {
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '\'' | '"') => quote = Some(c),
                (None, ']') => return Some(i),
                (None, '[') => return None,
                (None, _) => {}
            }
        }
        None
    }

    fn parse_predicate(body: &str) -> Result<Predicate, String> {
        let body = body.trim();
        if let Some(attr) = body.strip_prefix('@') {
            return match attr.split_once('=') {
                None => Ok(Predicate::HasAttribute(attr.trim().to_string())),
                Some((name, value)) => {
                    let value = value.trim();
                    let unquoted = value
                        .strip_prefix('\'')
                        .and_then(|v| v.strip_suffix('\''))
                        .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
                        .ok_or_else(|| format!("unquoted literal `{value}`"))?;
                    Ok(Predicate::AttributeEquals(
                        name.trim().to_string(),
                        unquoted.to_string(),
                    ))
                }
            };
        }
        match body.parse::<usize>() {
            Ok(n) if n > 0 => Ok(Predicate::Position(n)),
            _ => Err(format!("unsupported predicate `[{body}]`")),
        }
    }

    /// Children of `parent` selected by one step, predicates applied in order
    pub(super) fn select_children(
        doc: &StaticDocument,
        parent: Option<usize>,
        step: &Step,
    ) -> Vec<usize> {
        let mut selected: Vec<usize> = doc
            .children(parent)
            .filter(|&i| step.name.as_ref().map_or(true, |n| *n == doc.elements[i].tag))
            .collect();
        for predicate in &step.predicates {
            selected = match predicate {
                Predicate::HasAttribute(name) => selected
                    .into_iter()
                    .filter(|&i| doc.elements[i].attribute(name).is_some())
                    .collect(),
                Predicate::AttributeEquals(name, value) => selected
                    .into_iter()
                    .filter(|&i| doc.elements[i].attribute(name) == Some(value.as_str()))
                    .collect(),
                Predicate::Position(n) => selected.get(n - 1).copied().into_iter().collect(),
            };
        }
        selected
    }
}
