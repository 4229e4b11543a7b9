//! Query evaluation boundary.
//!
//! Selectors never talk to a browser themselves. A [`QueryEvaluator`] runs a
//! [`Query`] against the current document and hands back nodes; filters then
//! inspect those nodes through the [`Node`] accessors.
//!
//! ```text
//! ┌──────────────┐  Query   ┌────────────────┐  Vec<Node>  ┌──────────────┐
//! │  Selector    │─────────►│ QueryEvaluator │────────────►│ FilterSet    │
//! │  (call)      │          │ (CDP / mock)   │             │ (post-match) │
//! └──────────────┘          └────────────────┘             └──────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use crate::query::Query;
use crate::result::ProbarResult;

/// Attribute and text access for a matched node
pub trait Node {
    /// Attribute value, `None` when the attribute is absent
    fn attribute(&self, name: &str) -> Option<String>;

    /// Text content
    fn text(&self) -> String;

    /// Lowercase element name
    fn tag_name(&self) -> String;

    /// Child elements
    fn child_nodes(&self) -> Vec<&dyn Node> {
        Vec::new()
    }

    /// Whether the attribute is present
    fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Form value
    fn value(&self) -> Option<String> {
        self.attribute("value")
    }

    /// Checkbox / radio checked state
    fn is_checked(&self) -> bool {
        self.has_attribute("checked")
    }

    /// Disabled state
    fn is_disabled(&self) -> bool {
        self.has_attribute("disabled")
    }

    /// `multiple` attribute on selects and file inputs
    fn is_multiple(&self) -> bool {
        self.has_attribute("multiple")
    }

    /// Read-only state
    fn is_readonly(&self) -> bool {
        self.has_attribute("readonly")
    }

    /// Option selected state
    fn is_selected(&self) -> bool {
        self.has_attribute("selected")
    }
}

/// Evaluates structural queries against a document
pub trait QueryEvaluator {
    /// Node type produced by this evaluator
    type Node: Node;

    /// Evaluate `query` within `scope` (the whole document when `None`),
    /// returning matches in document order
    fn evaluate(
        &self,
        query: &Query,
        exact: bool,
        scope: Option<&Self::Node>,
    ) -> ProbarResult<Vec<Self::Node>>;
}

/// Element handle for DOM interactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Unique identifier for the element
    pub id: String,
    /// Element tag name
    pub tag_name: String,
    /// Element text content
    pub text_content: Option<String>,
    /// Element attributes
    pub attributes: BTreeMap<String, String>,
    /// Child elements
    pub children: Vec<ElementHandle>,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into().to_ascii_lowercase(),
            text_content: None,
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set a boolean attribute (`checked`, `disabled`, ...)
    #[must_use]
    pub fn with_flag(self, name: impl Into<String>) -> Self {
        let name = name.into();
        let value = name.clone();
        self.with_attribute(name, value)
    }

    /// Set the text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Append a child element
    #[must_use]
    pub fn with_child(mut self, child: ElementHandle) -> Self {
        self.children.push(child);
        self
    }
}

impl Node for ElementHandle {
    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }

    fn text(&self) -> String {
        match &self.text_content {
            Some(text) => text.clone(),
            None => self
                .children
                .iter()
                .map(Node::text)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    fn tag_name(&self) -> String {
        self.tag_name.clone()
    }

    fn child_nodes(&self) -> Vec<&dyn Node> {
        self.children.iter().map(|c| c as &dyn Node).collect()
    }
}

/// Mock evaluator for unit testing.
///
/// Queries registered with [`MockDriver::respond`] return their canned
/// elements; any other query returns every element added with
/// [`MockDriver::add_element`].
#[derive(Debug, Default)]
pub struct MockDriver {
    /// Elements returned for unregistered queries
    pub elements: Vec<ElementHandle>,
    /// Canned responses keyed by rendered query
    pub responses: HashMap<String, Vec<ElementHandle>>,
    /// Call history for verification
    call_history: RefCell<Vec<String>>,
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mock element
    pub fn add_element(&mut self, element: ElementHandle) {
        self.elements.push(element);
    }

    /// Return `elements` whenever a query renders to `rendered`
    pub fn respond(&mut self, rendered: impl Into<String>, elements: Vec<ElementHandle>) {
        let _ = self.responses.insert(rendered.into(), elements);
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.call_history.borrow().clone()
    }

    /// Check if a query with this rendering was evaluated
    #[must_use]
    pub fn was_queried(&self, rendered: &str) -> bool {
        self.call_history.borrow().iter().any(|c| c == rendered)
    }
}

impl QueryEvaluator for MockDriver {
    type Node = ElementHandle;

    fn evaluate(
        &self,
        query: &Query,
        exact: bool,
        scope: Option<&ElementHandle>,
    ) -> ProbarResult<Vec<ElementHandle>> {
        let rendered = query.render(exact);
        self.call_history.borrow_mut().push(rendered.clone());
        if let Some(canned) = self.responses.get(&rendered) {
            return Ok(canned.clone());
        }
        Ok(match scope {
            Some(scope) => scope.children.clone(),
            None => self.elements.clone(),
        })
    }
}
