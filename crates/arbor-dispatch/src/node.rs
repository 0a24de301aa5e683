//! The HTML-like node tree consumed by the pipeline.
//!
//! Nodes follow the hast JSON shape produced by markdown processors:
//!
//! ```json
//! { "type": "element", "tagName": "p", "properties": {}, "children": [
//!     { "type": "text", "value": "Hello" }
//! ] }
//! ```
//!
//! The tree is owned by whoever produced it. Nothing in this workspace mutates
//! a node after it has been handed to a [`Pipeline`](crate::Pipeline).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Insertion-ordered property map of an element.
///
/// Keys are hast property names (`className`, `tabIndex`, `ariaHidden`, ...).
/// The insertion order is the order attributes are serialized in.
pub type Properties = IndexMap<String, PropertyValue>;

/// A node of the tree: either literal text or an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    /// Literal text.
    Text(Text),
    /// An element with properties and ordered children.
    Element(Element),
}

/// A text node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    /// The unescaped text value.
    pub value: String,
}

/// An element node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Lowercase tag name, e.g. `"p"` or `"h1"`.
    pub tag_name: String,
    /// Element properties in document order.
    #[serde(default)]
    pub properties: Properties,
    /// Child nodes in document order.
    #[serde(default)]
    pub children: Vec<Node>,
}

/// The value of a single element property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// A boolean flag (`hidden`, `disabled`, ...).
    Bool(bool),
    /// A numeric value (`tabIndex`, `colSpan`, ...).
    Number(serde_json::Number),
    /// A plain string value.
    String(String),
    /// A list value, joined on output (`className`, `accept`, ...).
    List(Vec<String>),
}

impl Node {
    /// Creates a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(Text {
            value: value.into(),
        })
    }

    /// Creates an element node with no properties or children.
    pub fn element(tag_name: impl Into<String>) -> Self {
        Node::Element(Element::new(tag_name))
    }

    /// Returns the element if this is an element node.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    /// Returns true for text nodes.
    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    /// Returns the tag name of element nodes.
    pub fn tag_name(&self) -> Option<&str> {
        self.as_element().map(|el| el.tag_name.as_str())
    }

    /// Concatenates the text of this node and all of its descendants.
    ///
    /// ```rust
    /// use arbor_dispatch::{Element, Node};
    ///
    /// let heading: Node = Element::new("h1")
    ///     .with_child(Node::text("Hello "))
    ///     .with_child(Element::new("em").with_child(Node::text("world")).into())
    ///     .into();
    /// assert_eq!(heading.text_content(), "Hello world");
    /// ```
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&text.value),
        Node::Element(el) => {
            for child in &el.children {
                collect_text(child, out);
            }
        }
    }
}

impl Element {
    /// Creates an element with no properties or children.
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            properties: Properties::new(),
            children: Vec::new(),
        }
    }

    /// Appends a property, keeping insertion order.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Appends a child node.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Returns the element's class names.
    ///
    /// Always returns a list, even when `className` is missing. A string
    /// `className` is split on whitespace.
    pub fn classes(&self) -> Vec<&str> {
        match self.properties.get("className") {
            Some(PropertyValue::List(items)) => items.iter().map(String::as_str).collect(),
            Some(PropertyValue::String(s)) => s.split_whitespace().collect(),
            _ => Vec::new(),
        }
    }

    /// Returns true if the element carries the given class name.
    pub fn has_class(&self, class_name: &str) -> bool {
        self.classes().contains(&class_name)
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Number(value.into())
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<Vec<&str>> for PropertyValue {
    fn from(value: Vec<&str>) -> Self {
        PropertyValue::List(value.into_iter().map(String::from).collect())
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(value: Vec<String>) -> Self {
        PropertyValue::List(value)
    }
}
