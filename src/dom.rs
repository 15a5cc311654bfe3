//! # Input Document Tree
//!
//! The parsed element/text tree the engine consumes. An HTML parser and a
//! style engine run upstream: by the time a tree arrives here, every
//! element carries its resolved style. The shape is serde-friendly so a
//! document can also be constructed directly from JSON.

use crate::style::ResolvedStyle;
use serde::{Deserialize, Serialize};

/// A node of the parsed input tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomNode {
    /// The document wrapper; transparent during flow building.
    Document { children: Vec<DomNode> },

    /// An element with a tag name and resolved style.
    Element {
        tag: String,
        #[serde(default)]
        style: ResolvedStyle,
        #[serde(default)]
        children: Vec<DomNode>,
    },

    /// A text run.
    Text { content: String },

    /// A comment; dropped during flow building.
    Comment { content: String },

    /// A document type declaration. Parsers emit these at the top of a
    /// document; they carry nothing layoutable and the flow builder
    /// rejects them.
    Doctype { name: String },
}

impl DomNode {
    /// Create an element node.
    pub fn element(tag: &str, style: ResolvedStyle, children: Vec<DomNode>) -> Self {
        DomNode::Element {
            tag: tag.to_string(),
            style,
            children,
        }
    }

    /// Create a text node.
    pub fn text(content: &str) -> Self {
        DomNode::Text {
            content: content.to_string(),
        }
    }

    /// Tag name of an element node, `None` otherwise.
    pub fn tag(&self) -> Option<&str> {
        match self {
            DomNode::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }
}
