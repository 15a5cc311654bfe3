//! # Flow Tree Builder
//!
//! Turns the parsed input tree into a flow tree: a whitespace-normalized,
//! direction-aware view of the document. Each element is classified as
//! block material (stacks downward) or inline material (runs rightward)
//! from a fixed tag table; text runs are collapsed or preserved depending
//! on the surrounding `white-space` mode.

use crate::dom::DomNode;
use crate::error::LayoutError;
use crate::style::{ResolvedStyle, WhiteSpace};

/// Progression direction of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Block progression: children stack downward.
    Block,
    /// Inline progression: content runs rightward.
    Inline,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Block => write!(f, "↓"),
            Direction::Inline => write!(f, "→"),
        }
    }
}

/// Tags that force block progression for their content.
const BLOCK_TAGS: &[&str] = &[
    "html", "body", "address", "article", "aside", "blockquote", "canvas", "dd", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hr", "li", "main", "nav", "noscript", "ol", "p", "pre", "section", "table",
    "tfoot", "thead", "tbody", "tr", "td", "th", "ul", "video", "colgroup", "col",
];

/// Tags that force inline progression.
const INLINE_TAGS: &[&str] = &[
    "b", "big", "i", "small", "tt", "abbr", "acronym", "cite", "code", "dfn", "em", "kbd",
    "strong", "samp", "var", "a", "bdo", "img", "map", "object", "q", "script", "span", "sub",
    "sup", "button", "input", "label", "select", "textarea",
];

/// Direction forced by a tag, if any. Unknown tags keep the parent's
/// direction.
fn tag_direction(tag: &str) -> Option<Direction> {
    if BLOCK_TAGS.contains(&tag) {
        Some(Direction::Block)
    } else if INLINE_TAGS.contains(&tag) {
        Some(Direction::Inline)
    } else {
        None
    }
}

/// A node of the flow tree.
#[derive(Debug, Clone)]
pub enum FlowNode {
    /// A normalized text run.
    Text(String),
    /// An element with its progression direction resolved.
    Element {
        tag: String,
        direction: Direction,
        style: ResolvedStyle,
        children: Vec<FlowNode>,
    },
}

impl FlowNode {
    /// Tag name of an element node, `None` for text.
    pub fn tag(&self) -> Option<&str> {
        match self {
            FlowNode::Element { tag, .. } => Some(tag),
            FlowNode::Text(_) => None,
        }
    }

    /// True for a text node that is entirely whitespace.
    pub fn is_whitespace_text(&self) -> bool {
        match self {
            FlowNode::Text(t) => t.chars().all(char::is_whitespace),
            FlowNode::Element { .. } => false,
        }
    }

    /// Concatenated descendant text in document order.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            FlowNode::Text(t) => out.push_str(t),
            FlowNode::Element { children, .. } => {
                for c in children {
                    c.collect_text(out);
                }
            }
        }
    }
}

/// Builds [`FlowNode`] trees from parsed input.
///
/// Carries the nesting `white-space` mode: `pre` pushes preserve for a
/// subtree, any other explicit value pushes collapse, absence inherits.
pub struct FlowTreeBuilder {
    preserve: Vec<bool>,
}

impl Default for FlowTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowTreeBuilder {
    pub fn new() -> Self {
        Self { preserve: vec![false] }
    }

    /// Build the flow tree for a whole document. The result is a synthetic
    /// block root holding the document's top-level flow nodes.
    pub fn build(&mut self, dom: &DomNode) -> Result<FlowNode, LayoutError> {
        let mut children = Vec::new();
        self.walk(std::slice::from_ref(dom), Direction::Block, &mut children)?;
        Ok(FlowNode::Element {
            tag: String::new(),
            direction: Direction::Block,
            style: ResolvedStyle::block(),
            children,
        })
    }

    fn preserving(&self) -> bool {
        *self.preserve.last().unwrap_or(&false)
    }

    fn walk(
        &mut self,
        nodes: &[DomNode],
        mut direction: Direction,
        out: &mut Vec<FlowNode>,
    ) -> Result<(), LayoutError> {
        for node in nodes {
            let mut new_dir = direction;
            match node {
                DomNode::Comment { .. } => {}
                DomNode::Document { children } => {
                    // Transparent wrapper.
                    self.walk(children, new_dir, out)?;
                }
                DomNode::Text { content } => {
                    let preserve = self.preserving();
                    let mut txt = content.clone();
                    // Text is always inline material; when we turn from
                    // block to inline the leading whitespace disappears.
                    if direction == Direction::Block {
                        txt = txt.trim_start().to_string();
                    }
                    if !preserve && is_all_whitespace(&txt) {
                        txt = " ".to_string();
                    }
                    if !is_all_whitespace(&txt) && direction == Direction::Block {
                        new_dir = Direction::Inline;
                    }
                    if !txt.is_empty() && !preserve {
                        txt = collapse_whitespace(&txt);
                    }
                    if !txt.is_empty() {
                        out.push(FlowNode::Text(txt));
                    }
                }
                DomNode::Element { tag, style, children } => {
                    if let Some(forced) = tag_direction(tag) {
                        new_dir = forced;
                    }
                    let ws = match style.white_space {
                        Some(WhiteSpace::Pre) => true,
                        Some(_) => false,
                        None => self.preserving(),
                    };
                    let mut kids = Vec::new();
                    self.preserve.push(ws);
                    let walked = self.walk(children, new_dir, &mut kids);
                    let _ = self.preserve.pop();
                    walked?;
                    out.push(FlowNode::Element {
                        tag: tag.clone(),
                        direction: new_dir,
                        style: style.clone(),
                        children: kids,
                    });
                }
                other => {
                    return Err(LayoutError::UnsupportedNodeKind(node_kind_name(other)));
                }
            }
            direction = new_dir;
        }
        Ok(())
    }
}

fn node_kind_name(node: &DomNode) -> String {
    match node {
        DomNode::Document { .. } => "document".to_string(),
        DomNode::Element { tag, .. } => format!("element <{tag}>"),
        DomNode::Text { .. } => "text".to_string(),
        DomNode::Comment { .. } => "comment".to_string(),
        DomNode::Doctype { name } => format!("doctype {name}"),
    }
}

fn is_all_whitespace(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}

/// Collapse whitespace runs: boundary runs shrink to a single space, and
/// interior runs of two or more characters (or any newline) shrink to a
/// single space. A lone interior space survives untouched.
fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        if !c.is_whitespace() {
            out.push(c);
            continue;
        }
        let mut len = 1;
        let mut has_newline = c == '\n';
        while let Some(&(_, next)) = chars.peek() {
            if !next.is_whitespace() {
                break;
            }
            has_newline |= next == '\n';
            len += 1;
            let _ = chars.next();
        }
        let at_boundary = start == 0 || chars.peek().is_none();
        if at_boundary || len >= 2 || has_newline {
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomNode;
    use crate::style::ResolvedStyle;

    fn el(tag: &str, children: Vec<DomNode>) -> DomNode {
        DomNode::element(tag, ResolvedStyle::default(), children)
    }

    fn first_element(flow: &FlowNode) -> &FlowNode {
        match flow {
            FlowNode::Element { children, .. } => &children[0],
            _ => panic!("expected element root"),
        }
    }

    #[test]
    fn collapses_interior_runs() {
        assert_eq!(collapse_whitespace("a  b"), "a b");
        assert_eq!(collapse_whitespace("a\nb"), "a b");
        assert_eq!(collapse_whitespace("a b"), "a b");
        assert_eq!(collapse_whitespace("  a  "), " a ");
    }

    #[test]
    fn block_to_inline_transition_trims_leading_space() {
        let dom = el("div", vec![DomNode::text("   hello world")]);
        let flow = FlowTreeBuilder::new().build(&dom).unwrap();
        let div = first_element(&flow);
        match div {
            FlowNode::Element { children, .. } => match &children[0] {
                FlowNode::Text(t) => assert_eq!(t, "hello world"),
                other => panic!("unexpected flow node: {other:?}"),
            },
            _ => panic!("expected element"),
        }
    }

    #[test]
    fn whitespace_only_run_becomes_single_space() {
        let dom = el("span", vec![DomNode::text("  \n  ")]);
        let flow = FlowTreeBuilder::new().build(&dom).unwrap();
        match first_element(&flow) {
            FlowNode::Element { children, .. } => match &children[0] {
                FlowNode::Text(t) => assert_eq!(t, " "),
                other => panic!("unexpected flow node: {other:?}"),
            },
            _ => panic!("expected element"),
        }
    }

    #[test]
    fn pre_mode_nests_and_preserves() {
        let mut pre_style = ResolvedStyle::default();
        pre_style.white_space = Some(crate::style::WhiteSpace::Pre);
        let mut normal_style = ResolvedStyle::default();
        normal_style.white_space = Some(crate::style::WhiteSpace::Normal);

        let dom = DomNode::element(
            "pre",
            pre_style,
            vec![
                DomNode::text("a   b\n"),
                DomNode::element("span", normal_style, vec![DomNode::text("c   d")]),
            ],
        );
        let flow = FlowTreeBuilder::new().build(&dom).unwrap();
        match first_element(&flow) {
            FlowNode::Element { children, .. } => {
                match &children[0] {
                    FlowNode::Text(t) => assert_eq!(t, "a   b\n"),
                    other => panic!("unexpected: {other:?}"),
                }
                match &children[1] {
                    FlowNode::Element { children, .. } => match &children[0] {
                        FlowNode::Text(t) => assert_eq!(t, "c d"),
                        other => panic!("unexpected: {other:?}"),
                    },
                    other => panic!("unexpected: {other:?}"),
                }
            }
            _ => panic!("expected element"),
        }
    }

    #[test]
    fn directions_follow_the_tag_table() {
        let dom = el("div", vec![el("span", vec![]), el("p", vec![]), el("custom", vec![])]);
        let flow = FlowTreeBuilder::new().build(&dom).unwrap();
        match first_element(&flow) {
            FlowNode::Element { direction, children, .. } => {
                assert_eq!(*direction, Direction::Block);
                let dirs: Vec<Direction> = children
                    .iter()
                    .map(|c| match c {
                        FlowNode::Element { direction, .. } => *direction,
                        _ => panic!("expected elements"),
                    })
                    .collect();
                // span forces inline, p forces block, custom keeps the
                // direction left behind by its previous sibling.
                assert_eq!(dirs, vec![Direction::Inline, Direction::Block, Direction::Block]);
            }
            _ => panic!("expected element"),
        }
    }

    #[test]
    fn doctype_is_rejected() {
        let dom = el("div", vec![DomNode::Doctype { name: "html".into() }]);
        let err = FlowTreeBuilder::new().build(&dom).unwrap_err();
        assert!(matches!(err, LayoutError::UnsupportedNodeKind(_)));
    }

    #[test]
    fn comments_are_dropped() {
        let dom = el(
            "div",
            vec![
                DomNode::Comment { content: "hidden".into() },
                DomNode::text("visible"),
            ],
        );
        let flow = FlowTreeBuilder::new().build(&dom).unwrap();
        match first_element(&flow) {
            FlowNode::Element { children, .. } => {
                assert_eq!(children.len(), 1);
            }
            _ => panic!("expected element"),
        }
    }
}
