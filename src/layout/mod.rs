//! # Box Model Builder
//!
//! Converts a flow tree into a box tree. This is where the CSS box model
//! lives: border-box sizing, vertical margin collapsing, decoration, and
//! the bookkeeping that pagination needs later (break directives, heading
//! indices).
//!
//! Two node classes exist. A *block container* stacks its children with
//! collapsed margins between them. A *leaf container* holds inline
//! content and hands it to the paragraph shaper at its border-box content
//! width. Tables are a third path, dispatched by tag to the table builder
//! in [`table`]; the two builders are mutually recursive because cells
//! hold block content.

pub mod table;

use crate::boxes::{BoxAttrs, FlowItem, Frame, VBox};
use crate::error::{LayoutError, LayoutWarning};
use crate::flow::FlowNode;
use crate::style::{ResolvedStyle, StyleStack};
use crate::text::{ParagraphOptions, ParagraphShaper};

/// A heading seen during box building.
///
/// The index is assigned here, in document order. The page number stays 0
/// until pagination places the heading's box; the same box may be pushed
/// across a page break, so its final page is unknown until then.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingEntry {
    /// Heading level tag: `"h1"` through `"h6"`.
    pub level: String,
    /// Concatenated descendant text.
    pub text: String,
    /// 1-based page number; 0 until assigned during pagination.
    pub page: usize,
}

/// Callback fired once per structural element after its box is built:
/// `(tag, extracted_text, box)`. Purely a notification; it cannot change
/// layout.
pub type ElementCallback = Box<dyn FnMut(&str, &str, &VBox)>;

fn heading_level(tag: &str) -> bool {
    matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

/// Builds [`VBox`] trees from flow nodes.
pub struct BoxBuilder<'a> {
    shaper: &'a dyn ParagraphShaper,
    styles: StyleStack,
    /// Headings in document order; indices are stable once assigned.
    pub headings: Vec<HeadingEntry>,
    /// Non-fatal conditions observed while building.
    pub warnings: Vec<LayoutWarning>,
    element_callback: Option<&'a mut ElementCallback>,
}

impl<'a> BoxBuilder<'a> {
    pub fn new(shaper: &'a dyn ParagraphShaper, max_nesting_depth: usize) -> Self {
        Self {
            shaper,
            styles: StyleStack::new(max_nesting_depth),
            headings: Vec::new(),
            warnings: Vec::new(),
            element_callback: None,
        }
    }

    pub fn with_element_callback(mut self, cb: &'a mut ElementCallback) -> Self {
        self.element_callback = Some(cb);
        self
    }

    /// Build the box for one flow node at the given available width.
    pub fn build(&mut self, node: &FlowNode, width: f64) -> Result<VBox, LayoutError> {
        match node {
            FlowNode::Text(text) => self.build_text(text, width, &ResolvedStyle::default()),
            FlowNode::Element { style, .. } => {
                self.styles.push(style)?;
                let result = self.build_element(node, width);
                self.styles.pop();
                result
            }
        }
    }

    fn build_element(&mut self, node: &FlowNode, width: f64) -> Result<VBox, LayoutError> {
        let (tag, style) = match node {
            FlowNode::Element { tag, style, .. } => (tag.as_str(), style),
            FlowNode::Text(_) => unreachable!("build_element takes elements only"),
        };

        let mut vb = if tag == "table" {
            table::build_table(self, node, width)?
        } else if style.is_box {
            self.build_block(node, width)?
        } else {
            self.build_leaf(node, width)?
        };

        vb.attrs.break_before = style.break_before;
        vb.attrs.break_after = style.break_after;
        vb.attrs.margin_top = style.margin_top;
        // Block containers may already have merged a trailing child margin
        // into their own; don't overwrite it.
        vb.attrs.margin_bottom = vb.attrs.margin_bottom.max(style.margin_bottom);

        if heading_level(tag) {
            let index = self.headings.len();
            vb.attrs.heading_index = Some(index);
            self.headings.push(HeadingEntry {
                level: tag.to_string(),
                text: node.plain_text(),
                page: 0,
            });
        }

        Ok(vb)
    }

    /// Block container: stack children with margin collapsing.
    fn build_block(&mut self, node: &FlowNode, width: f64) -> Result<VBox, LayoutError> {
        let (style, children) = match node {
            FlowNode::Element { style, children, .. } => (style, children),
            FlowNode::Text(_) => unreachable!(),
        };

        let frame = Frame::from_style(style);
        let inner_width = match &frame {
            Some(f) => width - f.horizontal(),
            None => width,
        };
        // Indentation without decoration (lists): children are narrowed by
        // the left padding and shifted right; decoration already accounts
        // for padding through the frame.
        let indent = if frame.is_none() && style.padding.left > 0.0 {
            style.padding.left
        } else {
            0.0
        };
        let child_width = inner_width - indent;

        let mut vb = VBox::new();
        vb.attrs = BoxAttrs {
            origin: "block",
            ..BoxAttrs::default()
        };

        let mut prev_margin_bottom: f64 = 0.0;
        let mut first = true;
        for child in children {
            // Whitespace-only wrappers between blocks would become
            // spurious empty boxes.
            if child.is_whitespace_text() {
                continue;
            }

            let mut child_box = self.build(child, child_width)?;
            let margin_top = child_box.attrs.margin_top;
            let margin_bottom = child_box.attrs.margin_bottom;

            // CSS margin collapsing between siblings: first child keeps
            // its own top margin, later ones get max(prev bottom, top).
            let spacer = if first {
                margin_top
            } else {
                prev_margin_bottom.max(margin_top)
            };
            if spacer > 0.0 {
                vb.push(FlowItem::Kern(spacer));
            }

            if indent > 0.0 {
                child_box.shift += indent;
            }

            if let (Some(cb), FlowNode::Element { tag, .. }) =
                (self.element_callback.as_mut(), child)
            {
                cb(tag, &child.plain_text(), &child_box);
            }

            vb.push(FlowItem::Box(child_box));
            prev_margin_bottom = margin_bottom;
            first = false;
        }

        if let Some(frame) = frame {
            // A border or background blocks margin collapsing through the
            // bottom edge: materialize the trailing margin inside.
            if prev_margin_bottom > 0.0 {
                vb.push(FlowItem::Kern(prev_margin_bottom));
            }
            vb.width = inner_width;
            vb.apply_frame(frame);
        } else {
            // No decoration: the trailing child margin collapses through
            // this box's boundary into whatever follows it.
            vb.attrs.margin_bottom = prev_margin_bottom;
        }

        Ok(vb)
    }

    /// Leaf container: inline content formatted by the shaper.
    fn build_leaf(&mut self, node: &FlowNode, width: f64) -> Result<VBox, LayoutError> {
        let style = match node {
            FlowNode::Element { style, .. } => style,
            FlowNode::Text(_) => unreachable!(),
        };
        self.build_text(&node.plain_text(), width, style)
    }

    fn build_text(
        &mut self,
        text: &str,
        width: f64,
        style: &ResolvedStyle,
    ) -> Result<VBox, LayoutError> {
        let scope = self.styles.current();
        // Border-box sizing: the shaper gets the content width.
        let content_width =
            width - style.border_width.horizontal() - style.padding.horizontal();

        let mut opts = ParagraphOptions::new(scope.font_size);
        opts.align = style.text_align.unwrap_or(scope.text_align);
        opts.prepend = style.prepend.clone();

        let mut vb = self
            .shaper
            .format(text, content_width, &opts, &mut self.warnings)?;
        if let Some(frame) = Frame::from_style(style) {
            vb.apply_frame(frame);
        }
        Ok(vb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{BorderStyle, Color, EdgeValues, Edges};
    use crate::text::SimpleShaper;

    fn para(text: &str) -> FlowNode {
        FlowNode::Element {
            tag: "p".to_string(),
            direction: crate::flow::Direction::Block,
            style: ResolvedStyle::default(),
            children: vec![FlowNode::Text(text.to_string())],
        }
    }

    fn para_with_margins(text: &str, top: f64, bottom: f64) -> FlowNode {
        let mut style = ResolvedStyle::default();
        style.margin_top = top;
        style.margin_bottom = bottom;
        FlowNode::Element {
            tag: "p".to_string(),
            direction: crate::flow::Direction::Block,
            style,
            children: vec![FlowNode::Text(text.to_string())],
        }
    }

    fn block(style: ResolvedStyle, children: Vec<FlowNode>) -> FlowNode {
        let mut style = style;
        style.is_box = true;
        FlowNode::Element {
            tag: "div".to_string(),
            direction: crate::flow::Direction::Block,
            style,
            children,
        }
    }

    fn kerns_of(vb: &VBox) -> Vec<f64> {
        vb.list
            .iter()
            .filter_map(|i| match i {
                FlowItem::Kern(k) => Some(*k),
                _ => None,
            })
            .collect()
    }

    fn build(node: &FlowNode, width: f64) -> VBox {
        let shaper = SimpleShaper::new();
        let mut builder = BoxBuilder::new(&shaper, 64);
        builder.build(node, width).unwrap()
    }

    #[test]
    fn sibling_margins_collapse_to_the_maximum() {
        let node = block(
            ResolvedStyle::default(),
            vec![
                para_with_margins("one", 0.0, 10.0),
                para_with_margins("two", 6.0, 0.0),
            ],
        );
        let vb = build(&node, 200.0);
        // Exactly one spacer between the two paragraphs: 10, not 16 or 6.
        assert_eq!(kerns_of(&vb), vec![10.0]);
    }

    #[test]
    fn first_child_margin_top_is_not_collapsed_away() {
        let node = block(
            ResolvedStyle::default(),
            vec![para_with_margins("only", 8.0, 0.0)],
        );
        let vb = build(&node, 200.0);
        assert_eq!(kerns_of(&vb), vec![8.0]);
    }

    #[test]
    fn trailing_margin_collapses_through_undecorated_container() {
        let node = block(
            ResolvedStyle::default(),
            vec![para_with_margins("last", 0.0, 12.0)],
        );
        let vb = build(&node, 200.0);
        // No kern inside; the margin is handed to the grandparent.
        assert!(kerns_of(&vb).is_empty());
        assert_eq!(vb.attrs.margin_bottom, 12.0);
    }

    #[test]
    fn border_blocks_trailing_margin_collapse() {
        let mut style = ResolvedStyle::default();
        style.border_width = Edges::uniform(1.0);
        style.border_style = EdgeValues::uniform(BorderStyle::Solid);
        let node = block(style, vec![para_with_margins("last", 0.0, 12.0)]);
        let vb = build(&node, 200.0);
        // Kern materialized inside; own margin-bottom stays zero.
        assert_eq!(kerns_of(&vb), vec![12.0]);
        assert_eq!(vb.attrs.margin_bottom, 0.0);
    }

    #[test]
    fn decorated_container_spans_the_full_width() {
        let mut style = ResolvedStyle::default();
        style.background_color = Some(Color::rgb(0.9, 0.9, 0.9));
        let node = block(style, vec![para("x")]);
        let vb = build(&node, 180.0);
        assert_eq!(vb.width, 180.0);
    }

    #[test]
    fn padding_left_indents_children_without_decoration() {
        let mut style = ResolvedStyle::default();
        style.padding.left = 20.0;
        let node = block(style, vec![para("item")]);
        let vb = build(&node, 200.0);
        match &vb.list[0] {
            FlowItem::Box(child) => {
                assert_eq!(child.shift, 20.0);
                assert_eq!(child.width, 180.0);
            }
            other => panic!("expected child box, got {other:?}"),
        }
        // Shift is part of the occupied width.
        assert_eq!(vb.width, 200.0);
    }

    #[test]
    fn headings_get_sequential_indices() {
        let h1 = FlowNode::Element {
            tag: "h1".to_string(),
            direction: crate::flow::Direction::Block,
            style: ResolvedStyle::default(),
            children: vec![FlowNode::Text("Intro".to_string())],
        };
        let h2 = FlowNode::Element {
            tag: "h2".to_string(),
            direction: crate::flow::Direction::Block,
            style: ResolvedStyle::default(),
            children: vec![FlowNode::Text("Detail".to_string())],
        };
        let node = block(ResolvedStyle::default(), vec![h1, para("body"), h2]);

        let shaper = SimpleShaper::new();
        let mut builder = BoxBuilder::new(&shaper, 64);
        let vb = builder.build(&node, 400.0).unwrap();

        assert_eq!(builder.headings.len(), 2);
        assert_eq!(builder.headings[0].level, "h1");
        assert_eq!(builder.headings[0].text, "Intro");
        assert_eq!(builder.headings[0].page, 0);
        assert_eq!(builder.headings[1].level, "h2");

        let heading_indices: Vec<Option<usize>> = vb
            .list
            .iter()
            .filter_map(|i| match i {
                FlowItem::Box(b) => Some(b.attrs.heading_index),
                _ => None,
            })
            .collect();
        assert_eq!(heading_indices, vec![Some(0), None, Some(1)]);
    }

    #[test]
    fn whitespace_only_text_children_are_skipped() {
        let node = block(
            ResolvedStyle::default(),
            vec![
                para("a"),
                FlowNode::Text("  ".to_string()),
                para("b"),
            ],
        );
        let vb = build(&node, 200.0);
        let boxes = vb
            .list
            .iter()
            .filter(|i| matches!(i, FlowItem::Box(_)))
            .count();
        assert_eq!(boxes, 2);
    }

    #[test]
    fn element_callback_fires_per_structural_child() {
        let node = block(ResolvedStyle::default(), vec![para("one"), para("two")]);
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let seen_in_cb = seen.clone();
        let mut cb: ElementCallback = Box::new(move |tag, text, _vb| {
            seen_in_cb.borrow_mut().push((tag.to_string(), text.to_string()));
        });

        let shaper = SimpleShaper::new();
        let mut builder = BoxBuilder::new(&shaper, 64).with_element_callback(&mut cb);
        let _ = builder.build(&node, 200.0).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                ("p".to_string(), "one".to_string()),
                ("p".to_string(), "two".to_string())
            ]
        );
    }

    #[test]
    fn nesting_depth_is_limited() {
        // 5 nested divs against a limit of 3.
        let mut node = para("deep");
        for _ in 0..5 {
            node = block(ResolvedStyle::default(), vec![node]);
        }
        let shaper = SimpleShaper::new();
        let mut builder = BoxBuilder::new(&shaper, 3);
        assert!(matches!(
            builder.build(&node, 200.0),
            Err(LayoutError::NestingTooDeep(3))
        ));
    }
}
