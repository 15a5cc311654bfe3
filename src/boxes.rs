//! # Box Primitives
//!
//! The units of vertical flow: boxes, fixed spacers (kerns), stretchable
//! spacers (glue), and rules. A finished box holds an owned, indexable
//! list of items; there are no sibling links to detach or dangle, the
//! paginator simply takes items by index.
//!
//! Dimensions follow the classic typesetting convention: `height` is the
//! extent above the baseline, `depth` the extent below it, and a box's
//! vertical advance is `height + depth`.

use crate::style::{BreakRule, Color, CornerValues, EdgeValues, Edges, ResolvedStyle};

/// Attributes carried by a box through pagination.
#[derive(Debug, Clone, Default)]
pub struct BoxAttrs {
    /// Which builder produced this box (for debugging/dump output).
    pub origin: &'static str,
    /// Break policy before this box.
    pub break_before: BreakRule,
    /// Break policy after this box.
    pub break_after: BreakRule,
    /// Index into the heading list if this box opens a heading.
    pub heading_index: Option<usize>,
    /// Effective top margin the parent should collapse against.
    pub margin_top: f64,
    /// Effective bottom margin the parent should collapse against. May be
    /// larger than the style's own margin when a trailing child margin
    /// collapsed through this box's boundary.
    pub margin_bottom: f64,
}

/// Border, padding and background decoration applied around a box.
///
/// Applying a frame grows the box by the border and padding extents on
/// all four sides; drawing is a backend concern, so the frame just
/// records what to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub border_width: Edges,
    pub border_style: EdgeValues<crate::style::BorderStyle>,
    pub border_color: EdgeValues<Color>,
    pub border_radius: CornerValues,
    pub padding: Edges,
    pub background: Option<Color>,
}

impl Frame {
    /// Extract the decoration of a style, if it has any border or
    /// background. Padding alone does not warrant a frame.
    pub fn from_style(style: &ResolvedStyle) -> Option<Frame> {
        if !style.is_decorated() {
            return None;
        }
        Some(Frame {
            border_width: style.border_width,
            border_style: style.border_style,
            border_color: style.border_color,
            border_radius: style.border_radius,
            padding: style.padding,
            background: style.background_color,
        })
    }

    /// Total horizontal extent added by this frame.
    pub fn horizontal(&self) -> f64 {
        self.border_width.horizontal() + self.padding.horizontal()
    }

    /// Total vertical extent added by this frame.
    pub fn vertical(&self) -> f64 {
        self.border_width.vertical() + self.padding.vertical()
    }
}

/// One formatted line of inline content.
#[derive(Debug, Clone, PartialEq)]
pub struct LineBox {
    /// The measure the line was formatted to.
    pub width: f64,
    /// Extent above the baseline.
    pub height: f64,
    /// Extent below the baseline.
    pub depth: f64,
    /// Horizontal shift of the line start (alignment, indentation).
    pub indent: f64,
    /// The natural width of the text on this line.
    pub natural_width: f64,
    /// The text content, for callbacks and debugging.
    pub text: String,
}

/// A table cell placed inside a row at a horizontal offset.
#[derive(Debug, Clone)]
pub struct PlacedCell {
    /// Horizontal offset of the cell from the row start.
    pub x: f64,
    /// Vertical offset inside the row (cell vertical alignment).
    pub y: f64,
    pub vbox: VBox,
}

/// One laid-out table row: cells side by side at resolved offsets.
#[derive(Debug, Clone)]
pub struct RowBox {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub cells: Vec<PlacedCell>,
}

/// An item in a vertical list.
#[derive(Debug, Clone)]
pub enum FlowItem {
    /// A nested box.
    Box(VBox),
    /// A formatted line.
    Line(LineBox),
    /// A table row.
    Row(RowBox),
    /// A fixed vertical spacer.
    Kern(f64),
    /// A stretchable vertical spacer.
    Glue { width: f64, stretch: f64 },
    /// A horizontal rule.
    Rule { width: f64, thickness: f64 },
}

impl FlowItem {
    /// Vertical advance of this item.
    pub fn advance(&self) -> f64 {
        match self {
            FlowItem::Box(b) => b.height + b.depth,
            FlowItem::Line(l) => l.height + l.depth,
            FlowItem::Row(r) => r.height + r.depth,
            FlowItem::Kern(k) => *k,
            FlowItem::Glue { width, .. } => *width,
            FlowItem::Rule { thickness, .. } => *thickness,
        }
    }

    /// True for items that count as real page content. Pure spacing does
    /// not keep a page "occupied" for break decisions.
    pub fn is_content(&self) -> bool {
        matches!(
            self,
            FlowItem::Box(_) | FlowItem::Line(_) | FlowItem::Row(_) | FlowItem::Rule { .. }
        )
    }

    pub fn attrs(&self) -> Option<&BoxAttrs> {
        match self {
            FlowItem::Box(b) => Some(&b.attrs),
            _ => None,
        }
    }
}

/// A vertical list box: the unit of document flow.
#[derive(Debug, Clone, Default)]
pub struct VBox {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    /// Horizontal shift applied when the box is placed (indentation).
    pub shift: f64,
    pub list: Vec<FlowItem>,
    pub attrs: BoxAttrs,
    pub frame: Option<Frame>,
}

impl VBox {
    pub fn new() -> Self {
        VBox::default()
    }

    /// Pack a sequence of items into a box: the height accumulates every
    /// advance except the final depth, the width is the widest item.
    pub fn vpack(items: Vec<FlowItem>) -> VBox {
        let mut vb = VBox::new();
        for item in items {
            vb.push(item);
        }
        vb
    }

    /// Append an item, growing the box dimensions.
    pub fn push(&mut self, item: FlowItem) {
        match &item {
            FlowItem::Box(b) => {
                self.height += self.depth + b.height;
                self.depth = b.depth;
                self.width = self.width.max(b.width + b.shift);
            }
            FlowItem::Line(l) => {
                self.height += self.depth + l.height;
                self.depth = l.depth;
                self.width = self.width.max(l.width);
            }
            FlowItem::Row(r) => {
                self.height += self.depth + r.height;
                self.depth = r.depth;
                self.width = self.width.max(r.width);
            }
            FlowItem::Kern(k) => {
                self.height += self.depth + k;
                self.depth = 0.0;
            }
            FlowItem::Glue { width, .. } => {
                self.height += self.depth + width;
                self.depth = 0.0;
            }
            FlowItem::Rule { width, thickness } => {
                self.height += self.depth + thickness;
                self.depth = 0.0;
                self.width = self.width.max(*width);
            }
        }
        self.list.push(item);
    }

    /// Total vertical advance.
    pub fn advance(&self) -> f64 {
        self.height + self.depth
    }

    /// Wrap this box in a decoration frame. The frame's border and
    /// padding extents are added back onto the box dimensions, restoring
    /// border-box sizing: content width plus frame equals the width the
    /// builder was offered.
    pub fn apply_frame(&mut self, frame: Frame) {
        self.width += frame.horizontal();
        self.height += frame.border_width.top + frame.padding.top;
        self.height += frame.border_width.bottom + frame.padding.bottom;
        self.frame = Some(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(h: f64, d: f64, w: f64) -> FlowItem {
        FlowItem::Line(LineBox {
            width: w,
            height: h,
            depth: d,
            indent: 0.0,
            natural_width: w,
            text: String::new(),
        })
    }

    #[test]
    fn vpack_accumulates_heights_and_keeps_last_depth() {
        let vb = VBox::vpack(vec![line(10.0, 2.0, 100.0), line(10.0, 3.0, 80.0)]);
        assert_eq!(vb.height, 22.0); // 10 + 2 + 10
        assert_eq!(vb.depth, 3.0);
        assert_eq!(vb.width, 100.0);
        assert_eq!(vb.advance(), 25.0);
    }

    #[test]
    fn kerns_advance_without_content() {
        let k = FlowItem::Kern(12.0);
        assert_eq!(k.advance(), 12.0);
        assert!(!k.is_content());
        assert!(line(10.0, 0.0, 10.0).is_content());
    }

    #[test]
    fn frame_restores_border_box_sizing() {
        let mut style = ResolvedStyle::default();
        style.border_width = Edges::uniform(2.0);
        style.border_style = EdgeValues::uniform(crate::style::BorderStyle::Solid);
        style.padding = Edges::uniform(3.0);

        let frame = Frame::from_style(&style).expect("bordered style has a frame");
        let mut vb = VBox::vpack(vec![line(10.0, 0.0, 90.0)]);
        vb.apply_frame(frame);
        assert_eq!(vb.width, 100.0);
        assert_eq!(vb.height, 20.0); // 10 + (2+3) top + (2+3) bottom
    }

    #[test]
    fn undecorated_style_has_no_frame() {
        let mut style = ResolvedStyle::default();
        style.padding = Edges::uniform(5.0);
        assert!(Frame::from_style(&style).is_none());
    }
}
