//! # Page Margin Boxes
//!
//! Running headers, footers and side notes live in the page margin area,
//! carved into sixteen regions: one box in each corner and three along
//! each edge. A master declares content for any subset of them; content
//! is a token list evaluated against the live counter table at the
//! moment the page ships, which is what makes "page 3 of 12" work.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::boxes::{FlowItem, Frame, VBox};
use crate::error::{LayoutError, LayoutWarning};
use crate::style::{Edges, ResolvedStyle, VAlign};
use crate::text::{ParagraphOptions, ParagraphShaper};

use super::{PageDimensions, PageMaster, PlacedBox};

/// Default font size for margin box content, smaller than body text as
/// running headers usually are.
const DEFAULT_FONT_SIZE: f64 = 10.0;

/// One of the sixteen margin regions of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    TopLeftCorner,
    TopLeft,
    TopCenter,
    TopRight,
    TopRightCorner,
    LeftTop,
    LeftMiddle,
    LeftBottom,
    RightTop,
    RightMiddle,
    RightBottom,
    BottomLeftCorner,
    BottomLeft,
    BottomCenter,
    BottomRight,
    BottomRightCorner,
}

/// A piece of margin box content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentToken {
    /// Verbatim text.
    Literal { text: String },
    /// The current value of a named counter. An unset counter reads 0.
    Counter { name: String },
}

/// Evaluate a token list against the counter table.
pub fn evaluate(tokens: &[ContentToken], counters: &HashMap<String, i64>) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            ContentToken::Literal { text } => out.push_str(text),
            ContentToken::Counter { name } => {
                let value = counters.get(name).copied().unwrap_or(0);
                out.push_str(&value.to_string());
            }
        }
    }
    out
}

/// Declaration of one margin box on a page master.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginBoxSpec {
    pub region: Region,
    /// `None` leaves the region empty, matching an undeclared box.
    #[serde(default)]
    pub content: Option<Vec<ContentToken>>,
    #[serde(default)]
    pub style: ResolvedStyle,
    /// Insets shrinking the region before content is laid into it.
    #[serde(default)]
    pub margin: Edges,
}

/// The rectangle of a region on the page, y growing down.
/// Corners take the margin intersection; edge boxes split the span
/// between the corners into thirds.
fn region_rect(region: Region, dims: &PageDimensions) -> (f64, f64, f64, f64) {
    let w = dims.width;
    let h = dims.height;
    let m = dims.margin;
    let span = w - m.horizontal();
    let vspan = h - m.vertical();
    let third = span / 3.0;
    let vthird = vspan / 3.0;

    match region {
        Region::TopLeftCorner => (0.0, 0.0, m.left, m.top),
        Region::TopLeft => (m.left, 0.0, third, m.top),
        Region::TopCenter => (m.left + third, 0.0, third, m.top),
        Region::TopRight => (m.left + 2.0 * third, 0.0, third, m.top),
        Region::TopRightCorner => (w - m.right, 0.0, m.right, m.top),

        Region::LeftTop => (0.0, m.top, m.left, vthird),
        Region::LeftMiddle => (0.0, m.top + vthird, m.left, vthird),
        Region::LeftBottom => (0.0, m.top + 2.0 * vthird, m.left, vthird),
        Region::RightTop => (w - m.right, m.top, m.right, vthird),
        Region::RightMiddle => (w - m.right, m.top + vthird, m.right, vthird),
        Region::RightBottom => (w - m.right, m.top + 2.0 * vthird, m.right, vthird),

        Region::BottomLeftCorner => (0.0, h - m.bottom, m.left, m.bottom),
        Region::BottomLeft => (m.left, h - m.bottom, third, m.bottom),
        Region::BottomCenter => (m.left + third, h - m.bottom, third, m.bottom),
        Region::BottomRight => (m.left + 2.0 * third, h - m.bottom, third, m.bottom),
        Region::BottomRightCorner => (w - m.right, h - m.bottom, m.right, m.bottom),
    }
}

/// Generate the placed margin boxes for one shipping page.
pub fn generate(
    master: &PageMaster,
    dims: &PageDimensions,
    counters: &HashMap<String, i64>,
    shaper: &dyn ParagraphShaper,
    warnings: &mut Vec<LayoutWarning>,
) -> Result<Vec<PlacedBox>, LayoutError> {
    let mut out = Vec::new();
    for spec in &master.margin_boxes {
        let tokens = match &spec.content {
            Some(tokens) => tokens,
            None => continue,
        };
        let (mut x, mut y, mut w, mut h) = region_rect(spec.region, dims);
        x += spec.margin.left;
        y += spec.margin.top;
        w -= spec.margin.horizontal();
        h -= spec.margin.vertical();
        if w <= 0.0 || h <= 0.0 {
            continue;
        }

        let text = evaluate(tokens, counters);
        let style = &spec.style;

        // Content that evaluates to nothing still reserves the region:
        // an empty box of the declared size, no lines.
        let mut vb;
        if text.is_empty() {
            vb = VBox::new();
            vb.width = w;
            vb.height = h;
        } else {
            let content_width =
                w - style.border_width.horizontal() - style.padding.horizontal();
            let mut opts = ParagraphOptions::new(style.font_size.unwrap_or(DEFAULT_FONT_SIZE));
            opts.align = style.text_align.unwrap_or_default();

            vb = shaper.format(&text, content_width, &opts, warnings)?;
            if let Some(frame) = Frame::from_style(style) {
                vb.apply_frame(frame);
            }
        }

        // Vertical alignment inside the region's fixed height.
        let slack = (h - vb.advance()).max(0.0);
        let dy = match style.valign.unwrap_or_default() {
            VAlign::Top => 0.0,
            VAlign::Middle => slack / 2.0,
            VAlign::Bottom => slack,
        };
        vb.attrs.origin = "margin-box";
        out.push(PlacedBox {
            x,
            y: y + dy,
            item: FlowItem::Box(vb),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::SimpleShaper;

    fn literal(text: &str) -> ContentToken {
        ContentToken::Literal { text: text.to_string() }
    }

    fn counter(name: &str) -> ContentToken {
        ContentToken::Counter { name: name.to_string() }
    }

    fn dims_200x300_margin20() -> PageDimensions {
        PageDimensions::of(&PageMaster {
            width: 200.0,
            height: 300.0,
            margin: Edges::uniform(20.0),
            ..PageMaster::default()
        })
    }

    #[test]
    fn evaluates_literals_and_counters() {
        let mut counters = HashMap::new();
        counters.insert("page".to_string(), 3i64);
        counters.insert("pages".to_string(), 12i64);
        let tokens = vec![
            literal("page "),
            counter("page"),
            literal(" of "),
            counter("pages"),
        ];
        assert_eq!(evaluate(&tokens, &counters), "page 3 of 12");
    }

    #[test]
    fn unset_counters_read_zero() {
        let tokens = vec![counter("chapter")];
        assert_eq!(evaluate(&tokens, &HashMap::new()), "0");
    }

    #[test]
    fn region_geometry_covers_the_margin_area() {
        let dims = dims_200x300_margin20();
        assert_eq!(region_rect(Region::TopLeftCorner, &dims), (0.0, 0.0, 20.0, 20.0));
        assert_eq!(
            region_rect(Region::BottomRightCorner, &dims),
            (180.0, 280.0, 20.0, 20.0)
        );
        // 160pt between the corners, split into thirds.
        let (x, y, w, h) = region_rect(Region::TopCenter, &dims);
        assert_eq!(y, 0.0);
        assert_eq!(h, 20.0);
        assert!((w - 160.0 / 3.0).abs() < 1e-9);
        assert!((x - (20.0 + 160.0 / 3.0)).abs() < 1e-9);
        // Side boxes split the 260pt between top and bottom margins.
        let (x, y, w, h) = region_rect(Region::LeftMiddle, &dims);
        assert_eq!(x, 0.0);
        assert_eq!(w, 20.0);
        assert!((h - 260.0 / 3.0).abs() < 1e-9);
        assert!((y - (20.0 + 260.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn undeclared_content_produces_no_box() {
        let master = PageMaster {
            width: 200.0,
            height: 300.0,
            margin: Edges::uniform(20.0),
            margin_boxes: vec![MarginBoxSpec {
                region: Region::TopCenter,
                content: None,
                style: ResolvedStyle::default(),
                margin: Edges::default(),
            }],
            ..PageMaster::default()
        };
        let dims = PageDimensions::of(&master);
        let shaper = SimpleShaper::new();
        let mut warnings = Vec::new();
        let boxes =
            generate(&master, &dims, &HashMap::new(), &shaper, &mut warnings).unwrap();
        assert!(boxes.is_empty());
    }

    #[test]
    fn spec_margin_shrinks_the_region() {
        let master = PageMaster {
            width: 200.0,
            height: 300.0,
            margin: Edges::uniform(20.0),
            margin_boxes: vec![MarginBoxSpec {
                region: Region::TopLeftCorner,
                content: Some(vec![literal("x")]),
                style: ResolvedStyle::default(),
                margin: Edges::uniform(4.0),
            }],
            ..PageMaster::default()
        };
        let dims = PageDimensions::of(&master);
        let shaper = SimpleShaper::new();
        let mut warnings = Vec::new();
        let boxes =
            generate(&master, &dims, &HashMap::new(), &shaper, &mut warnings).unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].x, 4.0);
        match &boxes[0].item {
            FlowItem::Box(vb) => assert_eq!(vb.width, 12.0),
            other => panic!("expected box, got {other:?}"),
        }
    }

    #[test]
    fn bottom_aligned_content_sits_at_the_region_floor() {
        let mut style = ResolvedStyle::default();
        style.valign = Some(VAlign::Bottom);
        style.font_size = Some(10.0); // 12pt line height
        let master = PageMaster {
            width: 200.0,
            height: 300.0,
            margin: Edges::uniform(20.0),
            margin_boxes: vec![MarginBoxSpec {
                region: Region::TopCenter,
                content: Some(vec![literal("hdr")]),
                style,
                margin: Edges::default(),
            }],
            ..PageMaster::default()
        };
        let dims = PageDimensions::of(&master);
        let shaper = SimpleShaper::new();
        let mut warnings = Vec::new();
        let boxes =
            generate(&master, &dims, &HashMap::new(), &shaper, &mut warnings).unwrap();
        // One 12pt line in a 20pt tall region leaves 8pt of slack.
        assert!((boxes[0].y - 8.0).abs() < 1e-9);
    }

    #[test]
    fn empty_content_reserves_the_declared_region_size() {
        // A counter-free literal that evaluates to "" still claims its
        // region: an empty box at the region's full size.
        let master = PageMaster {
            width: 200.0,
            height: 300.0,
            margin: Edges::uniform(20.0),
            margin_boxes: vec![MarginBoxSpec {
                region: Region::TopLeftCorner,
                content: Some(vec![literal("")]),
                style: ResolvedStyle::default(),
                margin: Edges::default(),
            }],
            ..PageMaster::default()
        };
        let dims = PageDimensions::of(&master);
        let shaper = SimpleShaper::new();
        let mut warnings = Vec::new();
        let boxes =
            generate(&master, &dims, &HashMap::new(), &shaper, &mut warnings).unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].y, 0.0);
        match &boxes[0].item {
            FlowItem::Box(vb) => {
                assert_eq!(vb.width, 20.0);
                assert_eq!(vb.advance(), 20.0);
                assert!(vb.list.is_empty());
            }
            other => panic!("expected box, got {other:?}"),
        }
    }

    #[test]
    fn token_lists_round_trip_through_json() {
        let json = r#"[{"type":"literal","text":"p. "},{"type":"counter","name":"page"}]"#;
        let tokens: Vec<ContentToken> = serde_json::from_str(json).unwrap();
        assert_eq!(tokens, vec![literal("p. "), counter("page")]);
    }
}
