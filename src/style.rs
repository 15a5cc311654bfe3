//! # Style Model
//!
//! The resolved style a node carries into layout. This crate does not run a
//! CSS cascade; a style engine upstream has already matched selectors and
//! resolved inheritance, and hands us one [`ResolvedStyle`] per element.
//!
//! Every recognized property is a strongly-typed field. There is no
//! stringly-keyed settings dictionary and no downcasting at the point of
//! use: if a value parses, it parses into the one type the layout code
//! reads back out.

use crate::error::LayoutError;
use serde::{Deserialize, Serialize};

/// Points per CSS pixel (the usual 96dpi convention).
const PT_PER_PX: f64 = 72.0 / 96.0;
/// Points per millimeter.
pub const PT_PER_MM: f64 = 72.0 / 25.4;

/// Parse a length string with a unit suffix into points.
///
/// Recognized units: `pt`, `px`, `mm`, `cm`, `in`. A bare number is taken
/// as points.
pub fn parse_length(input: &str) -> Result<f64, LayoutError> {
    let s = input.trim();
    let (number, factor) = if let Some(v) = s.strip_suffix("pt") {
        (v, 1.0)
    } else if let Some(v) = s.strip_suffix("px") {
        (v, PT_PER_PX)
    } else if let Some(v) = s.strip_suffix("mm") {
        (v, PT_PER_MM)
    } else if let Some(v) = s.strip_suffix("cm") {
        (v, PT_PER_MM * 10.0)
    } else if let Some(v) = s.strip_suffix("in") {
        (v, 72.0)
    } else {
        (s, 1.0)
    };
    number
        .trim()
        .parse::<f64>()
        .map(|v| v * factor)
        .map_err(|_| LayoutError::LengthParse(input.to_string()))
}

/// A horizontal measure that is either absolute, relative to the parent,
/// or content-determined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Dimension {
    /// Fixed size in points (1/72 inch).
    Pt(f64),
    /// Percentage of the available width.
    Percent(f64),
    /// Size determined by content.
    Auto,
}

impl Dimension {
    /// Parse a dimension string: `"50%"`, `"12pt"`, `"3cm"`, `"auto"`.
    pub fn parse(input: &str) -> Result<Dimension, LayoutError> {
        let s = input.trim();
        if s.is_empty() || s == "auto" {
            return Ok(Dimension::Auto);
        }
        if let Some(v) = s.strip_suffix('%') {
            return v
                .trim()
                .parse::<f64>()
                .map(Dimension::Percent)
                .map_err(|_| LayoutError::LengthParse(input.to_string()));
        }
        parse_length(s).map(Dimension::Pt)
    }

    /// Resolve against the available width. `Auto` resolves to `None`.
    pub fn resolve(&self, available: f64) -> Option<f64> {
        match self {
            Dimension::Pt(v) => Some(*v),
            Dimension::Percent(p) => Some(available * p / 100.0),
            Dimension::Auto => None,
        }
    }
}

/// Edge values (top, right, bottom, left).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub right: f64,
    #[serde(default)]
    pub bottom: f64,
    #[serde(default)]
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self { top: v, right: v, bottom: v, left: v }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Per-edge values of an arbitrary type (border colors, border styles).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeValues<T> {
    pub top: T,
    pub right: T,
    pub bottom: T,
    pub left: T,
}

impl<T: Copy> EdgeValues<T> {
    pub fn uniform(v: T) -> Self {
        Self { top: v, right: v, bottom: v, left: v }
    }
}

/// Values for each corner, clockwise from top-left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CornerValues {
    #[serde(default)]
    pub top_left: f64,
    #[serde(default)]
    pub top_right: f64,
    #[serde(default)]
    pub bottom_right: f64,
    #[serde(default)]
    pub bottom_left: f64,
}

impl CornerValues {
    pub fn uniform(v: f64) -> Self {
        Self { top_left: v, top_right: v, bottom_right: v, bottom_left: v }
    }
}

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#rgb` or `#rrggbb`. Malformed components fall back to 0.
    pub fn hex(hex: &str) -> Self {
        let hex = hex.trim_start_matches('#');
        let (r, g, b) = match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).unwrap_or(0);
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).unwrap_or(0);
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).unwrap_or(0);
                (r, g, b)
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
                let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
                let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
                (r, g, b)
            }
            _ => (0, 0, 0),
        };
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: 1.0,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// How to draw a border edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BorderStyle {
    #[default]
    None,
    Solid,
    Dashed,
    Dotted,
}

impl BorderStyle {
    /// Parse a CSS border-style keyword. Unrecognized keywords are a
    /// recoverable error, not a panic.
    pub fn parse(value: &str) -> Result<BorderStyle, LayoutError> {
        match value {
            "" | "none" | "hidden" => Ok(BorderStyle::None),
            "solid" => Ok(BorderStyle::Solid),
            "dashed" => Ok(BorderStyle::Dashed),
            "dotted" => Ok(BorderStyle::Dotted),
            other => Err(LayoutError::UnknownStyleValue {
                property: "border-style",
                value: other.to_string(),
            }),
        }
    }
}

/// Page break policy attached to a box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakRule {
    #[default]
    Auto,
    /// Force a break adjacent to this box.
    Always,
    /// Keep this box together with what follows.
    Avoid,
}

/// Whitespace handling for a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhiteSpace {
    Normal,
    Pre,
}

/// Horizontal alignment of formatted lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical alignment inside a fixed-height region (page margin boxes,
/// table cells).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// The complete set of resolved properties the layout engine reads.
///
/// All lengths are in points and already resolved by the upstream style
/// engine; margins are non-negative by contract. Span counts live here as
/// well because the upstream engine folds presentational attributes
/// (`colspan`, `rowspan`, `<col width>`) into the per-node style.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolvedStyle {
    /// True for block containers: this element stacks its children
    /// vertically instead of holding inline content.
    pub is_box: bool,

    /// Explicit width (absolute or percentage).
    pub width: Option<Dimension>,

    // ── Box model ──────────────────────────────────────────────
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub padding: Edges,
    pub border_width: Edges,
    pub border_style: EdgeValues<BorderStyle>,
    pub border_color: EdgeValues<Color>,
    pub border_radius: CornerValues,
    pub background_color: Option<Color>,

    // ── Pagination ─────────────────────────────────────────────
    pub break_before: BreakRule,
    pub break_after: BreakRule,

    // ── Inline content ─────────────────────────────────────────
    /// Content to prepend before the first line (list markers).
    pub prepend: Option<String>,
    /// Explicit whitespace mode; `None` inherits the surrounding mode.
    pub white_space: Option<WhiteSpace>,
    pub font_size: Option<f64>,
    pub text_align: Option<HAlign>,
    pub valign: Option<VAlign>,

    // ── Tables ─────────────────────────────────────────────────
    /// Raw column width spec on a `col` element (`"2cm"`, `"3*"`, `""`).
    pub col_width: Option<String>,
    /// Column span; values below 2 mean a single cell.
    pub colspan: u32,
    /// Row span; values below 2 mean a single cell.
    pub rowspan: u32,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            is_box: false,
            width: None,
            margin_top: 0.0,
            margin_bottom: 0.0,
            padding: Edges::default(),
            border_width: Edges::default(),
            border_style: EdgeValues::uniform(BorderStyle::None),
            border_color: EdgeValues::uniform(Color::BLACK),
            border_radius: CornerValues::uniform(0.0),
            background_color: None,
            break_before: BreakRule::Auto,
            break_after: BreakRule::Auto,
            prepend: None,
            white_space: None,
            font_size: None,
            text_align: None,
            valign: None,
            col_width: None,
            colspan: 1,
            rowspan: 1,
        }
    }
}

impl ResolvedStyle {
    /// A plain block container with no decoration.
    pub fn block() -> Self {
        Self { is_box: true, ..Default::default() }
    }

    /// True if any border edge has a positive width and a drawable style.
    pub fn has_border(&self) -> bool {
        (self.border_width.top > 0.0 && self.border_style.top != BorderStyle::None)
            || (self.border_width.right > 0.0 && self.border_style.right != BorderStyle::None)
            || (self.border_width.bottom > 0.0 && self.border_style.bottom != BorderStyle::None)
            || (self.border_width.left > 0.0 && self.border_style.left != BorderStyle::None)
    }

    /// True if this element needs a decoration pass (border or background).
    pub fn is_decorated(&self) -> bool {
        self.has_border() || self.background_color.is_some()
    }
}

/// One entry of inherited state on the [`StyleStack`].
#[derive(Debug, Clone, Copy)]
pub struct StyleScope {
    pub font_size: f64,
    pub text_align: HAlign,
    pub valign: VAlign,
}

impl Default for StyleScope {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            text_align: HAlign::Left,
            valign: VAlign::Top,
        }
    }
}

/// Scoped inherited style state.
///
/// Every descent into a child element pushes a scope derived from the
/// parent's; every exit pops it, on error paths too. The stack doubles as
/// the nesting-depth guard: exceeding `max_depth` is an error rather than
/// a blown call stack.
#[derive(Debug)]
pub struct StyleStack {
    scopes: Vec<StyleScope>,
    max_depth: usize,
}

impl StyleStack {
    pub fn new(max_depth: usize) -> Self {
        Self { scopes: vec![StyleScope::default()], max_depth }
    }

    /// Push a scope for `style`, inheriting unset properties from the
    /// current scope.
    pub fn push(&mut self, style: &ResolvedStyle) -> Result<(), LayoutError> {
        if self.scopes.len() >= self.max_depth {
            return Err(LayoutError::NestingTooDeep(self.max_depth));
        }
        let cur = self.current();
        self.scopes.push(StyleScope {
            font_size: style.font_size.unwrap_or(cur.font_size),
            text_align: style.text_align.unwrap_or(cur.text_align),
            valign: style.valign.unwrap_or(cur.valign),
        });
        Ok(())
    }

    pub fn pop(&mut self) {
        // The root scope never pops.
        if self.scopes.len() > 1 {
            let _ = self.scopes.pop();
        }
    }

    pub fn current(&self) -> StyleScope {
        *self.scopes.last().expect("style stack always has a root scope")
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}
