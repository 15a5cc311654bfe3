//! # Pagination Engine
//!
//! Cuts a document's vertical flow into pages. Each page gets its
//! geometry from a page master selected by position (`first`, `left`,
//! `right`, `default`); the cursor runs top-down through the content
//! area, and break directives on boxes steer where the cuts land.
//!
//! The engine guarantees progress: an item taller than the content area
//! is placed anyway on an otherwise empty page and overflows, so a
//! pathological document can never produce an infinite page stream.

pub mod margin_boxes;

use std::collections::HashMap;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::boxes::{FlowItem, Frame, VBox};
use crate::error::{LayoutError, LayoutWarning};
use crate::layout::HeadingEntry;
use crate::style::{BreakRule, Edges, ResolvedStyle, PT_PER_MM};
use crate::text::ParagraphShaper;

use margin_boxes::MarginBoxSpec;

/// A4 portrait, in points.
pub const A4_WIDTH: f64 = 595.28;
pub const A4_HEIGHT: f64 = 841.89;

/// The geometry and decoration of one class of page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageMaster {
    pub width: f64,
    pub height: f64,
    /// The page margin area; margin boxes live inside it.
    pub margin: Edges,
    /// Page-level decoration. Border and padding inset the content area
    /// further; the background covers the whole page.
    pub style: ResolvedStyle,
    pub margin_boxes: Vec<MarginBoxSpec>,
}

impl Default for PageMaster {
    fn default() -> Self {
        Self {
            width: A4_WIDTH,
            height: A4_HEIGHT,
            margin: Edges::uniform(10.0 * PT_PER_MM),
            style: ResolvedStyle::default(),
            margin_boxes: Vec::new(),
        }
    }
}

/// The set of page masters a document paginates against.
///
/// Selection, most specific first: the `first` master applies while no
/// page has shipped yet, then `right` for odd 1-based ordinals and
/// `left` for even ones, then `default`. A document with no masters at
/// all paginates onto built-in A4 pages with 1cm margins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSet {
    pub first: Option<PageMaster>,
    pub left: Option<PageMaster>,
    pub right: Option<PageMaster>,
    #[serde(rename = "default")]
    pub default_master: Option<PageMaster>,
}

impl PageSet {
    /// Select the master for the next page given how many have shipped.
    pub fn select(&self, pages_shipped: usize) -> PageMaster {
        if pages_shipped == 0 {
            if let Some(m) = &self.first {
                return m.clone();
            }
        }
        let ordinal = pages_shipped + 1;
        let parity = if ordinal % 2 == 1 { &self.right } else { &self.left };
        if let Some(m) = parity {
            return m.clone();
        }
        self.default_master.clone().unwrap_or_default()
    }
}

/// Resolved geometry of one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDimensions {
    pub width: f64,
    pub height: f64,
    pub margin: Edges,
    pub content_left: f64,
    pub content_top: f64,
    pub content_width: f64,
    pub content_height: f64,
}

impl PageDimensions {
    /// Compute the content area: page size minus margins, minus the
    /// master's own border and padding insets.
    pub fn of(master: &PageMaster) -> Self {
        let style = &master.style;
        let inset_left = style.border_width.left + style.padding.left;
        let inset_right = style.border_width.right + style.padding.right;
        let inset_top = style.border_width.top + style.padding.top;
        let inset_bottom = style.border_width.bottom + style.padding.bottom;
        Self {
            width: master.width,
            height: master.height,
            margin: master.margin,
            content_left: master.margin.left + inset_left,
            content_top: master.margin.top + inset_top,
            content_width: master.width - master.margin.horizontal() - inset_left - inset_right,
            content_height: master.height - master.margin.vertical() - inset_top - inset_bottom,
        }
    }

    pub fn content_bottom(&self) -> f64 {
        self.content_top + self.content_height
    }
}

/// A flow item placed on a page at absolute coordinates (y grows down).
#[derive(Debug, Clone)]
pub struct PlacedBox {
    pub x: f64,
    pub y: f64,
    pub item: FlowItem,
}

/// One finished page.
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    pub width: f64,
    pub height: f64,
    pub background: Option<crate::style::Color>,
    /// Page-level border decoration from the master.
    pub frame: Option<Frame>,
    pub content: Vec<PlacedBox>,
    pub margin_boxes: Vec<PlacedBox>,
}

/// Callback fired when a fresh page is opened: `(page_number, master)`.
pub type PageCallback = Box<dyn FnMut(usize, &PageMaster)>;

struct OpenPage {
    master: PageMaster,
    dims: PageDimensions,
    content: Vec<PlacedBox>,
    y: f64,
    has_content: bool,
}

/// Cuts a box list into pages.
pub struct Paginator<'a> {
    page_set: &'a PageSet,
    shaper: &'a dyn ParagraphShaper,
    counters: &'a mut HashMap<String, i64>,
    headings: &'a mut [HeadingEntry],
    warnings: &'a mut Vec<LayoutWarning>,
    page_init: Option<&'a mut PageCallback>,
}

impl<'a> Paginator<'a> {
    pub fn new(
        page_set: &'a PageSet,
        shaper: &'a dyn ParagraphShaper,
        counters: &'a mut HashMap<String, i64>,
        headings: &'a mut [HeadingEntry],
        warnings: &'a mut Vec<LayoutWarning>,
    ) -> Self {
        Self {
            page_set,
            shaper,
            counters,
            headings,
            warnings,
            page_init: None,
        }
    }

    pub fn with_page_init(mut self, cb: &'a mut PageCallback) -> Self {
        self.page_init = Some(cb);
        self
    }

    /// Paginate the document's root box. The root is the synthetic
    /// wrapper produced by the box builder; its items are distributed
    /// over pages, the wrapper itself never appears in the output.
    pub fn paginate(&mut self, root: VBox) -> Result<Vec<Page>, LayoutError> {
        // Unwrap undecorated single-child block wrappers (the synthetic
        // root, a lone body element) so page breaking sees the document's
        // block children rather than one indivisible box.
        let mut root = root;
        while root.frame.is_none() && root.list.len() == 1 {
            match &root.list[0] {
                FlowItem::Box(b)
                    if b.frame.is_none() && b.shift == 0.0 && b.attrs.origin == "block" =>
                {
                    root = match root.list.pop() {
                        Some(FlowItem::Box(b)) => b,
                        _ => unreachable!(),
                    };
                }
                _ => break,
            }
        }
        let items = root.list;
        let advances: Vec<f64> = items.iter().map(FlowItem::advance).collect();

        let mut pages: Vec<Page> = Vec::new();
        let mut page = self.open_page(pages.len());
        let mut pending_break = false;

        for (i, item) in items.into_iter().enumerate() {
            let break_before = item.attrs().map(|a| a.break_before).unwrap_or_default();
            let break_after = item.attrs().map(|a| a.break_after).unwrap_or_default();

            if (pending_break || break_before == BreakRule::Always) && page.has_content {
                trace!("forced break before item {i}");
                self.ship(&mut pages, page)?;
                page = self.open_page(pages.len());
            }
            pending_break = false;

            // Keep-with-next widens the fit check to the next two items,
            // so a heading never strands at the bottom of a page.
            let needed = if break_after == BreakRule::Avoid {
                advances[i]
                    + advances.get(i + 1).copied().unwrap_or(0.0)
                    + advances.get(i + 2).copied().unwrap_or(0.0)
            } else {
                advances[i]
            };

            if page.has_content && page.y + needed > page.dims.content_bottom() {
                trace!(
                    "item {i} needs {needed:.2}pt, {:.2}pt left on the page",
                    page.dims.content_bottom() - page.y
                );
                self.ship(&mut pages, page)?;
                page = self.open_page(pages.len());
            }

            if item.is_content() {
                if let Some(idx) = item.attrs().and_then(|a| a.heading_index) {
                    if let Some(h) = self.headings.get_mut(idx) {
                        h.page = pages.len() + 1;
                    }
                }
                let shift = match &item {
                    FlowItem::Box(b) => b.shift,
                    _ => 0.0,
                };
                page.content.push(PlacedBox {
                    x: page.dims.content_left + shift,
                    y: page.y,
                    item,
                });
                page.has_content = true;
            }
            page.y += advances[i];

            if break_after == BreakRule::Always {
                pending_break = true;
            }
        }

        // A trailing forced break never produces a blank page, but a
        // document always ships at least one.
        if page.has_content || pages.is_empty() {
            self.ship(&mut pages, page)?;
        }
        Ok(pages)
    }

    fn open_page(&mut self, pages_shipped: usize) -> OpenPage {
        let master = self.page_set.select(pages_shipped);
        let dims = PageDimensions::of(&master);
        let number = pages_shipped + 1;
        debug!(
            "opening page {number}: {:.2}x{:.2}pt, content area {:.2}x{:.2}pt",
            dims.width, dims.height, dims.content_width, dims.content_height
        );
        if let Some(cb) = self.page_init.as_mut() {
            cb(number, &master);
        }
        OpenPage {
            master,
            dims,
            content: Vec::new(),
            y: dims.content_top,
            has_content: false,
        }
    }

    fn ship(&mut self, pages: &mut Vec<Page>, page: OpenPage) -> Result<(), LayoutError> {
        let number = pages.len() + 1;
        // The page counter tracks the shipping page so margin box content
        // can reference it.
        self.counters.insert("page".to_string(), number as i64);
        let margin_boxes = margin_boxes::generate(
            &page.master,
            &page.dims,
            self.counters,
            self.shaper,
            self.warnings,
        )?;
        debug!("shipping page {number} with {} content items", page.content.len());
        pages.push(Page {
            number,
            width: page.dims.width,
            height: page.dims.height,
            background: page.master.style.background_color,
            frame: Frame::from_style(&page.master.style),
            content: page.content,
            margin_boxes,
        });
        Ok(())
    }
}
