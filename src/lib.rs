//! # folio
//!
//! A paged-media layout engine: flows a styled document tree into
//! fixed-geometry pages.
//!
//! The pipeline has four stages, each usable on its own:
//!
//! 1. [`flow`] normalizes the parsed input tree into a flow tree:
//!    whitespace collapsed, every element classified as block or inline
//!    material.
//! 2. [`layout`] converts the flow tree into a box tree with border-box
//!    sizing, collapsed vertical margins, and table layout.
//! 3. [`page`] cuts the box tree into pages against a set of page
//!    masters, honoring break directives.
//! 4. Margin boxes (running headers, footers, page numbers) are
//!    generated as each page ships, with counter values evaluated live.
//!
//! [`Engine`] wires the stages together:
//!
//! ```
//! use folio::{dom::DomNode, style::ResolvedStyle, Engine};
//!
//! let doc = DomNode::element(
//!     "body",
//!     ResolvedStyle::block(),
//!     vec![DomNode::element(
//!         "p",
//!         ResolvedStyle::default(),
//!         vec![DomNode::text("Hello, page one.")],
//!     )],
//! );
//! let mut engine = Engine::new();
//! let pages = engine.paginate_document(&doc).unwrap();
//! assert_eq!(pages.len(), 1);
//! ```

pub mod boxes;
pub mod dom;
pub mod error;
pub mod flow;
pub mod layout;
pub mod page;
pub mod style;
pub mod text;

use std::collections::HashMap;

use serde::Deserialize;

use boxes::VBox;
use dom::DomNode;
use flow::FlowTreeBuilder;
use layout::{BoxBuilder, ElementCallback, HeadingEntry};
use page::{Page, PageCallback, PageDimensions, PageSet, Paginator};
use text::{ParagraphShaper, SimpleShaper};

pub use error::{LayoutError, LayoutWarning};

/// Default limit on element nesting depth.
const DEFAULT_MAX_NESTING_DEPTH: usize = 256;

/// A complete document as one JSON value: page masters, initial
/// counters, and the body tree.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInput {
    #[serde(default)]
    pub page_set: PageSet,
    #[serde(default)]
    pub counters: HashMap<String, i64>,
    pub body: DomNode,
}

/// The layout engine: owns the page set, the counter table, and the
/// paragraph shaper, and accumulates headings and warnings across a run.
pub struct Engine {
    pub page_set: PageSet,
    /// Named counters readable from margin box content. The `page`
    /// counter is maintained by the engine; everything else is caller
    /// territory.
    pub counters: HashMap<String, i64>,
    /// Headings seen in the last run, with resolved page numbers.
    pub headings: Vec<HeadingEntry>,
    /// Non-fatal conditions from the last run.
    pub warnings: Vec<LayoutWarning>,
    max_nesting_depth: usize,
    shaper: Box<dyn ParagraphShaper>,
    element_callback: Option<ElementCallback>,
    page_init: Option<PageCallback>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            page_set: PageSet::default(),
            counters: HashMap::new(),
            headings: Vec::new(),
            warnings: Vec::new(),
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            shaper: Box::new(SimpleShaper::new()),
            element_callback: None,
            page_init: None,
        }
    }

    /// Replace the bundled shaper with a real text formatter.
    pub fn with_shaper(mut self, shaper: Box<dyn ParagraphShaper>) -> Self {
        self.shaper = shaper;
        self
    }

    pub fn with_page_set(mut self, page_set: PageSet) -> Self {
        self.page_set = page_set;
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Observe each structural element's finished box during layout.
    pub fn on_element(&mut self, cb: impl FnMut(&str, &str, &VBox) + 'static) {
        self.element_callback = Some(Box::new(cb));
    }

    /// Observe each page as it is opened.
    pub fn on_page(&mut self, cb: impl FnMut(usize, &page::PageMaster) + 'static) {
        self.page_init = Some(Box::new(cb));
    }

    pub fn set_counter(&mut self, name: &str, value: i64) {
        self.counters.insert(name.to_string(), value);
    }

    /// Build the document's box tree without paginating it. The content
    /// width comes from the first page's master.
    pub fn build_document_box(&mut self, doc: &DomNode) -> Result<VBox, LayoutError> {
        // Headings and warnings describe one run, not the engine's life.
        self.headings.clear();
        self.warnings.clear();
        let flow = FlowTreeBuilder::new().build(doc)?;
        let dims = PageDimensions::of(&self.page_set.select(0));

        let shaper = self.shaper.as_ref();
        let mut builder = BoxBuilder::new(shaper, self.max_nesting_depth);
        if let Some(cb) = self.element_callback.as_mut() {
            builder = builder.with_element_callback(cb);
        }
        let root = builder.build(&flow, dims.content_width)?;
        self.headings = builder.headings;
        self.warnings.extend(builder.warnings);
        Ok(root)
    }

    /// Lay out and paginate a whole document.
    pub fn paginate_document(&mut self, doc: &DomNode) -> Result<Vec<Page>, LayoutError> {
        let root = self.build_document_box(doc)?;

        let mut paginator = Paginator::new(
            &self.page_set,
            self.shaper.as_ref(),
            &mut self.counters,
            &mut self.headings,
            &mut self.warnings,
        );
        if let Some(cb) = self.page_init.as_mut() {
            paginator = paginator.with_page_init(cb);
        }
        paginator.paginate(root)
    }

    /// Parse a JSON document and paginate it. The input's page set
    /// replaces the engine's; its counters merge over the engine's.
    pub fn paginate_json(&mut self, json: &str) -> Result<Vec<Page>, LayoutError> {
        let input: DocumentInput = serde_json::from_str(json)?;
        self.page_set = input.page_set;
        self.counters.extend(input.counters);
        self.paginate_document(&input.body)
    }
}
