//! Structured error types for the layout engine.
//!
//! Everything here is fail-fast: the first error at any recursion depth
//! aborts the whole build/paginate call chain and is handed back to the
//! caller. The one deliberate exception is content overflow, which is a
//! warning, not an error: layout proceeds and the condition is recorded
//! on the engine for later inspection.

use thiserror::Error;

/// The unified error type returned by all public folio API functions.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// A dimension string could not be parsed (e.g. `"12xy"`).
    #[error("cannot parse length {0:?}")]
    LengthParse(String),

    /// The flow-tree walk encountered a node kind it does not understand.
    #[error("unsupported node kind: {0}")]
    UnsupportedNodeKind(String),

    /// The paragraph or table formatting primitive failed.
    #[error("format error: {0}")]
    Format(String),

    /// An enumerated style value has no recognized mapping
    /// (e.g. `border-style: wavy`).
    #[error("unknown value {value:?} for style property {property}")]
    UnknownStyleValue { property: &'static str, value: String },

    /// The document tree is nested deeper than the configured limit.
    #[error("element nesting exceeds the maximum depth of {0}")]
    NestingTooDeep(usize),

    /// JSON input failed to parse as a folio document.
    #[error("failed to parse document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Non-fatal conditions observed during layout.
///
/// Warnings accumulate on the engine; they never abort a build.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutWarning {
    /// Unbreakable content was wider than the available width. The content
    /// overflows its box instead of failing the build.
    ContentOverflow { needed: f64, available: f64 },
}

impl std::fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutWarning::ContentOverflow { needed, available } => write!(
                f,
                "content overflow: needs {needed:.2}pt but only {available:.2}pt available"
            ),
        }
    }
}
