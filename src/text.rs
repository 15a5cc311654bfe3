//! # Paragraph Formatting Seam
//!
//! Real text formatting (shaping, hyphenation, justification) is an
//! external collaborator. The layout engine only needs something that can
//! turn a text run into a stack of lines of a given measure, so that seam
//! is a trait.
//!
//! [`SimpleShaper`] is the bundled implementation: greedy first-fit line
//! breaking over a fixed per-character advance. It is deterministic and
//! metric-approximate on purpose; swap in a real shaper behind the same
//! trait for production typography.

use crate::boxes::{FlowItem, LineBox, VBox};
use crate::error::{LayoutError, LayoutWarning};
use crate::style::HAlign;

/// Options for one paragraph formatting call.
#[derive(Debug, Clone)]
pub struct ParagraphOptions {
    pub font_size: f64,
    pub align: HAlign,
    /// Content placed before the first line (list markers).
    pub prepend: Option<String>,
    /// Line height as a multiple of the font size.
    pub line_height: f64,
}

impl ParagraphOptions {
    pub fn new(font_size: f64) -> Self {
        Self {
            font_size,
            align: HAlign::Left,
            prepend: None,
            line_height: 1.2,
        }
    }
}

/// Formats a text run into a vertical list of lines.
pub trait ParagraphShaper {
    /// Format `text` into lines of measure `width`. Content wider than
    /// the measure overflows and is reported through `warnings`; only a
    /// genuinely impossible request (e.g. a non-finite measure) is an
    /// error.
    fn format(
        &self,
        text: &str,
        width: f64,
        opts: &ParagraphOptions,
        warnings: &mut Vec<LayoutWarning>,
    ) -> Result<VBox, LayoutError>;
}

/// Greedy line breaker with a flat character metric.
///
/// Every character advances by `advance_ratio × font_size`. The default
/// ratio of 0.5 approximates an average text face; tests rely on the
/// arithmetic being exact.
#[derive(Debug, Clone)]
pub struct SimpleShaper {
    pub advance_ratio: f64,
    /// Ascent as a fraction of the line height.
    pub ascent_ratio: f64,
}

impl Default for SimpleShaper {
    fn default() -> Self {
        Self {
            advance_ratio: 0.5,
            ascent_ratio: 0.8,
        }
    }
}

impl SimpleShaper {
    pub fn new() -> Self {
        Self::default()
    }

    fn text_width(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * self.advance_ratio * font_size
    }
}

impl ParagraphShaper for SimpleShaper {
    fn format(
        &self,
        text: &str,
        width: f64,
        opts: &ParagraphOptions,
        warnings: &mut Vec<LayoutWarning>,
    ) -> Result<VBox, LayoutError> {
        if !width.is_finite() {
            return Err(LayoutError::Format(format!(
                "cannot format paragraph to a measure of {width}"
            )));
        }
        let measure = width.max(0.0);
        let line_height = opts.font_size * opts.line_height;
        let ascent = line_height * self.ascent_ratio;
        let descent = line_height - ascent;

        // The list marker joins the first line.
        let full_text = match &opts.prepend {
            Some(marker) => format!("{marker} {text}"),
            None => text.to_string(),
        };

        let mut lines: Vec<String> = Vec::new();
        let mut current = String::new();
        for word in full_text.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if self.text_width(&candidate, opts.font_size) <= measure || current.is_empty() {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            }
        }
        if !current.is_empty() || lines.is_empty() {
            lines.push(current);
        }

        let mut items = Vec::with_capacity(lines.len());
        for text in lines {
            let natural = self.text_width(&text, opts.font_size);
            if natural > measure {
                warnings.push(LayoutWarning::ContentOverflow {
                    needed: natural,
                    available: measure,
                });
            }
            let slack = (measure - natural).max(0.0);
            let indent = match opts.align {
                HAlign::Left => 0.0,
                HAlign::Center => slack / 2.0,
                HAlign::Right => slack,
            };
            items.push(FlowItem::Line(LineBox {
                width: measure,
                height: ascent,
                depth: descent,
                indent,
                natural_width: natural,
                text,
            }));
        }

        let mut vb = VBox::vpack(items);
        vb.width = measure;
        vb.attrs.origin = "paragraph";
        Ok(vb)
    }
}
