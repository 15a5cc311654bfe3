//! # Table Layout Builder
//!
//! Assembles a table model from the flow tree (column specs, header and
//! body rows, spans, per-cell box-model properties), then lays it out:
//! fixed columns keep their width, proportional (`*`) columns share the
//! leftover, row heights come from the tallest cell. Cell content goes
//! back through the box model builder at the cell's resolved content
//! width, so nested lists and tables inside cells just work.

use crate::boxes::{FlowItem, Frame, PlacedCell, RowBox, VBox};
use crate::error::LayoutError;
use crate::flow::FlowNode;
use crate::style::{parse_length, Dimension, ResolvedStyle, VAlign};

use super::BoxBuilder;

/// A column width specification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnSpec {
    /// Fixed width in points.
    Fixed(f64),
    /// Proportional share of the leftover width.
    Star(f64),
}

/// Parse a `col` width spec.
///
/// A trailing `*` with an optional multiplier is a proportional share
/// (`"2*"`, `"*"`); a parsable length is fixed; anything else, the empty
/// string included, is auto, i.e. a share of weight 1.
pub fn parse_column_spec(input: &str) -> ColumnSpec {
    let s = input.trim();
    if s.is_empty() {
        return ColumnSpec::Star(1.0);
    }
    if let Some(head) = s.strip_suffix('*') {
        let weight = head.trim();
        if weight.is_empty() {
            return ColumnSpec::Star(1.0);
        }
        return weight
            .parse::<f64>()
            .map(ColumnSpec::Star)
            .unwrap_or(ColumnSpec::Star(1.0));
    }
    parse_length(s)
        .map(ColumnSpec::Fixed)
        .unwrap_or(ColumnSpec::Star(1.0))
}

/// Resolve column widths against a total: fixed columns first, stars
/// share what remains by weight.
pub fn resolve_column_widths(specs: &[ColumnSpec], total: f64) -> Vec<f64> {
    let fixed_sum: f64 = specs
        .iter()
        .filter_map(|s| match s {
            ColumnSpec::Fixed(w) => Some(*w),
            ColumnSpec::Star(_) => None,
        })
        .sum();
    let star_sum: f64 = specs
        .iter()
        .filter_map(|s| match s {
            ColumnSpec::Star(w) => Some(*w),
            ColumnSpec::Fixed(_) => None,
        })
        .sum();
    let leftover = (total - fixed_sum).max(0.0);

    specs
        .iter()
        .map(|s| match s {
            ColumnSpec::Fixed(w) => *w,
            ColumnSpec::Star(w) => {
                if star_sum > 0.0 {
                    leftover * w / star_sum
                } else {
                    0.0
                }
            }
        })
        .collect()
}

/// One cell, pre-layout. Span counts store the units *beyond* one, so a
/// plain cell is `(0, 0)`.
struct CellModel<'a> {
    extra_colspan: u32,
    extra_rowspan: u32,
    style: &'a ResolvedStyle,
    content: &'a [FlowNode],
}

struct RowModel<'a> {
    cells: Vec<CellModel<'a>>,
}

/// The assembled input model for table layout.
struct TableModel<'a> {
    max_width: f64,
    /// Distribute residual width among proportional columns.
    stretch: bool,
    columns: Vec<ColumnSpec>,
    rows: Vec<RowModel<'a>>,
}

/// Build the box for a `table` element.
pub(crate) fn build_table(
    builder: &mut BoxBuilder<'_>,
    node: &FlowNode,
    width: f64,
) -> Result<VBox, LayoutError> {
    let (style, children) = match node {
        FlowNode::Element { style, children, .. } => (style, children),
        FlowNode::Text(_) => unreachable!("tables are elements"),
    };

    let mut model = TableModel {
        max_width: width,
        stretch: false,
        columns: Vec::new(),
        rows: Vec::new(),
    };

    match style.width {
        Some(Dimension::Percent(p)) => {
            model.max_width = width * p / 100.0;
            model.stretch = true;
        }
        Some(Dimension::Pt(w)) => {
            model.max_width = w.min(width);
            model.stretch = true;
        }
        Some(Dimension::Auto) | None => {}
    }

    // Column specs first, then all header groups, then all body groups,
    // each in document order. Multiple thead/tbody groups concatenate.
    for child in children {
        if let FlowNode::Element { tag, children, .. } = child {
            if tag == "colgroup" {
                collect_column_specs(children, &mut model.columns);
            }
        }
    }
    for child in children {
        if let FlowNode::Element { tag, children, .. } = child {
            if tag == "thead" {
                collect_rows(children, &mut model.rows);
            }
        }
    }
    for child in children {
        match child {
            FlowNode::Element { tag, children: group, .. } if tag == "tbody" || tag == "tfoot" => {
                collect_rows(group, &mut model.rows);
            }
            // Bare rows directly under <table>.
            FlowNode::Element { tag, .. } if tag == "tr" => {
                if let Some(row) = collect_row(child) {
                    model.rows.push(row);
                }
            }
            _ => {}
        }
    }

    let mut vb = layout_table(builder, &model)?;
    vb.attrs.origin = "table";
    if let Some(frame) = Frame::from_style(style) {
        vb.apply_frame(frame);
    }
    Ok(vb)
}

fn collect_column_specs(children: &[FlowNode], columns: &mut Vec<ColumnSpec>) {
    for child in children {
        if let FlowNode::Element { tag, style, .. } = child {
            if tag == "col" {
                let spec = style.col_width.as_deref().unwrap_or("");
                columns.push(parse_column_spec(spec));
            }
        }
    }
}

fn collect_rows<'a>(children: &'a [FlowNode], rows: &mut Vec<RowModel<'a>>) {
    for child in children {
        if child.tag() == Some("tr") {
            if let Some(row) = collect_row(child) {
                rows.push(row);
            }
        }
    }
}

fn collect_row(node: &FlowNode) -> Option<RowModel<'_>> {
    let children = match node {
        FlowNode::Element { children, .. } => children,
        FlowNode::Text(_) => return None,
    };
    let mut cells = Vec::new();
    for child in children {
        if let FlowNode::Element { tag, style, children, .. } = child {
            if tag == "td" || tag == "th" {
                cells.push(CellModel {
                    extra_colspan: style.colspan.saturating_sub(1),
                    extra_rowspan: style.rowspan.saturating_sub(1),
                    style,
                    content: children,
                });
            }
        }
    }
    Some(RowModel { cells })
}

/// Lay out an assembled table model into one box.
fn layout_table(builder: &mut BoxBuilder<'_>, model: &TableModel<'_>) -> Result<VBox, LayoutError> {
    // Column count: the widest row, counting spans.
    let mut ncols = model.columns.len();
    for row in &model.rows {
        let span_units: usize = row
            .cells
            .iter()
            .map(|c| 1 + c.extra_colspan as usize)
            .sum();
        ncols = ncols.max(span_units);
    }
    if ncols == 0 {
        return Ok(VBox::new());
    }

    // Unspecified columns act as auto.
    let mut specs = model.columns.clone();
    specs.resize(ncols, ColumnSpec::Star(1.0));

    let any_star = specs.iter().any(|s| matches!(s, ColumnSpec::Star(_)));
    let widths = resolve_column_widths(&specs, model.max_width);
    let table_width = if any_star || model.stretch {
        model.max_width
    } else {
        widths.iter().sum::<f64>().min(model.max_width)
    };

    // Pass 1: build every cell's content at its resolved content width.
    struct BuiltCell {
        x: f64,
        extra_rowspan: u32,
        valign: VAlign,
        vbox: VBox,
    }
    let mut built_rows: Vec<Vec<BuiltCell>> = Vec::with_capacity(model.rows.len());
    // Columns still covered by a rowspan from above: column -> rows left.
    let mut covered = vec![0u32; ncols];

    for row in &model.rows {
        let mut built = Vec::with_capacity(row.cells.len());
        let mut col = 0usize;
        for cell in &row.cells {
            while col < ncols && covered[col] > 0 {
                col += 1;
            }
            if col >= ncols {
                break;
            }
            let span = (1 + cell.extra_colspan as usize).min(ncols - col);
            let cell_width: f64 = widths[col..col + span].iter().sum();
            let x: f64 = widths[..col].iter().sum();

            let frame = Frame::from_style(cell.style);
            let content_width = cell_width
                - cell.style.border_width.horizontal()
                - cell.style.padding.horizontal();

            let mut inner = VBox::new();
            for item in cell.content {
                if item.is_whitespace_text() {
                    continue;
                }
                let child = builder.build(item, content_width)?;
                inner.push(FlowItem::Box(child));
            }
            inner.width = content_width;
            if let Some(frame) = frame {
                inner.apply_frame(frame);
            }

            // Occupancy counts include the current row; the end-of-row
            // decrement brings a rowspan of 2 down to 1 for the next row.
            if cell.extra_rowspan > 0 {
                for c in covered.iter_mut().skip(col).take(span) {
                    *c = cell.extra_rowspan + 1;
                }
            }

            built.push(BuiltCell {
                x,
                extra_rowspan: cell.extra_rowspan,
                valign: cell.style.valign.unwrap_or_default(),
                vbox: inner,
            });
            col += span;
        }
        for c in covered.iter_mut() {
            *c = c.saturating_sub(1);
        }
        built_rows.push(built);
    }

    // Pass 2: row heights. Non-spanning cells set the base height; a
    // spanning cell taller than the rows it crosses grows the last one.
    let nrows = built_rows.len();
    let mut row_heights = vec![0.0f64; nrows];
    for (r, row) in built_rows.iter().enumerate() {
        for cell in row {
            if cell.extra_rowspan == 0 {
                row_heights[r] = row_heights[r].max(cell.vbox.advance());
            }
        }
    }
    for (r, row) in built_rows.iter().enumerate() {
        for cell in row {
            if cell.extra_rowspan > 0 {
                let end = (r + cell.extra_rowspan as usize).min(nrows - 1);
                let spanned: f64 = row_heights[r..=end].iter().sum();
                let deficit = cell.vbox.advance() - spanned;
                if deficit > 0.0 {
                    row_heights[end] += deficit;
                }
            }
        }
    }

    // Pass 3: emit one row box per row with vertical cell alignment.
    let mut table = VBox::new();
    for (r, row) in built_rows.into_iter().enumerate() {
        let height = row_heights[r];
        let mut cells = Vec::with_capacity(row.len());
        for cell in row {
            let extent = if cell.extra_rowspan > 0 {
                let end = (r + cell.extra_rowspan as usize).min(nrows - 1);
                row_heights[r..=end].iter().sum()
            } else {
                height
            };
            let slack = (extent - cell.vbox.advance()).max(0.0);
            let y = match cell.valign {
                VAlign::Top => 0.0,
                VAlign::Middle => slack / 2.0,
                VAlign::Bottom => slack,
            };
            cells.push(PlacedCell {
                x: cell.x,
                y,
                vbox: cell.vbox,
            });
        }
        table.push(FlowItem::Row(RowBox {
            width: table_width,
            height,
            depth: 0.0,
            cells,
        }));
    }
    table.width = table_width;
    Ok(table)
}
