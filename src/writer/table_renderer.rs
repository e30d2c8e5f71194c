//! Table rendering for PDF generation.
//!
//! Tables are laid out and drawn one row at a time so the document builder
//! can move a row that does not fit to the next page without splitting it.
//! Rows taller than a page are drawn in vertical parts, cut between text
//! lines.
//!
//! # Example
//!
//! ```ignore
//! use receipt_composer::writer::{ColumnSpec, Table, TableCell, TableRow};
//!
//! let font = FontDescriptor::helvetica(18.0).shared();
//! let mut table = Table::new(ColumnSpec::new(vec![2.0, 3.0, 1.0, 1.0]));
//! table.push_row(TableRow::new(vec![
//!     TableCell::new("Status", font.clone()),
//!     TableCell::new("Success", font.clone()),
//!     TableCell::empty(font.clone()),
//!     TableCell::empty(font),
//! ]))?;
//! ```

use super::document_builder::PageCanvas;
use crate::error::{Error, Result};
use crate::style::{Alignment, Color, SharedFont};

const SPLIT_EPSILON: f32 = 0.01;

/// Relative column widths.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    weights: Vec<f32>,
}

impl ColumnSpec {
    /// Columns with the given relative weights.
    pub fn new(weights: Vec<f32>) -> Self {
        Self { weights }
    }

    /// `count` equally weighted columns.
    pub fn uniform(count: usize) -> Self {
        Self::new(vec![1.0; count])
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether there are no columns.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// The relative weights.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Absolute widths for a table `total_width` wide.
    ///
    /// Negative weights count as zero; if nothing is positive the width is
    /// split evenly.
    pub fn resolve(&self, total_width: f32) -> Vec<f32> {
        let n = self.weights.len();
        if n == 0 {
            return Vec::new();
        }
        let sum: f32 = self.weights.iter().map(|w| w.max(0.0)).sum();
        if sum <= 0.0 {
            return vec![total_width / n as f32; n];
        }
        self.weights
            .iter()
            .map(|w| total_width * w.max(0.0) / sum)
            .collect()
    }
}

/// Cell padding in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellPadding {
    /// Top padding
    pub top: f32,
    /// Right padding
    pub right: f32,
    /// Bottom padding
    pub bottom: f32,
    /// Left padding
    pub left: f32,
}

impl CellPadding {
    /// Same padding on every side.
    pub fn uniform(padding: f32) -> Self {
        Self {
            top: padding,
            right: padding,
            bottom: padding,
            left: padding,
        }
    }

    /// Replace the top padding.
    pub fn with_top(mut self, top: f32) -> Self {
        self.top = top;
        self
    }

    /// Replace the bottom padding.
    pub fn with_bottom(mut self, bottom: f32) -> Self {
        self.bottom = bottom;
        self
    }

    /// Left plus right.
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    /// Top plus bottom.
    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

impl Default for CellPadding {
    fn default() -> Self {
        Self::uniform(2.0)
    }
}

/// Border line style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderStyle {
    /// Line width
    pub width: f32,
    /// Line color
    pub color: Color,
}

impl BorderStyle {
    /// Border of `width` points in `color`.
    pub fn new(width: f32, color: Color) -> Self {
        Self { width, color }
    }
}

/// Per-side cell borders. The default is no border at all.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Borders {
    /// Top border
    pub top: Option<BorderStyle>,
    /// Right border
    pub right: Option<BorderStyle>,
    /// Bottom border
    pub bottom: Option<BorderStyle>,
    /// Left border
    pub left: Option<BorderStyle>,
}

impl Borders {
    /// No borders.
    pub fn none() -> Self {
        Self::default()
    }

    /// Only a bottom rule.
    pub fn bottom(style: BorderStyle) -> Self {
        Self {
            bottom: Some(style),
            ..Self::default()
        }
    }

    /// The same border on every side.
    pub fn all(style: BorderStyle) -> Self {
        Self {
            top: Some(style),
            right: Some(style),
            bottom: Some(style),
            left: Some(style),
        }
    }

    /// Whether no side has a border.
    pub fn is_none(&self) -> bool {
        self.top.is_none() && self.right.is_none() && self.bottom.is_none() && self.left.is_none()
    }
}

/// A single table cell.
#[derive(Debug, Clone)]
pub struct TableCell {
    /// Cell text
    pub text: String,
    /// Font for the text
    pub font: SharedFont,
    /// Horizontal alignment
    pub align: Alignment,
    /// Background fill
    pub background: Option<Color>,
    /// Padding
    pub padding: CellPadding,
    /// Borders
    pub borders: Borders,
}

impl TableCell {
    /// Left-aligned, unfilled, borderless cell.
    pub fn new(text: impl Into<String>, font: SharedFont) -> Self {
        Self {
            text: text.into(),
            font,
            align: Alignment::Left,
            background: None,
            padding: CellPadding::default(),
            borders: Borders::none(),
        }
    }

    /// Cell with no text.
    pub fn empty(font: SharedFont) -> Self {
        Self::new(String::new(), font)
    }

    /// Set alignment.
    pub fn with_align(mut self, align: Alignment) -> Self {
        self.align = align;
        self
    }

    /// Set background fill.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    /// Set padding.
    pub fn with_padding(mut self, padding: CellPadding) -> Self {
        self.padding = padding;
        self
    }

    /// Set borders.
    pub fn with_borders(mut self, borders: Borders) -> Self {
        self.borders = borders;
        self
    }
}

/// A table row.
#[derive(Debug, Clone)]
pub struct TableRow {
    /// Cells, one per column
    pub cells: Vec<TableCell>,
}

impl TableRow {
    /// Row from cells.
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self { cells }
    }
}

/// Computed geometry of one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    /// Row height in points
    pub height: f32,
    /// Wrapped lines per cell
    pub lines: Vec<Vec<String>>,
}

/// A full-width table.
#[derive(Debug, Clone)]
pub struct Table {
    columns: ColumnSpec,
    rows: Vec<TableRow>,
}

impl Table {
    /// Empty table with the given columns.
    pub fn new(columns: ColumnSpec) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. The row must have exactly one cell per column.
    pub fn push_row(&mut self, row: TableRow) -> Result<()> {
        if row.cells.len() != self.columns.len() {
            return Err(Error::RaggedRow {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.cells.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Builder-style [`push_row`](Self::push_row).
    pub fn with_row(mut self, row: TableRow) -> Result<Self> {
        self.push_row(row)?;
        Ok(self)
    }

    /// Column specification.
    pub fn columns(&self) -> &ColumnSpec {
        &self.columns
    }

    /// Rows.
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Wrap every cell of `row_idx` and compute the row height.
    pub fn layout_row(&self, row_idx: usize, widths: &[f32], canvas: &PageCanvas<'_>) -> RowLayout {
        let Some(row) = self.rows.get(row_idx) else {
            return RowLayout {
                height: 0.0,
                lines: Vec::new(),
            };
        };

        let mut height: f32 = 0.0;
        let mut lines = Vec::with_capacity(row.cells.len());
        for (cell, width) in row.cells.iter().zip(widths) {
            let inner = (width - cell.padding.horizontal()).max(1.0);
            let wrapped = canvas.wrap_text(&cell.text, &cell.font, inner);
            let text_height = wrapped.len() as f32 * cell.font.leading();
            height = height.max(cell.padding.vertical() + text_height);
            lines.push(wrapped);
        }

        RowLayout { height, lines }
    }

    /// Draw row `row_idx` with its top-left corner at `(x, top)`.
    ///
    /// Backgrounds go down first, then borders, then text.
    pub fn render_row(
        &self,
        row_idx: usize,
        layout: &RowLayout,
        widths: &[f32],
        x: f32,
        top: f32,
        canvas: &mut PageCanvas<'_>,
    ) {
        self.render_row_part(row_idx, layout, widths, (x, top), (0.0, layout.height), canvas);
    }

    /// Offset below the row top where a part starting at `from` must end to
    /// fit in `room` points without cutting a text line.
    ///
    /// Always makes progress: when not even one line fits, the part ends at
    /// `from + room` and the line it cuts is drawn in that part.
    pub fn split_point(&self, row_idx: usize, layout: &RowLayout, from: f32, room: f32) -> f32 {
        let limit = from + room.max(0.0);
        if limit >= layout.height - SPLIT_EPSILON {
            return layout.height;
        }
        let Some(row) = self.rows.get(row_idx) else {
            return layout.height;
        };

        let mut end = limit;
        loop {
            let mut moved = false;
            for (cell, lines) in row.cells.iter().zip(&layout.lines) {
                let leading = cell.font.leading();
                for i in 0..lines.len() {
                    let start = cell.padding.top + i as f32 * leading;
                    if start < end - SPLIT_EPSILON && start + leading > end + SPLIT_EPSILON {
                        end = start;
                        moved = true;
                        break;
                    }
                }
            }
            if !moved {
                break;
            }
        }

        if end <= from + SPLIT_EPSILON {
            limit
        } else {
            end
        }
    }

    /// Draw the band `from..to` of row `row_idx`, measured down from the row
    /// top, with the band's top-left corner at `origin`.
    ///
    /// Top borders belong to the first part and bottom borders to the last.
    /// A text line is drawn in the part where it starts.
    pub fn render_row_part(
        &self,
        row_idx: usize,
        layout: &RowLayout,
        widths: &[f32],
        origin: (f32, f32),
        (from, to): (f32, f32),
        canvas: &mut PageCanvas<'_>,
    ) {
        let Some(row) = self.rows.get(row_idx) else {
            return;
        };
        let (x, top) = origin;
        let height = to - from;
        let bottom = top - height;
        let first = from <= SPLIT_EPSILON;
        let last = to >= layout.height - SPLIT_EPSILON;

        let mut cell_x = x;
        for (cell, width) in row.cells.iter().zip(widths) {
            if let Some(bg) = cell.background {
                canvas.fill_rect(cell_x, bottom, *width, height, bg);
            }
            let borders = Borders {
                top: cell.borders.top.filter(|_| first),
                bottom: cell.borders.bottom.filter(|_| last),
                ..cell.borders
            };
            draw_borders(canvas, &borders, cell_x, bottom, *width, height);
            cell_x += width;
        }

        let mut cell_x = x;
        for ((cell, width), lines) in row.cells.iter().zip(widths).zip(&layout.lines) {
            let inner_left = cell_x + cell.padding.left;
            let inner_width = width - cell.padding.horizontal();
            let leading = cell.font.leading();
            for (i, line) in lines.iter().enumerate() {
                let start = cell.padding.top + i as f32 * leading;
                let in_part = start >= from - SPLIT_EPSILON && (last || start < to - SPLIT_EPSILON);
                if line.is_empty() || !in_part {
                    continue;
                }
                let baseline = top - (start - from) - cell.font.size();
                canvas.draw_text_in(line, &cell.font, inner_left, inner_width, baseline, cell.align);
            }
            cell_x += width;
        }
    }
}

fn draw_borders(canvas: &mut PageCanvas<'_>, borders: &Borders, x: f32, y: f32, w: f32, h: f32) {
    if let Some(b) = borders.top {
        canvas.draw_line(x, y + h, x + w, y + h, b.width, b.color);
    }
    if let Some(b) = borders.right {
        canvas.draw_line(x + w, y, x + w, y + h, b.width, b.color);
    }
    if let Some(b) = borders.bottom {
        canvas.draw_line(x, y, x + w, y, b.width, b.color);
    }
    if let Some(b) = borders.left {
        canvas.draw_line(x, y, x, y + h, b.width, b.color);
    }
}
