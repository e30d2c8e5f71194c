//! Content actions: declarative units of document content.
//!
//! A [`ContentAction`] is an immutable value that knows how to add itself to
//! a [`DocumentBuilder`]. Applying an action never fails: malformed content
//! (an unparsable amount, an unreadable image) degrades locally and is logged.
//! Input that is structurally wrong, such as a ragged table, is rejected when
//! the action is constructed instead.

use crate::aggregate::{CurrencyFormat, TableAggregate, DEFAULT_TOTAL_COLUMNS};
use crate::decorator::PageDecorator;
use crate::error::{Error, Result};
use crate::style::{Alignment, Color, FontDescriptor, SharedFont};
use crate::writer::{
    BorderStyle, Borders, CellPadding, ColumnSpec, DocumentBuilder, ImageSource, Table, TableCell,
    TableRow, DEFAULT_SPACER_HEIGHT,
};

/// Weights of the label/value row: two text columns and two empty ones.
pub const TWO_COLUMN_WEIGHTS: [f32; 4] = [2.0, 3.0, 1.0, 1.0];

/// Source of the ordered content of one document.
///
/// Absent actions (`None`) are skipped. The opening decorator is active from
/// the first page; the closing decorator, if any, replaces it just before the
/// document is closed and therefore decorates the last page.
pub trait ContentProvider: Send + Sync {
    /// Actions in document order.
    fn actions(&self) -> Vec<Option<ContentAction>>;

    /// Decorator installed when the document is opened.
    fn opening_decorator(&self) -> Option<Box<dyn PageDecorator>> {
        None
    }

    /// Decorator swapped in before the document is closed.
    fn closing_decorator(&self) -> Option<Box<dyn PageDecorator>> {
        None
    }
}

/// Plain text paragraph.
#[derive(Debug, Clone)]
pub struct TitleText {
    /// Text, wrapped to the content width
    pub text: String,
    /// Font
    pub font: SharedFont,
    /// Alignment
    pub align: Alignment,
}

/// Full-width single-cell banner with a background fill.
#[derive(Debug, Clone)]
pub struct TitleBanner {
    /// Banner text
    pub text: String,
    /// Font
    pub font: SharedFont,
    /// Fill color
    pub background: Color,
}

impl TitleBanner {
    /// White text on orange.
    pub fn new(text: impl Into<String>, size: f32) -> Self {
        Self {
            text: text.into(),
            font: FontDescriptor::times(size).with_color(Color::WHITE).shared(),
            background: Color::ORANGE,
        }
    }

    /// Replace the font.
    pub fn with_font(mut self, font: SharedFont) -> Self {
        self.font = font;
        self
    }

    /// Replace the fill color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    fn to_table(&self) -> Table {
        let cell = TableCell::new(self.text.clone(), self.font.clone())
            .with_background(self.background)
            .with_padding(CellPadding::default().with_bottom(10.0));
        single_row(ColumnSpec::uniform(1), vec![cell])
    }
}

/// Label and value in the first two of four columns weighted 2:3:1:1.
#[derive(Debug, Clone)]
pub struct TwoColumnRow {
    /// First column
    pub label: String,
    /// Second column
    pub value: String,
    /// Font for both
    pub font: SharedFont,
}

impl TwoColumnRow {
    fn to_table(&self) -> Table {
        single_row(
            ColumnSpec::new(TWO_COLUMN_WEIGHTS.to_vec()),
            vec![
                TableCell::new(self.label.clone(), self.font.clone()),
                TableCell::new(self.value.clone(), self.font.clone()),
                TableCell::empty(self.font.clone()),
                TableCell::empty(self.font.clone()),
            ],
        )
    }
}

/// Label and value in two equal columns, no fill.
#[derive(Debug, Clone)]
pub struct KeyValueRow {
    /// Left column
    pub label: String,
    /// Right column
    pub value: String,
    /// Font for both
    pub font: SharedFont,
}

impl KeyValueRow {
    fn to_table(&self) -> Table {
        single_row(
            ColumnSpec::uniform(2),
            vec![
                TableCell::new(self.label.clone(), self.font.clone()),
                TableCell::new(self.value.clone(), self.font.clone()),
            ],
        )
    }
}

/// Label/value row whose fill depends only on the caller-supplied index.
///
/// The index belongs to the caller: the row itself keeps no count, so the
/// same index always yields the same fill.
#[derive(Debug, Clone)]
pub struct AlternatingRow {
    /// Left column
    pub label: String,
    /// Right column
    pub value: String,
    /// Font for both
    pub font: SharedFont,
    /// Position of the row within its group
    pub row_index: usize,
    /// Fill for even indices
    pub even: Color,
    /// Fill for odd indices
    pub odd: Color,
}

impl AlternatingRow {
    /// Light grey on even indices, white on odd ones.
    pub fn new(label: impl Into<String>, value: impl Into<String>, font: SharedFont, row_index: usize) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            font,
            row_index,
            even: Color::LIGHT_GREY,
            odd: Color::WHITE,
        }
    }

    /// Replace the two fills.
    pub fn with_colors(mut self, even: Color, odd: Color) -> Self {
        self.even = even;
        self.odd = odd;
        self
    }

    /// Fill for this row.
    pub fn background(&self) -> Color {
        alternating_fill(self.row_index, self.even, self.odd)
    }

    fn to_table(&self) -> Table {
        let bg = self.background();
        let padding = CellPadding::default().with_bottom(10.0);
        single_row(
            ColumnSpec::uniform(2),
            vec![
                TableCell::new(self.label.clone(), self.font.clone())
                    .with_background(bg)
                    .with_padding(padding),
                TableCell::new(self.value.clone(), self.font.clone())
                    .with_background(bg)
                    .with_padding(padding),
            ],
        )
    }
}

/// `even` when `row_index` is even, `odd` otherwise.
pub fn alternating_fill(row_index: usize, even: Color, odd: Color) -> Color {
    if row_index % 2 == 0 {
        even
    } else {
        odd
    }
}

/// Fonts for the three kinds of rows of an [`NColumnTable`].
#[derive(Debug, Clone)]
pub struct TableFonts {
    /// Header row
    pub header: SharedFont,
    /// Data rows
    pub cell: SharedFont,
    /// Totals row
    pub total: SharedFont,
}

impl Default for TableFonts {
    fn default() -> Self {
        Self {
            header: FontDescriptor::helvetica(12.0).bold().shared(),
            cell: FontDescriptor::helvetica(12.0).shared(),
            total: FontDescriptor::helvetica(12.0).bold().shared(),
        }
    }
}

/// Header row, data rows, then a totals row.
///
/// The totals row reads "Total" in the first column and shows the currency
/// sum of each total column; every other cell is blank. Without an explicit
/// currency the table uses the document's.
#[derive(Debug, Clone)]
pub struct NColumnTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    total_columns: Vec<usize>,
    weights: Option<Vec<f32>>,
    fonts: TableFonts,
    currency: Option<CurrencyFormat>,
    rule: Option<BorderStyle>,
}

impl NColumnTable {
    /// Validate and build. Every row must have one cell per header.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>, fonts: TableFonts) -> Result<Self> {
        if let Some((row, cells)) = rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != headers.len())
        {
            return Err(Error::RaggedRow {
                row,
                expected: headers.len(),
                found: cells.len(),
            });
        }
        Ok(Self {
            headers,
            rows,
            total_columns: DEFAULT_TOTAL_COLUMNS.to_vec(),
            weights: None,
            fonts,
            currency: None,
            rule: None,
        })
    }

    /// Columns to sum; indices past the last column are ignored.
    pub fn with_total_columns(mut self, columns: impl IntoIterator<Item = usize>) -> Self {
        self.total_columns = columns.into_iter().collect();
        self
    }

    /// Relative column widths, one per header. Equal widths otherwise.
    pub fn with_weights(mut self, weights: Vec<f32>) -> Result<Self> {
        if weights.len() != self.headers.len() {
            return Err(Error::ColumnSpec {
                expected: self.headers.len(),
                found: weights.len(),
            });
        }
        self.weights = Some(weights);
        Ok(self)
    }

    /// Currency marker for parsing and formatting totals.
    pub fn with_currency(mut self, currency: CurrencyFormat) -> Self {
        self.currency = Some(currency);
        self
    }

    /// Draw a rule under every cell.
    pub fn with_rule(mut self, rule: BorderStyle) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Header labels.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Sums of the total columns that exist in this table.
    pub fn aggregate(&self) -> TableAggregate {
        self.aggregate_in(&CurrencyFormat::default())
    }

    /// Like [`aggregate`](Self::aggregate), with `fallback` as the currency
    /// when the table has none of its own.
    pub fn aggregate_in(&self, fallback: &CurrencyFormat) -> TableAggregate {
        let columns = self
            .total_columns
            .iter()
            .copied()
            .filter(|c| *c < self.headers.len());
        let currency = self.currency.as_ref().unwrap_or(fallback).clone();
        TableAggregate::from_rows(columns, &self.rows, currency)
    }

    /// Rendered table: header, data rows, totals. Empty when there are no headers.
    pub fn to_table(&self) -> Table {
        self.to_table_in(&CurrencyFormat::default())
    }

    /// Rendered table with totals in `fallback` unless the table sets its own
    /// currency.
    pub fn to_table_in(&self, fallback: &CurrencyFormat) -> Table {
        let columns = match &self.weights {
            Some(weights) => ColumnSpec::new(weights.clone()),
            None => ColumnSpec::uniform(self.headers.len()),
        };
        let mut table = Table::new(columns);
        if self.headers.is_empty() {
            return table;
        }

        let aggregate = self.aggregate_in(fallback);
        let totals = (0..self.headers.len()).map(|col| {
            if col == 0 {
                self.cell("Total", &self.fonts.cell)
            } else {
                match aggregate.formatted(col) {
                    Some(sum) => self.cell(sum, &self.fonts.total),
                    None => self.cell(String::new(), &self.fonts.cell),
                }
            }
        });

        let header = self.headers.iter().map(|h| self.cell(h.clone(), &self.fonts.header));
        let mut rows = vec![TableRow::new(header.collect())];
        rows.extend(self.rows.iter().map(|cells| {
            TableRow::new(cells.iter().map(|c| self.cell(c.clone(), &self.fonts.cell)).collect())
        }));
        rows.push(TableRow::new(totals.collect()));

        for row in rows {
            if let Err(e) = table.push_row(row) {
                log::warn!("Dropping table row: {}", e);
            }
        }
        table
    }

    fn cell(&self, text: impl Into<String>, font: &SharedFont) -> TableCell {
        let cell = TableCell::new(text, font.clone())
            .with_padding(CellPadding::default().with_top(5.0).with_bottom(5.0));
        match self.rule {
            Some(rule) => cell.with_borders(Borders::bottom(rule)),
            None => cell,
        }
    }
}

/// Image rasterized to a fixed pixel size.
#[derive(Debug, Clone)]
pub struct ImageAction {
    /// Where the pixels come from
    pub source: ImageSource,
    /// Width in pixels (drawn at the same size in points)
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Horizontal alignment
    pub align: Alignment,
}

/// Two images on one row, left and right aligned.
#[derive(Debug, Clone)]
pub struct ImagePair {
    /// Left image
    pub left: ImageSource,
    /// Right image
    pub right: ImageSource,
    /// Width of each image
    pub width: u32,
    /// Height of each image
    pub height: u32,
}

/// Horizontal rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Separator {
    /// Line width
    pub line_width: f32,
    /// Line color
    pub color: Color,
    /// Percentage of the content width
    pub percentage: f32,
    /// Horizontal alignment
    pub align: Alignment,
}

impl Default for Separator {
    fn default() -> Self {
        Self {
            line_width: 1.0,
            color: Color::BLACK,
            percentage: 100.0,
            align: Alignment::Center,
        }
    }
}

/// Blank vertical space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacer {
    /// Height in points
    pub height: f32,
}

impl Default for Spacer {
    fn default() -> Self {
        Self {
            height: DEFAULT_SPACER_HEIGHT,
        }
    }
}

/// One unit of document content.
#[derive(Debug, Clone)]
pub enum ContentAction {
    /// Paragraph
    TitleText(TitleText),
    /// Filled banner
    TitleBanner(TitleBanner),
    /// Label/value in a 2:3:1:1 row
    TwoColumnRow(TwoColumnRow),
    /// Label/value in a 1:1 row
    KeyValueRow(KeyValueRow),
    /// Label/value with index-driven fill
    AlternatingRow(AlternatingRow),
    /// Table with a totals row
    NColumnTable(NColumnTable),
    /// Single image
    Image(ImageAction),
    /// Two images side by side
    ImagePair(ImagePair),
    /// Horizontal rule
    Separator(Separator),
    /// Blank space
    Spacer(Spacer),
}

impl ContentAction {
    /// Paragraph of text.
    pub fn title(text: impl Into<String>, font: SharedFont, align: Alignment) -> Self {
        ContentAction::TitleText(TitleText {
            text: text.into(),
            font,
            align,
        })
    }

    /// White-on-orange banner.
    pub fn banner(text: impl Into<String>, size: f32) -> Self {
        ContentAction::TitleBanner(TitleBanner::new(text, size))
    }

    /// Label/value in a 2:3:1:1 row.
    pub fn two_column(label: impl Into<String>, value: impl Into<String>, font: SharedFont) -> Self {
        ContentAction::TwoColumnRow(TwoColumnRow {
            label: label.into(),
            value: value.into(),
            font,
        })
    }

    /// Label/value in a 1:1 row.
    pub fn key_value(label: impl Into<String>, value: impl Into<String>, font: SharedFont) -> Self {
        ContentAction::KeyValueRow(KeyValueRow {
            label: label.into(),
            value: value.into(),
            font,
        })
    }

    /// Label/value with grey or white fill depending on `row_index`.
    pub fn alternating(
        label: impl Into<String>,
        value: impl Into<String>,
        font: SharedFont,
        row_index: usize,
    ) -> Self {
        ContentAction::AlternatingRow(AlternatingRow::new(label, value, font, row_index))
    }

    /// Single image.
    pub fn image(source: ImageSource, width: u32, height: u32, align: Alignment) -> Self {
        ContentAction::Image(ImageAction {
            source,
            width,
            height,
            align,
        })
    }

    /// Two images side by side.
    pub fn image_pair(left: ImageSource, right: ImageSource, width: u32, height: u32) -> Self {
        ContentAction::ImagePair(ImagePair {
            left,
            right,
            width,
            height,
        })
    }

    /// Horizontal rule.
    pub fn separator(line_width: f32, color: Color, percentage: f32, align: Alignment) -> Self {
        ContentAction::Separator(Separator {
            line_width,
            color,
            percentage,
            align,
        })
    }

    /// One blank line.
    pub fn spacer() -> Self {
        ContentAction::Spacer(Spacer::default())
    }

    /// Layout blocks this action adds.
    pub fn block_count(&self) -> usize {
        match self {
            ContentAction::NColumnTable(t) if t.headers.is_empty() => 0,
            ContentAction::NColumnTable(t) => t.rows.len() + 2,
            _ => 1,
        }
    }

    /// Add this action's content to `builder`.
    pub fn apply(&self, builder: &mut DocumentBuilder) {
        match self {
            ContentAction::TitleText(t) => builder.add_paragraph(&t.text, &t.font, t.align),
            ContentAction::TitleBanner(b) => builder.add_table(&b.to_table()),
            ContentAction::TwoColumnRow(r) => builder.add_table(&r.to_table()),
            ContentAction::KeyValueRow(r) => builder.add_table(&r.to_table()),
            ContentAction::AlternatingRow(r) => builder.add_table(&r.to_table()),
            ContentAction::NColumnTable(t) => {
                let table = t.to_table_in(builder.currency());
                builder.add_table(&table);
            },
            ContentAction::Image(i) => builder.add_image(&i.source, i.width, i.height, i.align),
            ContentAction::ImagePair(p) => builder.add_image_pair(&p.left, &p.right, p.width, p.height),
            ContentAction::Separator(s) => builder.add_separator(s.line_width, s.color, s.percentage, s.align),
            ContentAction::Spacer(s) => builder.add_spacer(s.height),
        }
    }
}

impl From<NColumnTable> for ContentAction {
    fn from(table: NColumnTable) -> Self {
        ContentAction::NColumnTable(table)
    }
}

fn single_row(columns: ColumnSpec, cells: Vec<TableCell>) -> Table {
    let mut table = Table::new(columns);
    if let Err(e) = table.push_row(TableRow::new(cells)) {
        log::warn!("Dropping table row: {}", e);
    }
    table
}
