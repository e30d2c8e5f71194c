//! Page-flowing document builder.
//!
//! The builder is an append-only sink: content is added as blocks (a
//! paragraph, an image, one table row, ...) which flow from the top margin
//! downward. When the next block does not fit in the remaining height the
//! current page is finished, the active [`PageDecorator`] draws its furniture
//! on it, and a fresh page begins. Paragraphs are the exception: their lines
//! fill the current page and continue on the next one. A table row is only
//! split when it is taller than a whole page.
//!
//! ```ignore
//! use receipt_composer::writer::{DocumentBuilder, PageSize};
//! use receipt_composer::config::PageMargins;
//!
//! let mut doc = DocumentBuilder::new(PageSize::A4, PageMargins::default());
//! doc.add_paragraph("Thank You", &FontDescriptor::times(22.0), Alignment::Right);
//! let finished = doc.finish()?;
//! std::fs::write("receipt.pdf", &finished.bytes)?;
//! ```

use super::content_stream::ContentStreamBuilder;
use super::encoding::{encode_winansi, transliterate};
use super::font_manager::FontManager;
use super::image_handler::{ImageData, ImageManager, ImageSource};
use super::pdf_writer::{font_resource_name, PdfWriter, PdfWriterConfig};
use super::table_renderer::Table;
use crate::aggregate::CurrencyFormat;
use crate::config::PageMargins;
use crate::decorator::{PageContext, PageDecorator};
use crate::error::Result;
use crate::style::{Alignment, Color, FontDescriptor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Tolerance when checking whether a block still fits.
const FIT_EPSILON: f32 = 0.01;

/// Height of a blank line when no explicit spacer height is given.
pub const DEFAULT_SPACER_HEIGHT: f32 = 18.0;

/// Metadata for a PDF document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentMetadata {
    /// Document title
    pub title: Option<String>,
    /// Document author
    pub author: Option<String>,
    /// Document subject
    pub subject: Option<String>,
    /// Document keywords
    pub keywords: Option<String>,
    /// Creator application
    pub creator: Option<String>,
}

impl DocumentMetadata {
    /// Create new empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set document title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set document author.
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set document subject.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set document keywords.
    pub fn keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    /// Set creator application.
    pub fn creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }
}

/// Standard page sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    /// US Letter (8.5" x 11")
    Letter,
    /// A4 (210mm x 297mm)
    #[default]
    A4,
    /// Legal (8.5" x 14")
    Legal,
    /// A3 (297mm x 420mm)
    A3,
    /// Custom dimensions in points
    Custom(f32, f32),
}

impl PageSize {
    /// Get dimensions in points (1 inch = 72 points).
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::A4 => (595.0, 842.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::A3 => (842.0, 1190.0),
            PageSize::Custom(w, h) => (*w, *h),
        }
    }
}

/// Area reserved for one block on the current page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockArea {
    /// Left edge (the left margin)
    pub left: f32,
    /// Top edge in PDF user space
    pub top: f32,
    /// Usable width between the margins
    pub width: f32,
    /// Block height
    pub height: f32,
}

/// Drawing surface for one page.
///
/// Text is measured and drawn with base-14 metrics and WinAnsi encoding;
/// every font drawn is recorded so the writer only embeds what is used.
pub struct PageCanvas<'a> {
    content: &'a mut ContentStreamBuilder,
    fonts: &'a FontManager,
    images: &'a mut ImageManager,
    used_fonts: &'a mut BTreeSet<&'static str>,
}

impl<'a> PageCanvas<'a> {
    /// Width of `text` in points as it will be drawn.
    pub fn text_width(&self, text: &str, font: &FontDescriptor) -> f32 {
        self.fonts
            .text_width(&transliterate(text), font.base_font(), font.size())
    }

    /// Word-wrap `text` to `max_width`, returning the lines as drawn.
    pub fn wrap_text(&self, text: &str, font: &FontDescriptor, max_width: f32) -> Vec<String> {
        self.fonts
            .wrap_text(&transliterate(text), font.base_font(), font.size(), max_width)
    }

    /// Draw one line of text with its baseline origin at `(x, baseline)`.
    pub fn draw_text(&mut self, text: &str, font: &FontDescriptor, x: f32, baseline: f32) {
        self.used_fonts.insert(font.base_font());
        let resource = font_resource_name(font.base_font());
        self.content
            .begin_text()
            .fill_color(font.color())
            .set_font(&resource, font.size())
            .text(encode_winansi(text), x, baseline);
    }

    /// Draw one line of text aligned inside `[left, left + width]`.
    pub fn draw_text_in(
        &mut self,
        text: &str,
        font: &FontDescriptor,
        left: f32,
        width: f32,
        baseline: f32,
        align: Alignment,
    ) {
        let text_width = self.text_width(text, font);
        let x = left + align.offset(width, text_width);
        self.draw_text(text, font, x, baseline);
    }

    /// Stroke a straight line.
    pub fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Color) {
        self.content
            .end_text()
            .stroke_color(color)
            .set_line_width(width)
            .move_to(x1, y1)
            .line_to(x2, y2)
            .stroke();
    }

    /// Fill a rectangle whose lower-left corner is `(x, y)`.
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        self.content
            .end_text()
            .fill_color(color)
            .rect(x, y, width, height)
            .fill();
    }

    /// Embed `image` and draw it into the box with lower-left corner `(x, y)`.
    pub fn draw_image(&mut self, image: ImageData, x: f32, y: f32, width: f32, height: f32) {
        let name = self.images.register(image);
        self.content.draw_image(&name, x, y, width, height);
    }

    /// Draw an image that may appear many times; it is embedded only once.
    pub fn draw_shared_image(&mut self, image: &Arc<ImageData>, x: f32, y: f32, width: f32, height: f32) {
        let name = self.images.register_shared(image);
        self.content.draw_image(&name, x, y, width, height);
    }
}

/// Output of [`DocumentBuilder::finish`].
#[derive(Debug, Clone)]
pub struct FinishedDocument {
    /// Serialized PDF
    pub bytes: Vec<u8>,
    /// Physical pages emitted
    pub page_count: usize,
    /// Layout blocks placed
    pub block_count: usize,
    /// Number of times a decorator ran
    pub decorations: usize,
}

/// Append-only page-flowing document builder.
pub struct DocumentBuilder {
    width: f32,
    height: f32,
    margins: PageMargins,
    metadata: DocumentMetadata,
    compress: bool,
    created: DateTime<Utc>,
    currency: CurrencyFormat,
    fonts: FontManager,
    images: ImageManager,
    used_fonts: BTreeSet<&'static str>,
    pages: Vec<ContentStreamBuilder>,
    current: ContentStreamBuilder,
    cursor_y: f32,
    page_blocks: usize,
    blocks: usize,
    decorator: Option<Box<dyn PageDecorator>>,
    decorations: usize,
}

impl DocumentBuilder {
    /// Start a document with one empty page.
    pub fn new(page_size: PageSize, margins: PageMargins) -> Self {
        let (width, height) = page_size.dimensions();
        Self {
            width,
            height,
            margins,
            metadata: DocumentMetadata::default(),
            compress: false,
            created: Utc::now(),
            currency: CurrencyFormat::default(),
            fonts: FontManager::new(),
            images: ImageManager::new(),
            used_fonts: BTreeSet::new(),
            pages: Vec::new(),
            current: ContentStreamBuilder::new(),
            cursor_y: height - margins.top,
            page_blocks: 0,
            blocks: 0,
            decorator: None,
            decorations: 0,
        }
    }

    /// Set document metadata.
    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Enable or disable content stream compression.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Fix the creation timestamp instead of using the current time.
    pub fn with_creation_date(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }

    /// Currency for totals of tables that do not set their own.
    pub fn with_currency(mut self, currency: CurrencyFormat) -> Self {
        self.currency = currency;
        self
    }

    /// Document currency.
    pub fn currency(&self) -> &CurrencyFormat {
        &self.currency
    }

    /// Page width and height in points.
    pub fn page_size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Page margins.
    pub fn margins(&self) -> &PageMargins {
        &self.margins
    }

    /// Document metadata.
    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    /// Width between the left and right margins.
    pub fn content_width(&self) -> f32 {
        self.width - self.margins.left - self.margins.right
    }

    /// Height left on the current page above the bottom margin.
    pub fn remaining_height(&self) -> f32 {
        self.cursor_y - self.margins.bottom
    }

    /// Install a decorator, returning the one it replaces.
    pub fn set_decorator(
        &mut self,
        decorator: Option<Box<dyn PageDecorator>>,
    ) -> Option<Box<dyn PageDecorator>> {
        std::mem::replace(&mut self.decorator, decorator)
    }

    /// Whether a decorator is installed.
    pub fn has_decorator(&self) -> bool {
        self.decorator.is_some()
    }

    /// Layout blocks placed so far.
    pub fn block_count(&self) -> usize {
        self.blocks
    }

    /// Pages so far, including the one being filled.
    pub fn page_count(&self) -> usize {
        self.pages.len() + 1
    }

    /// Decorator invocations so far.
    pub fn decorations(&self) -> usize {
        self.decorations
    }

    /// Canvas for the current page.
    pub fn canvas(&mut self) -> PageCanvas<'_> {
        PageCanvas {
            content: &mut self.current,
            fonts: &self.fonts,
            images: &mut self.images,
            used_fonts: &mut self.used_fonts,
        }
    }

    /// Height between the top and bottom margins.
    pub fn usable_height(&self) -> f32 {
        self.height - self.margins.top - self.margins.bottom
    }

    /// Reserve `height` points for one block and draw it.
    ///
    /// Breaks the page first when the block does not fit, unless the page is
    /// still empty, in which case an oversized block simply overflows.
    pub fn place_block<F>(&mut self, height: f32, draw: F)
    where
        F: FnOnce(&mut PageCanvas<'_>, BlockArea),
    {
        self.place_fragment(height, draw);
        self.blocks += 1;
    }

    /// Place part of a block. The caller counts the block once.
    fn place_fragment<F>(&mut self, height: f32, draw: F)
    where
        F: FnOnce(&mut PageCanvas<'_>, BlockArea),
    {
        let height = height.max(0.0);
        if self.page_blocks > 0 && self.cursor_y - height < self.margins.bottom - FIT_EPSILON {
            self.break_page();
        }

        let area = BlockArea {
            left: self.margins.left,
            top: self.cursor_y,
            width: self.content_width(),
            height,
        };
        draw(&mut self.canvas(), area);

        self.cursor_y -= height;
        self.page_blocks += 1;
    }

    /// Whole units of `unit` points left on the current page.
    fn units_left(&self, unit: f32) -> usize {
        // Negative room saturates to zero.
        ((self.remaining_height() + FIT_EPSILON) / unit).floor() as usize
    }

    /// Wrapped paragraph; one block regardless of line count.
    ///
    /// Lines flow onto following pages: each page takes as many whole lines
    /// as fit above the bottom margin.
    pub fn add_paragraph(&mut self, text: &str, font: &FontDescriptor, align: Alignment) {
        let width = self.content_width();
        let lines = self.canvas().wrap_text(text, font, width);
        let leading = font.leading();

        let mut rest = lines.as_slice();
        while !rest.is_empty() {
            let mut fit = self.units_left(leading);
            if fit == 0 && self.page_blocks > 0 {
                self.break_page();
                fit = self.units_left(leading);
            }
            // A line taller than a whole page still gets drawn.
            let (run, tail) = rest.split_at(fit.clamp(1, rest.len()));
            self.place_fragment(run.len() as f32 * leading, |canvas, area| {
                let mut baseline = area.top - font.size();
                for line in run {
                    if !line.is_empty() {
                        canvas.draw_text_in(line, font, area.left, area.width, baseline, align);
                    }
                    baseline -= leading;
                }
            });
            rest = tail;
        }
        self.blocks += 1;
    }

    /// Full-width table; one block per row.
    ///
    /// A row that fits on a page is never split. A row taller than a whole
    /// page starts on a fresh page and continues on the following ones,
    /// broken between text lines.
    pub fn add_table(&mut self, table: &Table) {
        let widths = table.columns().resolve(self.content_width());
        for row_idx in 0..table.rows().len() {
            let layout = table.layout_row(row_idx, &widths, &self.canvas());
            if layout.height <= self.usable_height() + FIT_EPSILON {
                self.place_block(layout.height, |canvas, area| {
                    table.render_row(row_idx, &layout, &widths, area.left, area.top, canvas);
                });
                continue;
            }

            if self.page_blocks > 0 {
                self.break_page();
            }
            let mut from = 0.0;
            loop {
                let to = table.split_point(row_idx, &layout, from, self.remaining_height());
                self.place_fragment(to - from, |canvas, area| {
                    table.render_row_part(row_idx, &layout, &widths, (area.left, area.top), (from, to), canvas);
                });
                if to >= layout.height - FIT_EPSILON {
                    break;
                }
                from = to;
                self.break_page();
            }
            self.blocks += 1;
        }
    }

    /// Image rasterized to `width` x `height` pixels, drawn at that size in
    /// points. An unreadable source leaves an empty box of the same size.
    pub fn add_image(&mut self, source: &ImageSource, width: u32, height: u32, align: Alignment) {
        let image = rasterize_or_warn(source, width, height);
        let (w, h) = (width as f32, height as f32);

        self.place_block(h, |canvas, area| {
            if let Some(image) = image {
                let x = area.left + align.offset(area.width, w);
                canvas.draw_image(image, x, area.top - h, w, h);
            }
        });
    }

    /// Two images on one row, flush left and flush right.
    pub fn add_image_pair(&mut self, left: &ImageSource, right: &ImageSource, width: u32, height: u32) {
        let left = rasterize_or_warn(left, width, height);
        let right = rasterize_or_warn(right, width, height);
        let (w, h) = (width as f32, height as f32);

        self.place_block(h, |canvas, area| {
            if let Some(image) = left {
                canvas.draw_image(image, area.left, area.top - h, w, h);
            }
            if let Some(image) = right {
                canvas.draw_image(image, area.left + area.width - w, area.top - h, w, h);
            }
        });
    }

    /// Horizontal rule spanning `percentage` of the content width.
    pub fn add_separator(&mut self, line_width: f32, color: Color, percentage: f32, align: Alignment) {
        let line_width = line_width.max(0.0);
        let height = line_width + 4.0;
        let fraction = (percentage / 100.0).clamp(0.0, 1.0);

        self.place_block(height, |canvas, area| {
            let length = area.width * fraction;
            let x = area.left + align.offset(area.width, length);
            let y = area.top - height / 2.0;
            canvas.draw_line(x, y, x + length, y, line_width, color);
        });
    }

    /// Blank vertical space.
    pub fn add_spacer(&mut self, height: f32) {
        self.place_block(height, |_, _| {});
    }

    fn decorate_current_page(&mut self) {
        let Some(decorator) = self.decorator.as_deref() else {
            return;
        };
        let context = PageContext {
            page_number: self.pages.len() + 1,
            width: self.width,
            height: self.height,
            margins: self.margins,
            title: self.metadata.title.as_deref(),
            author: self.metadata.author.as_deref(),
            created: self.created,
        };
        let mut canvas = PageCanvas {
            content: &mut self.current,
            fonts: &self.fonts,
            images: &mut self.images,
            used_fonts: &mut self.used_fonts,
        };

        canvas.content.end_text().save_state();
        decorator.on_end_page(&context, &mut canvas);
        canvas.content.end_text().restore_state();
        self.decorations += 1;
    }

    fn break_page(&mut self) {
        self.decorate_current_page();
        let finished = std::mem::take(&mut self.current);
        self.pages.push(finished);
        self.cursor_y = self.height - self.margins.top;
        self.page_blocks = 0;
        log::debug!("Started page {}", self.pages.len() + 1);
    }

    /// Close the last page and serialize the document.
    pub fn finish(mut self) -> Result<FinishedDocument> {
        self.decorate_current_page();
        let last = std::mem::take(&mut self.current);
        self.pages.push(last);

        let config = PdfWriterConfig {
            title: self.metadata.title.clone(),
            author: self.metadata.author.clone(),
            subject: self.metadata.subject.clone(),
            keywords: self.metadata.keywords.clone(),
            creator: self.metadata.creator.clone(),
            compress: self.compress,
            creation_date: Some(self.created),
            ..PdfWriterConfig::default()
        };

        let mut writer = PdfWriter::with_config(config);
        for font in &self.used_fonts {
            writer.add_font(font);
        }
        for (name, image) in self.images.into_images() {
            writer.add_image(name, image);
        }
        let page_count = self.pages.len();
        for page in self.pages {
            writer.add_page(self.width, self.height, page);
        }

        let bytes = writer.finish()?;
        log::debug!(
            "Finished document: {} pages, {} blocks, {} decorations",
            page_count,
            self.blocks,
            self.decorations
        );
        Ok(FinishedDocument {
            bytes,
            page_count,
            block_count: self.blocks,
            decorations: self.decorations,
        })
    }
}

fn rasterize_or_warn(source: &ImageSource, width: u32, height: u32) -> Option<ImageData> {
    match source.rasterize(width, height) {
        Ok(image) => Some(image),
        Err(e) => {
            log::warn!("Skipping unreadable image ({}); leaving an empty box", e);
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::content_stream::ContentStreamOp;
    use crate::writer::table_renderer::{BorderStyle, Borders, ColumnSpec, TableCell, TableRow};

    fn builder() -> DocumentBuilder {
        DocumentBuilder::new(PageSize::A4, PageMargins::default())
    }

    /// Page index and baseline of every line of text drawn so far.
    fn baselines(doc: &DocumentBuilder) -> Vec<(usize, f32)> {
        doc.pages
            .iter()
            .chain(std::iter::once(&doc.current))
            .enumerate()
            .flat_map(|(page, content)| {
                content.operations().iter().filter_map(move |op| match op {
                    ContentStreamOp::SetTextMatrix(_, _, _, _, _, y) => Some((page, *y)),
                    _ => None,
                })
            })
            .collect()
    }

    fn pdf_text(doc: FinishedDocument) -> String {
        String::from_utf8_lossy(&doc.bytes).to_string()
    }

    #[test]
    fn test_page_sizes() {
        assert_eq!(PageSize::A4.dimensions(), (595.0, 842.0));
        assert_eq!(PageSize::Letter.dimensions(), (612.0, 792.0));
        assert_eq!(PageSize::Custom(100.0, 200.0).dimensions(), (100.0, 200.0));
        assert_eq!(PageSize::default(), PageSize::A4);
    }

    #[test]
    fn test_empty_document_has_one_page() {
        let doc = builder().finish().unwrap();
        assert_eq!(doc.page_count, 1);
        assert_eq!(doc.block_count, 0);
        assert!(pdf_text(doc).contains("/Count 1"));
    }

    #[test]
    fn test_blocks_flow_onto_new_pages() {
        let mut doc = builder();
        // 770pt usable height holds ten 77pt blocks.
        for _ in 0..10 {
            doc.add_spacer(77.0);
        }
        assert_eq!(doc.page_count(), 1);
        assert!(doc.remaining_height().abs() < 1e-3);
        doc.add_spacer(77.0);
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.block_count(), 11);
    }

    #[test]
    fn test_oversized_spacer_overflows_on_fresh_page() {
        let mut doc = builder();
        doc.add_spacer(2000.0);
        assert_eq!(doc.page_count(), 1);
        doc.add_spacer(1.0);
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn test_paragraph_draws_encoded_text() {
        let mut doc = builder();
        let font = FontDescriptor::times(22.0).with_color(Color::ACCENT);
        doc.add_paragraph("Thank You", &font, Alignment::Right);
        assert_eq!(doc.block_count(), 1);

        let text = pdf_text(doc.finish().unwrap());
        assert!(text.contains("(Thank You) Tj"));
        assert!(text.contains("/TimesRoman 22 Tf"));
        assert!(text.contains("/BaseFont /Times-Roman"));
        assert!(!text.contains("/BaseFont /Helvetica"));
    }

    #[test]
    fn test_table_is_one_block_per_row() {
        let font = FontDescriptor::helvetica(12.0).shared();
        let mut table = Table::new(ColumnSpec::uniform(2));
        for label in ["a", "b", "c"] {
            table
                .push_row(TableRow::new(vec![
                    TableCell::new(label, font.clone()).with_background(Color::LIGHT_GREY),
                    TableCell::new("₹5", font.clone()),
                ]))
                .unwrap();
        }
        let mut doc = builder();
        doc.add_table(&table);
        assert_eq!(doc.block_count(), 3);

        let text = pdf_text(doc.finish().unwrap());
        assert!(text.contains("(Rs.5) Tj"));
        assert!(text.contains(" re\nf"));
    }

    #[test]
    fn test_unreadable_image_leaves_empty_box() {
        let mut doc = builder();
        let before = doc.remaining_height();
        doc.add_image(&ImageSource::encoded(b"not an image".to_vec()), 100, 75, Alignment::Left);
        assert_eq!(doc.block_count(), 1);
        assert!((before - doc.remaining_height() - 75.0).abs() < 1e-3);
        assert!(!pdf_text(doc.finish().unwrap()).contains("/Subtype /Image"));
    }

    #[test]
    fn test_image_pair_embeds_two_images() {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(4, 4, image::Rgb([255, 0, 0])));
        let source = ImageSource::pixels(img);
        let mut doc = builder();
        doc.add_image_pair(&source, &source, 100, 75);
        assert_eq!(doc.block_count(), 1);
        let text = pdf_text(doc.finish().unwrap());
        assert_eq!(text.matches("/Subtype /Image").count(), 2);
        assert!(text.contains("/Im1 Do"));
        assert!(text.contains("/Im2 Do"));
    }

    #[test]
    fn test_separator_is_one_block() {
        let mut doc = builder();
        doc.add_separator(1.0, Color::BLACK.over_white(68), 100.0, Alignment::Center);
        assert_eq!(doc.block_count(), 1);
        let text = pdf_text(doc.finish().unwrap());
        assert!(text.contains(" m\n"));
        assert!(text.contains("\nS\n"));
    }

    #[test]
    fn test_paragraph_fills_page_then_continues() {
        let font = FontDescriptor::helvetica(12.0);
        let mut doc = builder();
        doc.add_spacer(700.0);
        // 70pt left: three 18pt lines fit, the rest move on.
        let text = vec!["line"; 10].join("\n");
        doc.add_paragraph(&text, &font, Alignment::Left);

        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.block_count(), 2);
        let lines = baselines(&doc);
        assert_eq!(lines.len(), 10);
        assert_eq!(lines.iter().filter(|(page, _)| *page == 0).count(), 3);
        assert!((doc.remaining_height() - (770.0 - 7.0 * 18.0)).abs() < 1e-3);
    }

    #[test]
    fn test_long_paragraph_stays_inside_margins() {
        let font = FontDescriptor::helvetica(12.0);
        let mut doc = builder();
        doc.add_paragraph(&"word ".repeat(2000), &font, Alignment::Left);

        let width = doc.content_width();
        let expected_lines = doc.canvas().wrap_text(&"word ".repeat(2000), &font, width).len();
        let lines = baselines(&doc);
        assert_eq!(lines.len(), expected_lines);
        assert!(doc.page_count() > 1);
        assert_eq!(doc.block_count(), 1);
        let bottom = doc.margins().bottom;
        let top = 842.0 - doc.margins().top;
        for (_, y) in &lines {
            assert!(*y >= bottom && *y <= top, "baseline {} outside the content box", y);
        }
    }

    #[test]
    fn test_tall_table_row_splits_between_lines() {
        let font = FontDescriptor::helvetica(12.0).shared();
        let text = "word ".repeat(3000);
        let table = Table::new(ColumnSpec::uniform(1))
            .with_row(TableRow::new(vec![TableCell::new(text, font.clone())
                .with_background(Color::LIGHT_GREY)
                .with_borders(Borders::all(BorderStyle::new(1.0, Color::BLACK)))]))
            .unwrap();

        let mut doc = builder();
        doc.add_spacer(18.0);
        doc.add_table(&table);

        let widths = table.columns().resolve(doc.content_width());
        let layout = table.layout_row(0, &widths, &doc.canvas());
        assert!(layout.height > doc.usable_height());
        assert_eq!(doc.block_count(), 2);
        assert!(doc.page_count() >= 3);

        let lines = baselines(&doc);
        assert_eq!(lines.len(), layout.lines[0].len());
        // The row starts on a fresh page.
        assert!(lines.iter().all(|(page, _)| *page > 0));
        let bottom = doc.margins().bottom;
        assert!(lines.iter().all(|(_, y)| *y >= bottom));
    }

    #[test]
    fn test_row_that_fits_a_page_is_moved_whole() {
        let font = FontDescriptor::helvetica(12.0).shared();
        let table = Table::new(ColumnSpec::uniform(1))
            .with_row(TableRow::new(vec![TableCell::new(vec!["x"; 5].join("\n"), font)]))
            .unwrap();
        let mut doc = builder();
        doc.add_spacer(740.0);
        doc.add_table(&table);
        assert_eq!(doc.page_count(), 2);
        assert!(baselines(&doc).iter().all(|(page, _)| *page == 1));
    }
}
