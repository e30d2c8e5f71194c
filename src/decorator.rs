//! Per-page header and footer decoration.
//!
//! A [`PageDecorator`] runs once for every finished page, after the page's
//! content has been laid out, and draws furniture that does not depend on the
//! content: ruled lines, a banner text, a thumbnail.
//!
//! [`BandDecorator`] covers the header and footer styles used by the receipt
//! layouts: two parallel lines near the top or bottom of the page plus an
//! optional text (with placeholders) and thumbnail flush with the lines.
//!
//! ```ignore
//! use receipt_composer::decorator::BandDecorator;
//!
//! let footer = BandDecorator::footer(
//!     "Page {page} - generated {date}",
//!     FontDescriptor::helvetica(10.0).shared(),
//!     Color::ORANGE,
//!     Color::PURPLE,
//!     2.0,
//! );
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::PageMargins;
use crate::style::{Alignment, Color, FontDescriptor, SharedFont};
use crate::writer::{ImageData, PageCanvas};

/// Largest thumbnail edge in points.
const THUMBNAIL_BOX: f32 = 50.0;

/// What a decorator knows about the page it is drawing on.
#[derive(Debug, Clone)]
pub struct PageContext<'a> {
    /// 1-based physical page number
    pub page_number: usize,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Document margins
    pub margins: PageMargins,
    /// Document title, if set
    pub title: Option<&'a str>,
    /// Document author, if set
    pub author: Option<&'a str>,
    /// Creation timestamp of the document
    pub created: DateTime<Utc>,
}

/// Hook invoked at the end of every physical page, including the last.
pub trait PageDecorator: Send {
    /// Draw page furniture onto `canvas`.
    fn on_end_page(&self, page: &PageContext<'_>, canvas: &mut PageCanvas<'_>);
}

/// Placeholder tokens that can be used in band text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// Current page number (1-indexed)
    PageNumber,
    /// Creation date (formatted as YYYY-MM-DD)
    Date,
    /// Creation time (formatted as HH:MM)
    Time,
    /// Document title (from metadata)
    Title,
    /// Document author (from metadata)
    Author,
}

impl Placeholder {
    /// Every placeholder.
    pub const ALL: [Placeholder; 5] = [
        Placeholder::PageNumber,
        Placeholder::Date,
        Placeholder::Time,
        Placeholder::Title,
        Placeholder::Author,
    ];

    /// Get the placeholder token string.
    pub fn token(&self) -> &'static str {
        match self {
            Placeholder::PageNumber => "{page}",
            Placeholder::Date => "{date}",
            Placeholder::Time => "{time}",
            Placeholder::Title => "{title}",
            Placeholder::Author => "{author}",
        }
    }

    /// Value of this placeholder on `page`. Missing metadata resolves to "".
    pub fn value(&self, page: &PageContext<'_>) -> String {
        match self {
            Placeholder::PageNumber => page.page_number.to_string(),
            Placeholder::Date => page.created.format("%Y-%m-%d").to_string(),
            Placeholder::Time => page.created.format("%H:%M").to_string(),
            Placeholder::Title => page.title.unwrap_or_default().to_string(),
            Placeholder::Author => page.author.unwrap_or_default().to_string(),
        }
    }

    /// Replace every placeholder token in `template`.
    pub fn resolve(template: &str, page: &PageContext<'_>) -> String {
        let mut text = template.to_string();
        for placeholder in Placeholder::ALL {
            if text.contains(placeholder.token()) {
                text = text.replace(placeholder.token(), &placeholder.value(page));
            }
        }
        text
    }
}

/// Which page edge the band hugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandPosition {
    /// Header band
    Top,
    /// Footer band
    Bottom,
}

/// What the line offsets are measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandAnchor {
    /// Lines sit in the margin just outside the content box and span the
    /// content width; text goes beyond them, toward the page edge.
    Margin,
    /// Lines sit just inside the physical page edge and span the full page
    /// width; text goes beyond them, toward the content.
    PageEdge,
}

/// Two ruled lines plus optional text and thumbnail near one page edge.
#[derive(Debug, Clone)]
pub struct BandDecorator {
    position: BandPosition,
    anchor: BandAnchor,
    text: Option<String>,
    font: SharedFont,
    align: Alignment,
    line_colors: (Color, Color),
    line_width: f32,
    outline_width: Option<f32>,
    offset: f32,
    gap: f32,
    text_gap: f32,
    thumbnail: Option<Arc<ImageData>>,
}

impl BandDecorator {
    /// Band with default offsets for its anchor and no text.
    pub fn new(position: BandPosition, anchor: BandAnchor) -> Self {
        let (offset, gap) = match anchor {
            BandAnchor::Margin => (10.0, 5.0),
            BandAnchor::PageEdge => (3.0, 8.0),
        };
        Self {
            position,
            anchor,
            text: None,
            font: FontDescriptor::helvetica(10.0).shared(),
            align: Alignment::Center,
            line_colors: (Color::ORANGE, Color::PURPLE),
            line_width: 1.0,
            outline_width: None,
            offset,
            gap,
            text_gap: 4.0,
            thumbnail: None,
        }
    }

    /// Header in the top margin: title flush right, optional thumbnail left.
    pub fn header(
        title: impl Into<String>,
        font: SharedFont,
        line1: Color,
        line2: Color,
        line_width: f32,
    ) -> Self {
        Self::new(BandPosition::Top, BandAnchor::Margin)
            .with_text(title)
            .with_font(font)
            .with_align(Alignment::Right)
            .with_lines(line1, line2, line_width)
    }

    /// Footer in the bottom margin with centered text.
    pub fn footer(
        text: impl Into<String>,
        font: SharedFont,
        line1: Color,
        line2: Color,
        line_width: f32,
    ) -> Self {
        Self::new(BandPosition::Bottom, BandAnchor::Margin)
            .with_text(text)
            .with_font(font)
            .with_lines(line1, line2, line_width)
    }

    /// Orange and purple banded lines along the top page edge.
    pub fn edge_header() -> Self {
        Self::new(BandPosition::Top, BandAnchor::PageEdge)
            .with_lines(Color::ORANGE, Color::PURPLE, 6.0)
            .with_outline(8.0)
    }

    /// Banded lines along the bottom page edge with a centered note above.
    pub fn edge_footer(note: impl Into<String>) -> Self {
        Self::new(BandPosition::Bottom, BandAnchor::PageEdge)
            .with_lines(Color::ORANGE, Color::PURPLE, 6.0)
            .with_outline(8.0)
            .with_text(note)
            .with_text_gap(20.0)
    }

    /// Set the band text; `{page}`, `{date}`, `{time}`, `{title}` and
    /// `{author}` are replaced per page.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the text font.
    pub fn with_font(mut self, font: SharedFont) -> Self {
        self.font = font;
        self
    }

    /// Set the text alignment within the band.
    pub fn with_align(mut self, align: Alignment) -> Self {
        self.align = align;
        self
    }

    /// Set both line colors and the line width.
    pub fn with_lines(mut self, first: Color, second: Color, width: f32) -> Self {
        self.line_colors = (first, second);
        self.line_width = width;
        self
    }

    /// Draw each line over a wider stroke in the other line's color.
    pub fn with_outline(mut self, width: f32) -> Self {
        self.outline_width = Some(width);
        self
    }

    /// Distance of the first line from the anchor.
    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    /// Distance between the two lines.
    pub fn with_gap(mut self, gap: f32) -> Self {
        self.gap = gap;
        self
    }

    /// Distance between the second line and the text or thumbnail.
    pub fn with_text_gap(mut self, gap: f32) -> Self {
        self.text_gap = gap;
        self
    }

    /// Thumbnail drawn at the start of the band, fitted to 50x50.
    pub fn with_thumbnail(mut self, image: Arc<ImageData>) -> Self {
        self.thumbnail = Some(image);
        self
    }

    /// Band position.
    pub fn position(&self) -> BandPosition {
        self.position
    }

    /// Band anchor.
    pub fn anchor(&self) -> BandAnchor {
        self.anchor
    }

    /// Vertical positions of the two lines on `page`.
    pub fn line_positions(&self, page: &PageContext<'_>) -> (f32, f32) {
        let first = match (self.position, self.anchor) {
            (BandPosition::Top, BandAnchor::Margin) => page.height - page.margins.top + self.offset,
            (BandPosition::Bottom, BandAnchor::Margin) => page.margins.bottom - self.offset,
            (BandPosition::Top, BandAnchor::PageEdge) => page.height - self.offset,
            (BandPosition::Bottom, BandAnchor::PageEdge) => self.offset,
        };
        (first, first + self.gap * self.direction())
    }

    /// Horizontal extent of the lines on `page`.
    pub fn span(&self, page: &PageContext<'_>) -> (f32, f32) {
        match self.anchor {
            BandAnchor::Margin => (page.margins.left, page.width - page.margins.right),
            BandAnchor::PageEdge => (0.0, page.width),
        }
    }

    /// +1 when the band grows upward from its first line, -1 when downward.
    fn direction(&self) -> f32 {
        match (self.position, self.anchor) {
            (BandPosition::Top, BandAnchor::Margin) | (BandPosition::Bottom, BandAnchor::PageEdge) => 1.0,
            (BandPosition::Bottom, BandAnchor::Margin) | (BandPosition::Top, BandAnchor::PageEdge) => -1.0,
        }
    }

    fn draw_line(&self, canvas: &mut PageCanvas<'_>, left: f32, right: f32, y: f32, color: Color, other: Color) {
        if let Some(outline) = self.outline_width {
            canvas.draw_line(left, y, right, y, outline, other);
        }
        canvas.draw_line(left, y, right, y, self.line_width, color);
    }
}

impl PageDecorator for BandDecorator {
    fn on_end_page(&self, page: &PageContext<'_>, canvas: &mut PageCanvas<'_>) {
        let (left, right) = self.span(page);
        let (first, second) = self.line_positions(page);
        let (c1, c2) = self.line_colors;
        self.draw_line(canvas, left, right, first, c1, c2);
        self.draw_line(canvas, left, right, second, c2, c1);

        let dir = self.direction();
        let half_stroke = self.outline_width.unwrap_or(self.line_width) / 2.0;
        // Edge of the slot nearest the lines.
        let slot_start = second + dir * (half_stroke + self.text_gap);

        let mut text_left = left;
        if let Some(thumbnail) = &self.thumbnail {
            // Margin bands must not run off the page.
            let room = match self.anchor {
                BandAnchor::Margin if dir > 0.0 => page.height - slot_start,
                BandAnchor::Margin => slot_start,
                BandAnchor::PageEdge => THUMBNAIL_BOX,
            };
            let side = THUMBNAIL_BOX.min(room.max(0.0));
            let (w, h) = thumbnail.fit_to_box(side, side);
            let y = if dir > 0.0 { slot_start } else { slot_start - h };
            canvas.draw_shared_image(thumbnail, left, y, w, h);
            text_left += w + self.text_gap;
        }

        if let Some(template) = &self.text {
            let text = Placeholder::resolve(template, page);
            if text.is_empty() {
                return;
            }
            let size = self.font.size();
            let baseline = if dir > 0.0 {
                slot_start + size * 0.25
            } else {
                slot_start - size * 0.75
            };
            let width = (right - text_left).max(0.0);
            canvas.draw_text_in(&text, &self.font, text_left, width, baseline, self.align);
        }
    }
}
