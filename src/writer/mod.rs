//! PDF writing for composed documents.
//!
//! ## Architecture
//!
//! ```text
//! ContentAction[]
//!     ↓
//! [DocumentBuilder] (blocks flowed top-down, page breaks, decorators)
//!     ↓
//! [ContentStreamBuilder] (drawing operations → content stream bytes)
//!     ↓
//! [PdfWriter] (pages, fonts, images, info → complete file)
//!     ↓
//! [ObjectSerializer] (serializes PDF objects)
//!     ↓
//! PDF bytes
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use receipt_composer::config::PageMargins;
//! use receipt_composer::style::{Alignment, FontDescriptor};
//! use receipt_composer::writer::{DocumentBuilder, PageSize};
//!
//! let mut doc = DocumentBuilder::new(PageSize::A4, PageMargins::default());
//! doc.add_paragraph("Hello, World!", &FontDescriptor::helvetica(12.0), Alignment::Left);
//! let finished = doc.finish()?;
//! ```

mod content_stream;
mod document_builder;
pub(crate) mod encoding;
pub(crate) mod font_manager;
mod image_handler;
mod object_serializer;
mod pdf_writer;
mod table_renderer;

pub use content_stream::{ContentStreamBuilder, ContentStreamOp};
pub use document_builder::{
    BlockArea, DocumentBuilder, DocumentMetadata, FinishedDocument, PageCanvas, PageSize,
    DEFAULT_SPACER_HEIGHT,
};
pub use font_manager::{FontFamily, FontInfo, FontManager, FontWeight};
pub use image_handler::{ColorSpace, ImageData, ImageError, ImageManager, ImageSource};
pub use object_serializer::ObjectSerializer;
pub use pdf_writer::{pdf_date, PdfWriter, PdfWriterConfig};
pub use table_renderer::{
    BorderStyle, Borders, CellPadding, ColumnSpec, RowLayout, Table, TableCell, TableRow,
};
