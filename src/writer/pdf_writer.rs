//! PDF document writer.
//!
//! Assembles complete PDF documents with proper structure:
//! header, body, xref table, and trailer.
//!
//! Objects are numbered in a fixed order (catalog, page tree, fonts, images,
//! shared resources, pages, info) and written sequentially, so identical input
//! always produces identical bytes.

use super::content_stream::ContentStreamBuilder;
use super::image_handler::ImageData;
use super::object_serializer::ObjectSerializer;
use crate::error::Result;
use crate::object::{Object, ObjectRef};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

/// Configuration for PDF generation.
#[derive(Debug, Clone)]
pub struct PdfWriterConfig {
    /// PDF version (e.g., "1.7")
    pub version: String,
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
    /// Producer recorded in the info dictionary
    pub producer: String,
    /// Whether to compress content streams
    pub compress: bool,
    /// Creation timestamp; omitted from the info dictionary when `None`
    pub creation_date: Option<DateTime<Utc>>,
}

impl Default for PdfWriterConfig {
    fn default() -> Self {
        Self {
            version: "1.7".to_string(),
            title: None,
            author: None,
            subject: None,
            keywords: None,
            creator: None,
            producer: "receipt_composer".to_string(),
            compress: false,
            creation_date: None,
        }
    }
}

impl PdfWriterConfig {
    /// Set document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set document author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set document subject.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set document keywords.
    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    /// Set the creator application.
    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    /// Enable or disable FlateDecode compression of content streams.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Set the creation date.
    pub fn with_creation_date(mut self, date: DateTime<Utc>) -> Self {
        self.creation_date = Some(date);
        self
    }
}

/// Resource name under which a base-14 font is registered on every page.
///
/// `Times-Bold` becomes `TimesBold`.
pub fn font_resource_name(base_font: &str) -> String {
    base_font.replace('-', "")
}

/// PDF date string, `D:YYYYMMDDHHmmSSZ`.
pub fn pdf_date(date: &DateTime<Utc>) -> String {
    date.format("D:%Y%m%d%H%M%SZ").to_string()
}

/// Text string object: literal when ASCII, UTF-16BE with BOM otherwise.
fn text_string(s: &str) -> Object {
    if s.is_ascii() {
        return ObjectSerializer::string(s);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes)
}

fn compress_data(data: &[u8]) -> std::io::Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

struct PageData {
    width: f32,
    height: f32,
    content: ContentStreamBuilder,
}

/// PDF writer.
///
/// Pages arrive fully drawn; fonts and images are registered once and shared
/// by every page through a single resource dictionary.
pub struct PdfWriter {
    config: PdfWriterConfig,
    pages: Vec<PageData>,
    fonts: Vec<&'static str>,
    images: Vec<(String, Arc<ImageData>)>,
}

impl PdfWriter {
    /// Create a new PDF writer with default config.
    pub fn new() -> Self {
        Self::with_config(PdfWriterConfig::default())
    }

    /// Create a PDF writer with custom config.
    pub fn with_config(config: PdfWriterConfig) -> Self {
        Self {
            config,
            pages: Vec::new(),
            fonts: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Append a finished page.
    pub fn add_page(&mut self, width: f32, height: f32, content: ContentStreamBuilder) {
        self.pages.push(PageData {
            width,
            height,
            content,
        });
    }

    /// Register a base-14 font. Duplicates are ignored.
    pub fn add_font(&mut self, base_font: &'static str) {
        if !self.fonts.contains(&base_font) {
            self.fonts.push(base_font);
        }
    }

    /// Register an image XObject under `resource_name`.
    pub fn add_image(&mut self, resource_name: impl Into<String>, image: Arc<ImageData>) {
        self.images.push((resource_name.into(), image));
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Build the complete PDF document.
    pub fn finish(self) -> Result<Vec<u8>> {
        let serializer = ObjectSerializer::compact();
        let mut objects: Vec<Object> = Vec::new();
        fn alloc(objects: &mut Vec<Object>, obj: Object) -> ObjectRef {
            objects.push(obj);
            ObjectRef::new(objects.len() as u32, 0)
        }

        // Catalog and page tree are patched once page ids are known.
        let catalog_ref = alloc(&mut objects, Object::Null);
        let pages_ref = alloc(&mut objects, Object::Null);

        let mut font_resources = HashMap::new();
        for base_font in &self.fonts {
            let font = ObjectSerializer::dict(vec![
                ("Type", ObjectSerializer::name("Font")),
                ("Subtype", ObjectSerializer::name("Type1")),
                ("BaseFont", ObjectSerializer::name(base_font)),
                ("Encoding", ObjectSerializer::name("WinAnsiEncoding")),
            ]);
            let font_ref = alloc(&mut objects, font);
            font_resources.insert(font_resource_name(base_font), Object::Reference(font_ref));
        }

        let mut xobject_resources = HashMap::new();
        for (name, image) in &self.images {
            let mut image_obj = Object::Stream {
                dict: image.build_xobject_dict(),
                data: bytes::Bytes::from(image.data.clone()),
            };
            if let (Some(mask_dict), Some(mask)) = (image.build_soft_mask_dict(), &image.soft_mask) {
                let mask_ref = alloc(
                    &mut objects,
                    Object::Stream {
                        dict: mask_dict,
                        data: bytes::Bytes::from(mask.clone()),
                    },
                );
                image_obj.insert("SMask", Object::Reference(mask_ref));
            }
            let image_ref = alloc(&mut objects, image_obj);
            xobject_resources.insert(name.clone(), Object::Reference(image_ref));
        }

        let mut resources = HashMap::new();
        resources.insert(
            "ProcSet".to_string(),
            Object::Array(vec![
                ObjectSerializer::name("PDF"),
                ObjectSerializer::name("Text"),
                ObjectSerializer::name("ImageB"),
                ObjectSerializer::name("ImageC"),
            ]),
        );
        if !font_resources.is_empty() {
            resources.insert("Font".to_string(), Object::Dictionary(font_resources));
        }
        if !xobject_resources.is_empty() {
            resources.insert("XObject".to_string(), Object::Dictionary(xobject_resources));
        }
        let resources_ref = alloc(&mut objects, Object::Dictionary(resources));

        let mut kids = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let raw = page.content.build()?;
            let mut content = Object::Stream {
                dict: HashMap::new(),
                data: bytes::Bytes::new(),
            };
            let data = if self.config.compress {
                content.insert("Filter", ObjectSerializer::name("FlateDecode"));
                compress_data(&raw)?
            } else {
                raw
            };
            if let Object::Stream { data: stream_data, .. } = &mut content {
                *stream_data = bytes::Bytes::from(data);
            }
            let content_ref = alloc(&mut objects, content);

            // Parent is known up front; the page tree object is filled in below.
            let page_obj = ObjectSerializer::dict(vec![
                ("Type", ObjectSerializer::name("Page")),
                ("Parent", ObjectSerializer::reference(pages_ref)),
                (
                    "MediaBox",
                    ObjectSerializer::rect(0.0, 0.0, page.width as f64, page.height as f64),
                ),
                ("Contents", ObjectSerializer::reference(content_ref)),
                ("Resources", ObjectSerializer::reference(resources_ref)),
            ]);
            kids.push(Object::Reference(alloc(&mut objects, page_obj)));
        }

        let mut info = vec![("Producer", text_string(&self.config.producer))];
        let optional = [
            ("Title", &self.config.title),
            ("Author", &self.config.author),
            ("Subject", &self.config.subject),
            ("Keywords", &self.config.keywords),
            ("Creator", &self.config.creator),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                info.push((key, text_string(value)));
            }
        }
        if let Some(date) = &self.config.creation_date {
            info.push(("CreationDate", ObjectSerializer::string(&pdf_date(date))));
            info.push(("ModDate", ObjectSerializer::string(&pdf_date(date))));
        }
        let info_ref = alloc(&mut objects, ObjectSerializer::dict(info));

        objects[(pages_ref.id - 1) as usize] = ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("Pages")),
            ("Count", ObjectSerializer::integer(kids.len() as i64)),
            ("Kids", Object::Array(kids)),
        ]);
        objects[(catalog_ref.id - 1) as usize] = ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("Catalog")),
            ("Pages", ObjectSerializer::reference(pages_ref)),
        ]);

        let mut output = Vec::new();
        writeln!(output, "%PDF-{}", self.config.version)?;
        // Binary marker so transfer tools treat the file as binary.
        output.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

        let mut offsets = Vec::with_capacity(objects.len());
        for (idx, obj) in objects.iter().enumerate() {
            offsets.push(output.len());
            serializer.write_indirect(&mut output, idx as u32 + 1, 0, obj)?;
        }

        let xref_start = output.len();
        let size = objects.len() + 1;
        writeln!(output, "xref")?;
        writeln!(output, "0 {}", size)?;
        writeln!(output, "0000000000 65535 f ")?;
        for offset in &offsets {
            writeln!(output, "{:010} 00000 n ", offset)?;
        }

        let trailer = ObjectSerializer::dict(vec![
            ("Size", ObjectSerializer::integer(size as i64)),
            ("Root", ObjectSerializer::reference(catalog_ref)),
            ("Info", ObjectSerializer::reference(info_ref)),
        ]);
        writeln!(output, "trailer")?;
        serializer.write_object(&mut output, &trailer)?;
        writeln!(output)?;
        writeln!(output, "startxref")?;
        writeln!(output, "{}", xref_start)?;
        write!(output, "%%EOF")?;

        log::debug!(
            "Wrote PDF: {} pages, {} fonts, {} images, {} bytes",
            self.pages.len(),
            self.fonts.len(),
            self.images.len(),
            output.len()
        );
        Ok(output)
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}
