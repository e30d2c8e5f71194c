//! Image handling for PDF generation.
//!
//! Images are represented as XObjects (PDF spec Section 8.9). Every source,
//! whatever its original format, is rasterized to the requested pixel size
//! and stored losslessly as 8-bit samples under `FlateDecode`, with any
//! alpha channel split out into a soft mask.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use indexmap::IndexMap;

use crate::object::Object;

/// Errors that can occur while resolving an image source.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The source file could not be read
    #[error("Failed to read image {path}: {source}")]
    Read {
        /// Path that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The source bytes are not a decodable image
    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    /// Requested raster size has a zero dimension
    #[error("Invalid image size {width}x{height}")]
    InvalidSize {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// Compression failed
    #[error("Failed to compress image data: {0}")]
    CompressionError(String),
}

impl From<ImageError> for crate::error::Error {
    fn from(err: ImageError) -> Self {
        crate::error::Error::Image(err.to_string())
    }
}

/// Where an image comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Image file on disk (PNG or JPEG)
    Path(PathBuf),
    /// Encoded image bytes (PNG or JPEG)
    Encoded(Arc<Vec<u8>>),
    /// Already decoded pixels
    Pixels(Arc<DynamicImage>),
}

impl ImageSource {
    /// Image file on disk.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        ImageSource::Path(path.into())
    }

    /// Encoded PNG/JPEG bytes.
    pub fn encoded(bytes: impl Into<Vec<u8>>) -> Self {
        ImageSource::Encoded(Arc::new(bytes.into()))
    }

    /// Decoded pixels.
    pub fn pixels(image: DynamicImage) -> Self {
        ImageSource::Pixels(Arc::new(image))
    }

    /// Decode the source and rasterize it to exactly `width` x `height` pixels.
    pub fn rasterize(&self, width: u32, height: u32) -> Result<ImageData, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidSize { width, height });
        }

        let decoded = match self {
            ImageSource::Path(path) => {
                let bytes = std::fs::read(path).map_err(|source| ImageError::Read {
                    path: path.clone(),
                    source,
                })?;
                decode(&bytes)?
            },
            ImageSource::Encoded(bytes) => decode(bytes)?,
            ImageSource::Pixels(image) => image.as_ref().clone(),
        };

        let sized = if decoded.dimensions() == (width, height) {
            decoded
        } else {
            decoded.resize_exact(width, height, FilterType::Triangle)
        };
        ImageData::from_dynamic(&sized)
    }
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    image::load_from_memory(bytes).map_err(|e| ImageError::DecodeError(e.to_string()))
}

/// Color space for image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Grayscale (1 component per pixel)
    DeviceGray,
    /// RGB color (3 components per pixel)
    DeviceRGB,
}

impl ColorSpace {
    /// Get the PDF name for this color space.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceGray => "DeviceGray",
            ColorSpace::DeviceRGB => "DeviceRGB",
        }
    }
}

/// Rasterized image ready for embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Color space
    pub color_space: ColorSpace,
    /// Flate-compressed samples
    pub data: Vec<u8>,
    /// Flate-compressed alpha samples, if the image has transparency
    pub soft_mask: Option<Vec<u8>>,
}

impl ImageData {
    /// Build from decoded pixels, keeping alpha only when it is not fully opaque.
    pub fn from_dynamic(img: &DynamicImage) -> Result<Self, ImageError> {
        let (width, height) = img.dimensions();
        let has_alpha = img.color().has_alpha();
        let grayscale = !img.color().has_color();

        let (color_space, samples, alpha) = if grayscale {
            if has_alpha {
                let la = img.to_luma_alpha8();
                let mut gray = Vec::with_capacity((width * height) as usize);
                let mut alpha = Vec::with_capacity((width * height) as usize);
                for p in la.pixels() {
                    gray.push(p.0[0]);
                    alpha.push(p.0[1]);
                }
                (ColorSpace::DeviceGray, gray, Some(alpha))
            } else {
                (ColorSpace::DeviceGray, img.to_luma8().into_raw(), None)
            }
        } else if has_alpha {
            let rgba = img.to_rgba8();
            let mut rgb = Vec::with_capacity((width * height * 3) as usize);
            let mut alpha = Vec::with_capacity((width * height) as usize);
            for p in rgba.pixels() {
                rgb.extend_from_slice(&p.0[..3]);
                alpha.push(p.0[3]);
            }
            (ColorSpace::DeviceRGB, rgb, Some(alpha))
        } else {
            (ColorSpace::DeviceRGB, img.to_rgb8().into_raw(), None)
        };

        let alpha = alpha.filter(|a| a.iter().any(|&v| v != 255));

        Ok(Self {
            width,
            height,
            color_space,
            data: compress(&samples)?,
            soft_mask: alpha.map(|a| compress(&a)).transpose()?,
        })
    }

    /// XObject dictionary for the color samples.
    pub fn build_xobject_dict(&self) -> HashMap<String, Object> {
        image_dict(self.width, self.height, self.color_space, self.data.len())
    }

    /// XObject dictionary for the soft mask, if any.
    pub fn build_soft_mask_dict(&self) -> Option<HashMap<String, Object>> {
        self.soft_mask
            .as_ref()
            .map(|mask| image_dict(self.width, self.height, ColorSpace::DeviceGray, mask.len()))
    }

    /// Largest size with this image's aspect ratio that fits the box.
    pub fn fit_to_box(&self, max_width: f32, max_height: f32) -> (f32, f32) {
        let scale = (max_width / self.width as f32).min(max_height / self.height as f32);
        (self.width as f32 * scale, self.height as f32 * scale)
    }
}

fn image_dict(width: u32, height: u32, cs: ColorSpace, len: usize) -> HashMap<String, Object> {
    let mut dict = HashMap::new();
    dict.insert("Type".to_string(), Object::Name("XObject".to_string()));
    dict.insert("Subtype".to_string(), Object::Name("Image".to_string()));
    dict.insert("Width".to_string(), Object::Integer(width as i64));
    dict.insert("Height".to_string(), Object::Integer(height as i64));
    dict.insert("ColorSpace".to_string(), Object::Name(cs.pdf_name().to_string()));
    dict.insert("BitsPerComponent".to_string(), Object::Integer(8));
    dict.insert("Filter".to_string(), Object::Name("FlateDecode".to_string()));
    dict.insert("Length".to_string(), Object::Integer(len as i64));
    dict
}

fn compress(data: &[u8]) -> Result<Vec<u8>, ImageError> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| ImageError::CompressionError(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| ImageError::CompressionError(e.to_string()))
}

/// Registry of images placed in a document, keyed by resource name.
///
/// Resource names are `Im1`, `Im2`, ... in registration order. Shared images
/// (for example a decorator thumbnail drawn on every page) are registered
/// once and reuse their name.
#[derive(Debug, Default)]
pub struct ImageManager {
    images: IndexMap<String, Arc<ImageData>>,
    shared: HashMap<usize, String>,
}

impl ImageManager {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image and return its resource name.
    pub fn register(&mut self, image: ImageData) -> String {
        self.insert(Arc::new(image))
    }

    /// Register a shared image once; later calls return the same name.
    pub fn register_shared(&mut self, image: &Arc<ImageData>) -> String {
        let key = Arc::as_ptr(image) as usize;
        if let Some(name) = self.shared.get(&key) {
            return name.clone();
        }
        let name = self.insert(Arc::clone(image));
        self.shared.insert(key, name.clone());
        name
    }

    fn insert(&mut self, image: Arc<ImageData>) -> String {
        let name = format!("Im{}", self.images.len() + 1);
        self.images.insert(name.clone(), image);
        name
    }

    /// Images with their resource names, in registration order.
    pub fn images(&self) -> impl Iterator<Item = (&str, &ImageData)> {
        self.images.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Consume the registry, yielding images in registration order.
    pub fn into_images(self) -> impl Iterator<Item = (String, Arc<ImageData>)> {
        self.images.into_iter()
    }

    /// Number of registered images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether no images are registered.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
