//! Assembly configuration.
//!
//! Everything an assembly needs besides its content: where the artifact goes,
//! page geometry, document metadata, and pool sizing. Loadable from JSON.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::CurrencyFormat;
use crate::error::{Error, Result};
use crate::writer::{DocumentMetadata, PageSize};

/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageMargins {
    /// Top margin
    pub top: f32,
    /// Right margin
    pub right: f32,
    /// Bottom margin
    pub bottom: f32,
    /// Left margin
    pub left: f32,
}

impl PageMargins {
    /// Same margin on every side.
    pub fn uniform(margin: f32) -> Self {
        Self {
            top: margin,
            right: margin,
            bottom: margin,
            left: margin,
        }
    }
}

impl Default for PageMargins {
    fn default() -> Self {
        Self::uniform(36.0)
    }
}

/// `<documents_dir>/<app_folder>/<file_name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputLocation {
    /// Base documents directory
    pub documents_dir: PathBuf,
    /// Application sub-folder
    pub app_folder: String,
    /// Artifact file name
    pub file_name: String,
}

impl OutputLocation {
    /// Directory the artifact is written into.
    pub fn directory(&self) -> PathBuf {
        self.documents_dir.join(&self.app_folder)
    }

    /// Full artifact path.
    pub fn path(&self) -> PathBuf {
        self.directory().join(&self.file_name)
    }
}

impl Default for OutputLocation {
    fn default() -> Self {
        Self {
            documents_dir: PathBuf::from("documents"),
            app_folder: "OCEAN".to_string(),
            file_name: "Receipt.pdf".to_string(),
        }
    }
}

/// Configuration for one document assembly and the pool that runs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Artifact location
    pub output: OutputLocation,
    /// Page size
    pub page_size: PageSize,
    /// Page margins
    pub margins: PageMargins,
    /// Document metadata
    pub metadata: DocumentMetadata,
    /// Compress content streams
    pub compress: bool,
    /// Fixed creation date; the current time is used when absent
    pub creation_date: Option<DateTime<Utc>>,
    /// Currency marker for amounts and totals
    pub currency: CurrencyFormat,
    /// Worker threads in the assembly pool
    pub workers: usize,
    /// Queued assemblies accepted before `submit` blocks
    pub queue_capacity: usize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            output: OutputLocation::default(),
            page_size: PageSize::A4,
            margins: PageMargins::default(),
            metadata: DocumentMetadata::default(),
            compress: false,
            creation_date: None,
            currency: CurrencyFormat::default(),
            workers: 2,
            queue_capacity: 8,
        }
    }
}

impl AssemblyConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Reject configurations that cannot produce a document.
    pub fn validate(&self) -> Result<()> {
        if self.output.file_name.trim().is_empty() {
            return Err(Error::Config("output file name is empty".to_string()));
        }
        if self.workers == 0 {
            return Err(Error::Config("at least one worker is required".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(Error::Config("queue capacity must be positive".to_string()));
        }
        let m = &self.margins;
        if [m.top, m.right, m.bottom, m.left].iter().any(|v| *v < 0.0 || !v.is_finite()) {
            return Err(Error::Config("margins must be finite and non-negative".to_string()));
        }
        let (width, height) = self.page_size.dimensions();
        if m.left + m.right >= width || m.top + m.bottom >= height {
            return Err(Error::Config(format!(
                "margins leave no content area on a {}x{} page",
                width, height
            )));
        }
        Ok(())
    }

    /// Full artifact path.
    pub fn output_path(&self) -> PathBuf {
        self.output.path()
    }

    /// Set the base documents directory.
    pub fn with_documents_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output.documents_dir = dir.into();
        self
    }

    /// Set the application sub-folder.
    pub fn with_app_folder(mut self, folder: impl Into<String>) -> Self {
        self.output.app_folder = folder.into();
        self
    }

    /// Set the artifact file name.
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.output.file_name = name.into();
        self
    }

    /// Set the page size.
    pub fn with_page_size(mut self, size: PageSize) -> Self {
        self.page_size = size;
        self
    }

    /// Set the margins.
    pub fn with_margins(mut self, margins: PageMargins) -> Self {
        self.margins = margins;
        self
    }

    /// Set document metadata.
    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Enable or disable stream compression.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Fix the creation date for reproducible output.
    pub fn with_creation_date(mut self, date: DateTime<Utc>) -> Self {
        self.creation_date = Some(date);
        self
    }

    /// Set the currency marker.
    pub fn with_currency(mut self, currency: CurrencyFormat) -> Self {
        self.currency = currency;
        self
    }

    /// Set the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }
}
