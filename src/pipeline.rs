//! Document assembly pipeline.
//!
//! One pipeline produces one artifact and walks through
//! `Created -> Opened -> Populating -> Closed` exactly once:
//!
//! - `open` allocates a temporary file next to the output path, fixes page
//!   geometry and metadata, and installs the first decorator.
//! - `populate` replays content actions in order, checking the cancellation
//!   token before each one.
//! - `close` renders the document, writes it to the temporary file and
//!   atomically renames it over the output path.
//!
//! Sink failures are fatal and reported; the only retry is a single rewrite
//! of the temporary file.

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use chrono::Utc;
use lazy_static::lazy_static;
use uuid::Uuid;

use crate::actions::{ContentAction, ContentProvider};
use crate::config::AssemblyConfig;
use crate::decorator::PageDecorator;
use crate::error::{Error, Result};
use crate::worker::CancellationToken;
use crate::writer::DocumentBuilder;

lazy_static! {
    /// One commit lock per output path, so concurrent assemblies targeting the
    /// same file replace it one at a time.
    static ref COMMIT_LOCKS: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>> = Mutex::new(HashMap::new());
}

fn commit_lock(path: &Path) -> Arc<Mutex<()>> {
    let mut locks = COMMIT_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(locks.entry(path.to_path_buf()).or_default())
}

/// Lifecycle state of an [`AssemblyPipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing allocated yet
    Created,
    /// Sink allocated, no content yet
    Opened,
    /// Content is being added
    Populating,
    /// Finished, successfully or not
    Closed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Created => "created",
            PipelineState::Opened => "opened",
            PipelineState::Populating => "populating",
            PipelineState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// A finished document on disk.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Final location
    pub path: PathBuf,
    /// Exact bytes written
    pub bytes: Bytes,
    /// Physical pages
    pub page_count: usize,
    /// Layout blocks placed
    pub block_count: usize,
    /// Decorator invocations
    pub decorations: usize,
}

impl Artifact {
    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the artifact has no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Temporary output file that becomes the final file on commit.
///
/// Dropping an uncommitted sink removes the temporary file.
#[derive(Debug)]
pub struct FileSink {
    final_path: PathBuf,
    temp_path: PathBuf,
    file: Option<File>,
    committed: bool,
}

impl FileSink {
    /// Create the output directory and a uniquely named temporary file in it.
    pub fn create(final_path: &Path) -> Result<Self> {
        let dir = final_path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| Error::sink(dir, e))?;

        let file_name = final_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact".to_string());
        let temp_path = dir.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));
        let file = File::create(&temp_path).map_err(|e| Error::sink(&temp_path, e))?;

        log::debug!("Allocated sink {}", temp_path.display());
        Ok(Self {
            final_path: final_path.to_path_buf(),
            temp_path,
            file: Some(file),
            committed: false,
        })
    }

    /// Where the artifact will end up.
    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// Temporary file currently being written.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Write `bytes`, sync, and rename onto the final path.
    pub fn commit(mut self, bytes: &[u8]) -> Result<PathBuf> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| Error::sink(&self.temp_path, std::io::ErrorKind::NotFound.into()))?;

        if let Err(first) = write_all_from_start(&mut file, bytes) {
            log::warn!(
                "Write to {} failed ({}), retrying once",
                self.temp_path.display(),
                first
            );
            write_all_from_start(&mut file, bytes).map_err(|e| Error::sink(&self.temp_path, e))?;
        }
        file.sync_all().map_err(|e| Error::sink(&self.temp_path, e))?;
        drop(file);

        let lock = commit_lock(&self.final_path);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        fs::rename(&self.temp_path, &self.final_path).map_err(|e| Error::sink(&self.final_path, e))?;
        self.committed = true;

        Ok(self.final_path.clone())
    }
}

fn write_all_from_start(file: &mut File, bytes: &[u8]) -> std::io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(bytes)?;
    file.flush()
}

impl Drop for FileSink {
    fn drop(&mut self) {
        if !self.committed {
            self.file.take();
            if let Err(e) = fs::remove_file(&self.temp_path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Could not remove {}: {}", self.temp_path.display(), e);
                }
            }
        }
    }
}

/// Drives one document from an empty sink to a committed artifact.
pub struct AssemblyPipeline {
    config: AssemblyConfig,
    state: PipelineState,
    builder: Option<DocumentBuilder>,
    sink: Option<FileSink>,
    populating_swaps: usize,
}

impl AssemblyPipeline {
    /// New pipeline in the `Created` state.
    pub fn new(config: AssemblyConfig) -> Self {
        Self {
            config,
            state: PipelineState::Created,
            builder: None,
            sink: None,
            populating_swaps: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Configuration in use.
    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Temporary file path while the sink is open.
    pub fn temp_path(&self) -> Option<&Path> {
        self.sink.as_ref().map(FileSink::temp_path)
    }

    fn expect_state(&self, operation: &'static str, allowed: &[PipelineState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    /// Allocate the sink and start the document.
    pub fn open(&mut self, decorator: Option<Box<dyn PageDecorator>>) -> Result<()> {
        self.expect_state("open", &[PipelineState::Created])?;
        if let Err(e) = self.config.validate() {
            log::error!("Refusing to open assembly: {}", e);
            self.state = PipelineState::Closed;
            return Err(e);
        }

        let path = self.config.output_path();
        let sink = match FileSink::create(&path) {
            Ok(sink) => sink,
            Err(e) => {
                log::error!("Cannot open output for {}: {}", path.display(), e);
                self.state = PipelineState::Closed;
                return Err(e);
            },
        };

        let created = self.config.creation_date.unwrap_or_else(Utc::now);
        let mut builder = DocumentBuilder::new(self.config.page_size, self.config.margins)
            .with_metadata(self.config.metadata.clone())
            .with_compression(self.config.compress)
            .with_creation_date(created)
            .with_currency(self.config.currency.clone());
        builder.set_decorator(decorator);

        self.builder = Some(builder);
        self.sink = Some(sink);
        self.state = PipelineState::Opened;
        log::info!("Opened assembly for {}", path.display());
        Ok(())
    }

    /// Apply `actions` in order. `None` entries are skipped.
    ///
    /// Cancellation is checked before every action; a cancelled pipeline is
    /// closed and its temporary file removed.
    pub fn populate<I>(&mut self, actions: I, cancel: &CancellationToken) -> Result<()>
    where
        I: IntoIterator<Item = Option<ContentAction>>,
    {
        self.expect_state("populate", &[PipelineState::Opened])?;
        self.state = PipelineState::Populating;

        let mut applied = 0usize;
        for action in actions {
            if cancel.is_cancelled() {
                log::info!("Assembly cancelled after {} actions", applied);
                self.abort();
                return Err(Error::Cancelled);
            }
            let (Some(action), Some(builder)) = (action, self.builder.as_mut()) else {
                continue;
            };
            action.apply(builder);
            applied += 1;
        }

        log::debug!("Applied {} actions", applied);
        Ok(())
    }

    /// Replace the active decorator.
    ///
    /// Any number of swaps are allowed before population starts; once it has
    /// started, one more swap is allowed before close.
    pub fn swap_decorator(&mut self, decorator: Box<dyn PageDecorator>) -> Result<()> {
        self.expect_state(
            "swap decorator",
            &[PipelineState::Opened, PipelineState::Populating],
        )?;
        if self.state == PipelineState::Populating {
            if self.populating_swaps >= 1 {
                return Err(Error::DecoratorSwapLimit);
            }
            self.populating_swaps += 1;
        }
        if let Some(builder) = self.builder.as_mut() {
            builder.set_decorator(Some(decorator));
        }
        Ok(())
    }

    /// Finish the document and commit it to the output path.
    pub fn close(&mut self) -> Result<Artifact> {
        self.expect_state("close", &[PipelineState::Opened, PipelineState::Populating])?;
        self.state = PipelineState::Closed;

        let (Some(builder), Some(sink)) = (self.builder.take(), self.sink.take()) else {
            return Err(Error::InvalidState {
                operation: "close",
                state: self.state,
            });
        };

        let document = builder.finish()?;
        let bytes = Bytes::from(document.bytes);
        let path = sink.commit(&bytes).map_err(|e| {
            log::error!("Failed to commit artifact: {}", e);
            e
        })?;

        log::info!(
            "Wrote {} ({} pages, {} bytes)",
            path.display(),
            document.page_count,
            bytes.len()
        );
        Ok(Artifact {
            path,
            bytes,
            page_count: document.page_count,
            block_count: document.block_count,
            decorations: document.decorations,
        })
    }

    /// Drop all in-progress output; the pipeline ends `Closed`.
    pub fn abort(&mut self) {
        self.builder = None;
        self.sink = None;
        self.state = PipelineState::Closed;
    }
}

/// Run a whole assembly for `provider`: open with its opening decorator,
/// replay its actions, swap in its closing decorator, close.
pub fn assemble(
    config: &AssemblyConfig,
    provider: &dyn ContentProvider,
    cancel: &CancellationToken,
) -> Result<Artifact> {
    let mut pipeline = AssemblyPipeline::new(config.clone());
    pipeline.open(provider.opening_decorator())?;
    pipeline.populate(provider.actions(), cancel)?;
    if let Some(closing) = provider.closing_decorator() {
        pipeline.swap_decorator(closing)?;
    }
    if cancel.is_cancelled() {
        pipeline.abort();
        return Err(Error::Cancelled);
    }
    pipeline.close()
}
