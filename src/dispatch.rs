//! Handing finished artifacts to a viewer or a share target.
//!
//! Dispatch happens after the artifact is committed, so a dispatch failure
//! never invalidates it: the caller gets the artifact together with a
//! user-facing [`Notice`]. Dispatch is attempted once and never retried.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::actions::ContentProvider;
use crate::config::AssemblyConfig;
use crate::error::Result;
use crate::pipeline::Artifact;
use crate::worker::AssemblyPool;

/// Media type of every artifact this crate produces.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// What to do with a finished artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Open it in a viewer
    Present,
    /// Hand it to an outbound share mechanism
    Share,
}

/// Location and description of an artifact handed to a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    /// Committed file
    pub path: PathBuf,
    /// Media type
    pub media_type: String,
    /// Short description used when sharing
    pub description: String,
}

impl ArtifactRef {
    /// PDF reference for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            media_type: PDF_MEDIA_TYPE.to_string(),
            description: "Sharing PDF file".to_string(),
        }
    }

    /// Replace the share description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl From<&Artifact> for ArtifactRef {
    fn from(artifact: &Artifact) -> Self {
        ArtifactRef::new(&artifact.path)
    }
}

/// Dispatch failures. None of them affect the artifact on disk.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No viewer is configured for the media type
    #[error("No viewer available")]
    NoViewer,

    /// No share target is configured
    #[error("No share target available")]
    NoShareTarget,

    /// The viewer or share command could not be started
    #[error("Failed to launch {command}: {source}")]
    Launch {
        /// Program that failed to start
        command: String,
        /// Underlying IO failure
        #[source]
        source: std::io::Error,
    },

    /// The artifact is not on disk
    #[error("Artifact not found: {}", .0.display())]
    MissingArtifact(PathBuf),
}

impl DispatchError {
    /// Message to show the end user.
    pub fn notice(&self, mode: DispatchMode) -> Notice {
        let message = match (self, mode) {
            (DispatchError::MissingArtifact(_), _) => "The PDF file could not be found.",
            (DispatchError::Launch { .. }, DispatchMode::Share) => "Error sharing PDF file",
            (DispatchError::NoViewer, _) | (_, DispatchMode::Present) => {
                "No application has been found to open PDF files."
            },
            (DispatchError::NoShareTarget, _) | (_, DispatchMode::Share) => {
                "No application has been found to share PDF files."
            },
        };
        Notice {
            message: message.to_string(),
        }
    }
}

/// Non-fatal message for the end user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Text to display
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Receives finished artifacts.
pub trait ArtifactDispatcher: Send + Sync {
    /// Present or share `artifact`.
    fn dispatch(&self, artifact: &ArtifactRef, mode: DispatchMode) -> std::result::Result<(), DispatchError>;
}

#[derive(Debug, Clone)]
struct LaunchCommand {
    program: String,
    args: Vec<String>,
}

impl LaunchCommand {
    fn spawn(&self, path: &Path) -> std::result::Result<(), DispatchError> {
        log::debug!("Launching {} {:?} {}", self.program, self.args, path.display());
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .spawn()
            .map_err(|source| DispatchError::Launch {
                command: self.program.clone(),
                source,
            })?;
        reap(child, &self.program);
        Ok(())
    }
}

/// Wait for `child` on a detached thread so it does not linger as a zombie.
/// Dispatch does not wait for the program to exit.
fn reap(mut child: Child, program: &str) -> Option<JoinHandle<Option<ExitStatus>>> {
    let program = program.to_string();
    let spawned = thread::Builder::new()
        .name("dispatch-reaper".to_string())
        .spawn(move || match child.wait() {
            Ok(status) => {
                if !status.success() {
                    log::warn!("{} exited with {}", program, status);
                }
                Some(status)
            },
            Err(e) => {
                log::warn!("Could not wait for {}: {}", program, e);
                None
            },
        });
    match spawned {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::warn!("Could not start reaper thread: {}", e);
            None
        },
    }
}

/// Dispatcher that runs an external program with the artifact path as its
/// last argument.
#[derive(Debug, Clone, Default)]
pub struct CommandDispatcher {
    viewer: Option<LaunchCommand>,
    share: Option<LaunchCommand>,
}

impl CommandDispatcher {
    /// Dispatcher with no viewer and no share target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform opener (`xdg-open`, `open`, or `cmd /C start`) as the viewer.
    pub fn system_default() -> Self {
        if cfg!(target_os = "windows") {
            Self::new().with_viewer("cmd", ["/C", "start", ""])
        } else if cfg!(target_os = "macos") {
            Self::new().with_viewer("open", [] as [&str; 0])
        } else {
            Self::new().with_viewer("xdg-open", [] as [&str; 0])
        }
    }

    /// Set the viewer program.
    pub fn with_viewer<I, S>(mut self, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.viewer = Some(LaunchCommand {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Set the share program.
    pub fn with_share_target<I, S>(mut self, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.share = Some(LaunchCommand {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        });
        self
    }
}

impl ArtifactDispatcher for CommandDispatcher {
    fn dispatch(&self, artifact: &ArtifactRef, mode: DispatchMode) -> std::result::Result<(), DispatchError> {
        if !artifact.path.is_file() {
            return Err(DispatchError::MissingArtifact(artifact.path.clone()));
        }
        let command = match mode {
            DispatchMode::Present => self.viewer.as_ref().ok_or(DispatchError::NoViewer)?,
            DispatchMode::Share => self.share.as_ref().ok_or(DispatchError::NoShareTarget)?,
        };
        command.spawn(&artifact.path)
    }
}

/// Result of [`create_and_dispatch`].
#[derive(Debug)]
pub struct DispatchOutcome {
    /// The committed artifact
    pub artifact: Artifact,
    /// Set when dispatch failed
    pub notice: Option<Notice>,
}

/// Assemble on `pool`, wait for the artifact, then present or share it.
///
/// Assembly failures are returned as errors. Dispatch failures are logged
/// and reported as a notice next to the still valid artifact.
pub fn create_and_dispatch(
    pool: &AssemblyPool,
    config: AssemblyConfig,
    provider: Arc<dyn ContentProvider>,
    dispatcher: &dyn ArtifactDispatcher,
    mode: DispatchMode,
) -> Result<DispatchOutcome> {
    let artifact = pool.submit(config, provider)?.wait()?;

    let notice = match dispatcher.dispatch(&ArtifactRef::from(&artifact), mode) {
        Ok(()) => None,
        Err(e) => {
            log::warn!("Dispatch of {} failed: {}", artifact.path.display(), e);
            Some(e.notice(mode))
        },
    };
    Ok(DispatchOutcome { artifact, notice })
}
