//! Error types for document composition.
//!
//! Sink failures are fatal to an assembly and carry the path that failed.
//! Content problems (unparsable amounts, unreadable images) never reach this
//! type; they are logged and degraded where they happen.

use std::path::PathBuf;

use crate::pipeline::PipelineState;

/// Result type alias for composition operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while composing or storing a document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The output sink could not be allocated, written, or committed
    #[error("Sink error at {}: {source}", path.display())]
    Sink {
        /// File or directory the sink was operating on
        path: PathBuf,
        /// Underlying IO failure
        #[source]
        source: std::io::Error,
    },

    /// Image error
    #[error("Image error: {0}")]
    Image(String),

    /// A table row does not have one cell per header
    #[error("Ragged table row {row}: expected {expected} cells, found {found}")]
    RaggedRow {
        /// Zero-based data row index
        row: usize,
        /// Number of headers
        expected: usize,
        /// Number of cells in the row
        found: usize,
    },

    /// Column weights do not match the column count
    #[error("Column spec mismatch: expected {expected} weights, found {found}")]
    ColumnSpec {
        /// Number of columns
        expected: usize,
        /// Number of weights supplied
        found: usize,
    },

    /// Operation called in a pipeline state that does not allow it
    #[error("Cannot {operation} while pipeline is {state}")]
    InvalidState {
        /// Operation that was attempted
        operation: &'static str,
        /// State the pipeline was in
        state: PipelineState,
    },

    /// A second decorator swap was attempted after population started
    #[error("Decorator already swapped after population started")]
    DecoratorSwapLimit,

    /// Assembly was cancelled between actions
    #[error("Assembly cancelled")]
    Cancelled,

    /// The assembly pool no longer accepts jobs
    #[error("Assembly pool is closed")]
    PoolClosed,

    /// The assembly queue is at capacity
    #[error("Assembly queue is full")]
    QueueFull,

    /// The worker running a job exited without reporting a result
    #[error("Assembly worker exited without a result")]
    WorkerLost,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Wrap an IO failure on `path` as a sink error.
    pub fn sink(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Sink {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_error_names_path() {
        let err = Error::sink(
            "/tmp/OCEAN/Receipt.pdf",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = format!("{}", err);
        assert!(msg.contains("Sink error"));
        assert!(msg.contains("Receipt.pdf"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_ragged_row_error() {
        let err = Error::RaggedRow {
            row: 2,
            expected: 5,
            found: 4,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("row 2"));
        assert!(msg.contains("expected 5"));
        assert!(msg.contains("found 4"));
    }

    #[test]
    fn test_invalid_state_error() {
        let err = Error::InvalidState {
            operation: "populate",
            state: PipelineState::Closed,
        };
        assert_eq!(format!("{}", err), "Cannot populate while pipeline is closed");
    }

    #[test]
    fn test_json_error_becomes_config_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(Error::from(json_err), Error::Config(_)));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
