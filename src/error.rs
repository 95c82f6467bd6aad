//! Fatal errors. Anything recoverable is a [`crate::report::Warning`] instead.

use std::path::PathBuf;
use thiserror::Error;

use crate::optical::OpticalError;
use crate::protocol::FrameError;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The header artifact is missing, unscannable, or not a valid header frame.
    #[error("header artifact {} unreadable: {reason}", .path.display())]
    HeaderUnreadable { path: PathBuf, reason: String },

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("chunk size must be at least 1 byte")]
    InvalidChunkSize,

    #[error("{file_size} bytes at {chunk_size} bytes per chunk exceeds the maximum chunk count")]
    TooManyChunks { file_size: u64, chunk_size: usize },

    #[error("failed to render {artifact}: {source}")]
    Render {
        artifact: String,
        #[source]
        source: OpticalError,
    },

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ArchiveError {
    /// Maps a `NotFound` I/O error to [`ArchiveError::FileNotFound`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            ArchiveError::FileNotFound(path)
        } else {
            ArchiveError::Io { path, source }
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
