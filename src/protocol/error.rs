use thiserror::Error;

/// Frame codec failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Header text could not be decoded into name and size.
    #[error("malformed header frame: {0}")]
    MalformedHeader(String),

    /// Chunk text could not be decoded into position and payload.
    #[error("malformed chunk frame: {0}")]
    MalformedChunk(String),

    /// File name cannot be carried in a header frame.
    #[error("invalid file name {name:?}: {reason}")]
    InvalidFileName {
        name: String,
        reason: &'static str,
    },
}
