use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Recoverable conditions met while decoding or assembling an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// The scanner found no payload in a chunk artifact.
    UnreadableArtifact { artifact: String, reason: String },
    /// A payload was found but is not a valid chunk frame.
    MalformedChunk { artifact: String, reason: String },
    /// Another artifact already supplied this index.
    DuplicateChunk { index: u32, artifact: String },
    /// The frame's chunk total disagrees with the rest of the archive.
    InconsistentTotal { artifact: String, expected: u32, found: u32 },
    /// Indices absent under the selected chunk total, as inclusive ranges.
    MissingChunks { ranges: Vec<IndexRange> },
    SizeMismatch { expected: u64, actual: u64 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnreadableArtifact { artifact, reason } =>
                write!(f, "could not read QR code {}: {}", artifact, reason),
            Warning::MalformedChunk { artifact, reason } =>
                write!(f, "invalid chunk format in {}: {}", artifact, reason),
            Warning::DuplicateChunk { index, artifact } =>
                write!(f, "chunk {} repeated in {}, keeping the first copy", index, artifact),
            Warning::InconsistentTotal { artifact, expected, found } =>
                write!(f, "{} declares {} chunks, archive has {}", artifact, found, expected),
            Warning::MissingChunks { ranges } => {
                let parts: Vec<String> = ranges.iter().map(IndexRange::to_string).collect();
                write!(f, "missing chunks: {}", parts.join(", "))
            }
            Warning::SizeMismatch { expected, actual } =>
                write!(f, "restored size does not match (expected: {}, actual: {})", expected, actual),
        }
    }
}

/// Inclusive run of chunk indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexRange {
    pub first: u32,
    pub last: u32,
}

impl IndexRange {
    pub fn single(index: u32) -> Self {
        Self { first: index, last: index }
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}-{}", self.first, self.last)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EncodeReport {
    pub file_name: String,
    pub file_size: u64,
    pub chunk_size: usize,
    pub total_chunks: u32,
    /// Header plus chunk artifacts.
    pub artifacts: usize,
    pub output_dir: PathBuf,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestoreReport {
    pub file_name: String,
    pub expected_size: u64,
    pub restored_size: u64,
    pub chunks_used: usize,
    pub output_path: PathBuf,
    pub sha256: String,
    pub warnings: Vec<Warning>,
}

impl RestoreReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub file_name: String,
    pub file_size: u64,
    pub total_chunks: Option<u32>,
    pub chunk_artifacts: usize,
    pub present: Vec<u32>,
    pub warnings: Vec<Warning>,
}
