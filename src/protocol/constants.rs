//! Wire and layout constants for qrarchive frames

/// Field delimiter inside header frames and between position and payload in chunk frames
pub const FIELD_DELIMITER: char = ':';

/// Separator between index and total in a chunk position field ("3/7")
pub const POSITION_SEPARATOR: char = '/';

/// Number of fields a header frame splits into (name, size, trailing)
pub const HEADER_FIELDS: usize = 3;

/// Artifact naming
pub const HEADER_ARTIFACT_STEM: &str = "header";
pub const CHUNK_ARTIFACT_PREFIX: &str = "chunk_";
pub const DEFAULT_ARTIFACT_EXTENSION: &str = "png";

/// Minimum zero-padded digits in chunk artifact names
pub const DEFAULT_INDEX_WIDTH: usize = 4;

/// Default payload bytes per chunk frame
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
