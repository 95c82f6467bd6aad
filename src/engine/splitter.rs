use std::path::Path;
use tracing::{debug, info};

use crate::error::{ArchiveError, Result};
use crate::protocol::{ChunkFrame, FrameError, HeaderFrame};
use crate::utils::digest::sha256_hex_parts;
use crate::utils::io::read_all;

/// A header plus its ordered chunk frames, held only between split and render.
#[derive(Debug, Clone)]
pub struct Archive {
    pub header: HeaderFrame,
    pub chunks: Vec<ChunkFrame>,
}

impl Archive {
    pub fn total_chunks(&self) -> u32 {
        self.chunks.len() as u32
    }

    /// SHA-256 of the payload the chunks carry, in index order.
    pub fn sha256(&self) -> String {
        sha256_hex_parts(self.chunks.iter().map(|c| c.payload()))
    }
}

/// Split an in-memory payload into `chunk_size` slices.
///
/// An empty payload yields a header-only archive.
pub fn split_bytes(file_name: &str, data: &[u8], chunk_size: usize) -> Result<Archive> {
    if chunk_size == 0 {
        return Err(ArchiveError::InvalidChunkSize);
    }

    let header = HeaderFrame::new(file_name, data.len() as u64)?;
    let total = u32::try_from(data.len().div_ceil(chunk_size)).map_err(|_| ArchiveError::TooManyChunks {
        file_size: data.len() as u64,
        chunk_size,
    })?;

    let chunks = data
        .chunks(chunk_size)
        .zip(1..=total)
        .map(|(slice, index)| ChunkFrame::new(index, total, slice.to_vec()))
        .collect::<std::result::Result<Vec<_>, FrameError>>()?;

    debug!("Split {} bytes of {} into {} chunks", data.len(), file_name, total);
    Ok(Archive { header, chunks })
}

/// Read `path` and split it. The header carries the path's base name.
pub async fn split_file(path: &Path, chunk_size: usize) -> Result<Archive> {
    if chunk_size == 0 {
        return Err(ArchiveError::InvalidChunkSize);
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| FrameError::InvalidFileName {
            name: path.to_string_lossy().into_owned(),
            reason: "path has no UTF-8 base name",
        })?;

    let data = read_all(path).await?;
    info!("Read {} ({} bytes)", path.display(), data.len());
    split_bytes(file_name, &data, chunk_size)
}
