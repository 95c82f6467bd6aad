use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{ArchiveError, Result};
use crate::protocol::{CHUNK_ARTIFACT_PREFIX, DEFAULT_INDEX_WIDTH, HEADER_ARTIFACT_STEM};

/// File naming for one archive directory:
///
/// ```text
/// <dir>/header.png
/// <dir>/chunk_0001.png
/// <dir>/chunk_0002.png
/// ```
///
/// Chunk numbers are zero-padded so lexicographic order equals numeric order.
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    extension: String,
    index_width: usize,
}

impl ArtifactLayout {
    pub fn new(extension: impl Into<String>, index_width: usize) -> Self {
        Self {
            extension: extension.into(),
            index_width,
        }
    }

    pub fn header_name(&self) -> String {
        format!("{}.{}", HEADER_ARTIFACT_STEM, self.extension)
    }

    pub fn header_path(&self, dir: &Path) -> PathBuf {
        dir.join(self.header_name())
    }

    /// Padding widens past `index_width` when `total` needs more digits.
    pub fn chunk_name(&self, index: u32, total: u32) -> String {
        let width = self.index_width.max(total.to_string().len());
        format!("{}{:0width$}.{}", CHUNK_ARTIFACT_PREFIX, index, self.extension, width = width)
    }

    pub fn is_chunk_artifact(&self, name: &str) -> bool {
        let Some(rest) = name.strip_prefix(CHUNK_ARTIFACT_PREFIX) else {
            return false;
        };
        match rest.rsplit_once('.') {
            Some((number, ext)) => {
                !number.is_empty()
                    && number.bytes().all(|b| b.is_ascii_digit())
                    && ext.eq_ignore_ascii_case(&self.extension)
            }
            None => false,
        }
    }

    /// Chunk artifact names in `dir`, sorted.
    pub async fn list_chunk_artifacts(&self, dir: &Path) -> Result<Vec<String>> {
        let mut entries = fs::read_dir(dir).await.map_err(|e| ArchiveError::io(dir, e))?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(|e| ArchiveError::io(dir, e))? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if self.is_chunk_artifact(&name) {
                names.push(name.into_owned());
            }
        }

        names.sort();
        Ok(names)
    }
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self::new(crate::protocol::DEFAULT_ARTIFACT_EXTENSION, DEFAULT_INDEX_WIDTH)
    }
}
