use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::error::{ArchiveError, Result};

/// Read a whole file, mapping a missing path to `FileNotFound`
pub async fn read_all(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).await.map_err(|e| ArchiveError::io(path, e))
}

/// Create a directory and its parents if absent
pub async fn ensure_dir(dir: &Path) -> Result<()> {
    if fs::metadata(dir).await.is_err() {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| ArchiveError::io(dir, e))?;
        info!("Created directory: {:?}", dir);
    }
    Ok(())
}

/// Write bytes to `dir/name`, creating `dir` first
pub async fn write_into(dir: &Path, name: &str, data: &[u8]) -> Result<PathBuf> {
    ensure_dir(dir).await?;
    let path = dir.join(name);
    fs::write(&path, data)
        .await
        .map_err(|e| ArchiveError::io(&path, e))?;
    Ok(path)
}

/// Remove `dir/name`; an already-missing file is not an error
pub async fn remove_from(dir: &Path, name: &str) -> Result<()> {
    let path = dir.join(name);
    match fs::remove_file(&path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ArchiveError::Io { path, source: e }),
    }
}
