use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::engine::SourcedChunk;
use crate::error::{ArchiveError, Result};
use crate::optical::{OpticalError, Scanner};
use crate::progress::{NoProgress, ProgressObserver, Stage};
use crate::protocol::{ChunkFrame, HeaderFrame};
use crate::report::Warning;
use crate::storage::ArtifactLayout;
use crate::utils::pool::run_blocking;

type Scanned = std::result::Result<Option<String>, OpticalError>;

/// Frames recovered from an artifact directory.
#[derive(Debug, Clone)]
pub struct DecodedArchive {
    pub header: HeaderFrame,
    /// Successfully decoded chunks, in artifact-name order.
    pub chunks: Vec<SourcedChunk>,
    /// Chunk artifacts found on disk, decodable or not.
    pub chunk_artifacts: usize,
    pub warnings: Vec<Warning>,
}

pub struct Decoder<S: Scanner + 'static> {
    scanner: Arc<S>,
    layout: ArtifactLayout,
    workers: usize,
    progress: Arc<dyn ProgressObserver>,
}

impl<S: Scanner + 'static> Decoder<S> {
    pub fn new(scanner: S) -> Self {
        let layout = ArtifactLayout::new(scanner.extension(), crate::protocol::DEFAULT_INDEX_WIDTH);
        Self {
            scanner: Arc::new(scanner),
            layout,
            workers: 1,
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressObserver>) -> Self {
        self.progress = progress;
        self
    }

    /// Scan and decode the header artifact. Any failure here is fatal.
    pub async fn read_header(&self, dir: &Path) -> Result<HeaderFrame> {
        tokio::fs::metadata(dir).await.map_err(|e| ArchiveError::io(dir, e))?;

        let path = self.layout.header_path(dir);
        let scanner = Arc::clone(&self.scanner);
        let scan_path = path.clone();
        let scanned = tokio::task::spawn_blocking(move || scanner.scan(&scan_path)).await?;

        let text = match scanned {
            Ok(Some(text)) => text,
            Ok(None) => {
                return Err(ArchiveError::HeaderUnreadable {
                    path,
                    reason: "no QR code found".to_string(),
                })
            }
            Err(e) => {
                return Err(ArchiveError::HeaderUnreadable {
                    path,
                    reason: e.to_string(),
                })
            }
        };

        let header = HeaderFrame::decode(&text)?;
        info!("Header: {} ({} bytes)", header.file_name(), header.file_size());
        Ok(header)
    }

    /// Read the header, then every chunk artifact.
    ///
    /// Chunk artifacts that cannot be scanned or parsed are skipped with a
    /// warning; only header and directory failures abort.
    pub async fn read(&self, dir: &Path) -> Result<DecodedArchive> {
        let header = self.read_header(dir).await?;
        let names = self.layout.list_chunk_artifacts(dir).await?;
        debug!("Found {} chunk artifacts in {:?}", names.len(), dir);

        let jobs: Vec<_> = names
            .iter()
            .map(|name| {
                let name = name.clone();
                let path = dir.join(&name);
                let scanner = Arc::clone(&self.scanner);
                move || (name, scanner.scan(&path))
            })
            .collect();

        self.progress.started(Stage::Scan, jobs.len());
        let mut scanned = Vec::with_capacity(jobs.len());
        run_blocking(jobs, self.workers, |(name, result): (String, Scanned)| {
            self.progress.advanced(Stage::Scan, &name);
            scanned.push((name, result));
            Ok(())
        })
        .await?;
        self.progress.finished(Stage::Scan);

        scanned.sort_by(|a, b| a.0.cmp(&b.0));

        let mut chunks = Vec::with_capacity(scanned.len());
        let mut warnings = Vec::new();
        for (artifact, result) in scanned {
            match decode_artifact(&artifact, result) {
                Ok(frame) => {
                    debug!("{}: chunk {}/{}", artifact, frame.index(), frame.total_chunks());
                    chunks.push(SourcedChunk { artifact, frame });
                }
                Err(warning) => {
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(DecodedArchive {
            header,
            chunks,
            chunk_artifacts: names.len(),
            warnings,
        })
    }
}

fn decode_artifact(artifact: &str, scanned: Scanned) -> std::result::Result<ChunkFrame, Warning> {
    let text = match scanned {
        Ok(Some(text)) => text,
        Ok(None) => {
            return Err(Warning::UnreadableArtifact {
                artifact: artifact.to_string(),
                reason: "no QR code found".to_string(),
            })
        }
        Err(e) => {
            return Err(Warning::UnreadableArtifact {
                artifact: artifact.to_string(),
                reason: e.to_string(),
            })
        }
    };

    ChunkFrame::decode(&text).map_err(|e| Warning::MalformedChunk {
        artifact: artifact.to_string(),
        reason: e.to_string(),
    })
}
