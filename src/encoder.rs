use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::engine::Archive;
use crate::error::{ArchiveError, Result};
use crate::optical::{OpticalError, Renderer};
use crate::progress::{NoProgress, ProgressObserver, Stage};
use crate::storage::ArtifactLayout;
use crate::utils::io::{ensure_dir, remove_from};
use crate::utils::pool::run_blocking;

/// Writes one artifact per frame: the header first, then every chunk.
pub struct Encoder<R: Renderer + 'static> {
    renderer: Arc<R>,
    layout: ArtifactLayout,
    workers: usize,
    progress: Arc<dyn ProgressObserver>,
}

impl<R: Renderer + 'static> Encoder<R> {
    pub fn new(renderer: R, index_width: usize) -> Self {
        let layout = ArtifactLayout::new(renderer.extension(), index_width);
        Self {
            renderer: Arc::new(renderer),
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

    /// Render `archive` into `output_dir`, creating it if absent.
    ///
    /// Chunk artifacts left in `output_dir` by an earlier archive are removed
    /// first so they cannot be mixed into this one on restore.
    ///
    /// Returns the number of artifacts written. The first render failure
    /// aborts; artifacts already written stay on disk.
    pub async fn write(&self, archive: &Archive, output_dir: &Path) -> Result<usize> {
        ensure_dir(output_dir).await?;

        let total = archive.total_chunks();
        let names: Vec<String> = archive
            .chunks
            .iter()
            .map(|chunk| self.layout.chunk_name(chunk.index(), total))
            .collect();
        self.remove_stale(output_dir, &names).await?;

        let header_name = self.layout.header_name();
        self.render_one(archive.header.encode(), &header_name, output_dir).await?;
        debug!("Wrote header artifact {}", header_name);

        let jobs: Vec<_> = archive
            .chunks
            .iter()
            .zip(names)
            .map(|(chunk, name)| {
                let payload = chunk.encode();
                let dest = output_dir.join(&name);
                let renderer = Arc::clone(&self.renderer);
                move || (name, renderer.render(&payload, &dest))
            })
            .collect();

        self.progress.started(Stage::Render, jobs.len());
        let mut written = 1;
        run_blocking(jobs, self.workers, |(name, result): (String, std::result::Result<(), OpticalError>)| {
            result.map_err(|source| ArchiveError::Render {
                artifact: name.clone(),
                source,
            })?;
            self.progress.advanced(Stage::Render, &name);
            written += 1;
            Ok(())
        })
        .await?;
        self.progress.finished(Stage::Render);

        info!("Created QR codes: {} (including header)", written);
        Ok(written)
    }

    async fn remove_stale(&self, output_dir: &Path, names: &[String]) -> Result<()> {
        let keep: HashSet<&str> = names.iter().map(String::as_str).collect();
        let mut removed = 0;
        for name in self.layout.list_chunk_artifacts(output_dir).await? {
            if !keep.contains(name.as_str()) {
                remove_from(output_dir, &name).await?;
                removed += 1;
            }
        }
        if removed > 0 {
            info!("Removed {} stale chunk artifacts from {:?}", removed, output_dir);
        }
        Ok(())
    }

    async fn render_one(&self, payload: String, name: &str, output_dir: &Path) -> Result<()> {
        let renderer = Arc::clone(&self.renderer);
        let dest = output_dir.join(name);
        tokio::task::spawn_blocking(move || renderer.render(&payload, &dest))
            .await?
            .map_err(|source| ArchiveError::Render {
                artifact: name.to_string(),
                source,
            })
    }
}
