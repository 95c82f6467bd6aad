//! End-to-end flows: file -> artifacts, artifacts -> file.

use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config::ArchiveConfig;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::engine::assembler::select_total;
use crate::engine::{assemble, split_file, write_output};
use crate::error::Result;
use crate::optical::{Renderer, Scanner};
use crate::progress::ProgressObserver;
use crate::report::{EncodeReport, InspectReport, RestoreReport};
use crate::utils::digest::sha256_hex;

/// Split `source` and render every frame into `output_dir`.
pub async fn encode_file<R: Renderer + 'static>(
    source: &Path,
    output_dir: &Path,
    config: &ArchiveConfig,
    renderer: R,
    progress: Arc<dyn ProgressObserver>,
) -> Result<EncodeReport> {
    let archive = split_file(source, config.chunk_size).await?;
    info!(
        "Encoding {} into {} chunks of up to {} bytes",
        archive.header.file_name(),
        archive.total_chunks(),
        config.chunk_size
    );

    let encoder = Encoder::new(renderer, config.index_width)
        .with_workers(config.effective_workers())
        .with_progress(progress);
    let artifacts = encoder.write(&archive, output_dir).await?;

    Ok(EncodeReport {
        file_name: archive.header.file_name().to_string(),
        file_size: archive.header.file_size(),
        chunk_size: config.chunk_size,
        total_chunks: archive.total_chunks(),
        artifacts,
        output_dir: output_dir.to_path_buf(),
        sha256: archive.sha256(),
    })
}

/// Decode the artifacts in `qr_dir` and write the restored file into `output_dir`.
///
/// Nothing is written unless the header decodes. Chunk-level problems and
/// size mismatches come back as warnings in the report.
pub async fn restore_dir<S: Scanner + 'static>(
    qr_dir: &Path,
    output_dir: &Path,
    config: &ArchiveConfig,
    scanner: S,
    progress: Arc<dyn ProgressObserver>,
) -> Result<RestoreReport> {
    let decoded = Decoder::new(scanner)
        .with_workers(config.effective_workers())
        .with_progress(progress)
        .read(qr_dir)
        .await?;

    let assembly = assemble(&decoded.header, decoded.chunks, config.ordering);
    let output_path = write_output(&decoded.header, &assembly, output_dir).await?;

    let mut warnings = decoded.warnings;
    warnings.extend(assembly.warnings.iter().cloned());

    Ok(RestoreReport {
        file_name: decoded.header.file_name().to_string(),
        expected_size: decoded.header.file_size(),
        restored_size: assembly.data.len() as u64,
        chunks_used: assembly.chunks_used,
        output_path,
        sha256: sha256_hex(&assembly.data),
        warnings,
    })
}

/// Decode and check an artifact directory without writing anything.
pub async fn inspect_dir<S: Scanner + 'static>(
    qr_dir: &Path,
    config: &ArchiveConfig,
    scanner: S,
    progress: Arc<dyn ProgressObserver>,
) -> Result<InspectReport> {
    let decoded = Decoder::new(scanner)
        .with_workers(config.effective_workers())
        .with_progress(progress)
        .read(qr_dir)
        .await?;

    let total_chunks = select_total(&decoded.header, &decoded.chunks);
    let mut present: Vec<u32> = decoded.chunks.iter().map(|c| c.frame.index()).collect();
    present.sort_unstable();
    present.dedup();

    let assembly = assemble(&decoded.header, decoded.chunks, config.ordering);
    let mut warnings = decoded.warnings;
    warnings.extend(assembly.warnings);

    Ok(InspectReport {
        file_name: decoded.header.file_name().to_string(),
        file_size: decoded.header.file_size(),
        total_chunks,
        chunk_artifacts: decoded.chunk_artifacts,
        present,
        warnings,
    })
}
