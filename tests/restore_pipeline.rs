mod common;

use std::path::Path;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use qrarchive::pipeline::{encode_file, inspect_dir, restore_dir};
use qrarchive::progress::NoProgress;
use qrarchive::protocol::{decode_header, FrameError};
use qrarchive::utils::digest::sha256_hex;
use qrarchive::{ArchiveConfig, ArchiveError, ChunkOrdering, IndexRange, Warning};
use tempfile::TempDir;

use common::{sample_bytes, RecordingProgress, TextRenderer, TextScanner};

fn config(chunk_size: usize) -> ArchiveConfig {
    ArchiveConfig {
        chunk_size,
        workers: 2,
        ..ArchiveConfig::default()
    }
}

async fn encode_sample(dir: &TempDir, name: &str, data: &[u8], chunk_size: usize) -> std::path::PathBuf {
    let source = dir.path().join(name);
    std::fs::write(&source, data).unwrap();
    let qr_dir = dir.path().join("qr");
    encode_file(&source, &qr_dir, &config(chunk_size), TextRenderer, Arc::new(NoProgress))
        .await
        .unwrap();
    qr_dir
}

fn artifact_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn file_of_2050_bytes_round_trips_through_three_chunks() {
    let dir = TempDir::new().unwrap();
    let data = sample_bytes(2050);
    let source = dir.path().join("photo.jpg");
    std::fs::write(&source, &data).unwrap();
    let qr_dir = dir.path().join("qr");

    let encoded = encode_file(&source, &qr_dir, &config(800), TextRenderer, Arc::new(NoProgress))
        .await
        .unwrap();
    assert_eq!(encoded.total_chunks, 3);
    assert_eq!(encoded.artifacts, 4);
    assert_eq!(encoded.sha256, sha256_hex(&data));
    assert_eq!(
        artifact_names(&qr_dir),
        vec!["chunk_0001.txt", "chunk_0002.txt", "chunk_0003.txt", "header.txt"]
    );

    let header_text = std::fs::read_to_string(qr_dir.join("header.txt")).unwrap();
    assert_eq!(decode_header(&header_text).unwrap(), ("photo.jpg".to_string(), 2050));

    let last = std::fs::read_to_string(qr_dir.join("chunk_0003.txt")).unwrap();
    let (position, payload) = last.split_once(':').unwrap();
    assert_eq!(position, "3/3");
    assert_eq!(STANDARD.decode(payload).unwrap().len(), 450);

    let out_dir = dir.path().join("restored");
    let report = restore_dir(&qr_dir, &out_dir, &config(800), TextScanner, Arc::new(NoProgress))
        .await
        .unwrap();

    assert!(report.is_clean(), "{:?}", report.warnings);
    assert_eq!(report.output_path, out_dir.join("photo.jpg"));
    assert_eq!(report.restored_size, 2050);
    assert_eq!(report.chunks_used, 3);
    assert_eq!(report.sha256, encoded.sha256);
    assert_eq!(std::fs::read(out_dir.join("photo.jpg")).unwrap(), data);
}

#[tokio::test]
async fn unreadable_chunk_is_skipped_with_size_warning() {
    let dir = TempDir::new().unwrap();
    let data = sample_bytes(2050);
    let qr_dir = encode_sample(&dir, "photo.jpg", &data, 800).await;
    std::fs::write(qr_dir.join("chunk_0002.txt"), b"").unwrap();

    let out_dir = dir.path().join("restored");
    let report = restore_dir(&qr_dir, &out_dir, &config(800), TextScanner, Arc::new(NoProgress))
        .await
        .unwrap();

    assert_eq!(report.restored_size, 1250);
    assert!(matches!(&report.warnings[0], Warning::UnreadableArtifact { artifact, .. } if artifact == "chunk_0002.txt"));
    assert!(report.warnings.contains(&Warning::MissingChunks { ranges: vec![IndexRange::single(2)] }));
    assert!(report.warnings.contains(&Warning::SizeMismatch { expected: 2050, actual: 1250 }));

    let restored = std::fs::read(out_dir.join("photo.jpg")).unwrap();
    assert_eq!(&restored[..800], &data[..800]);
    assert_eq!(&restored[800..], &data[1600..]);
}

#[tokio::test]
async fn malformed_chunk_text_is_skipped() {
    let dir = TempDir::new().unwrap();
    let qr_dir = encode_sample(&dir, "a.bin", &sample_bytes(30), 10).await;
    std::fs::write(qr_dir.join("chunk_0001.txt"), "no delimiter here").unwrap();

    let report = restore_dir(&qr_dir, &dir.path().join("out"), &config(10), TextScanner, Arc::new(NoProgress))
        .await
        .unwrap();

    assert!(matches!(&report.warnings[0], Warning::MalformedChunk { artifact, .. } if artifact == "chunk_0001.txt"));
    assert_eq!(report.restored_size, 20);
}

#[tokio::test]
async fn unreadable_header_aborts_without_output() {
    let dir = TempDir::new().unwrap();
    let qr_dir = encode_sample(&dir, "a.bin", &sample_bytes(100), 40).await;
    std::fs::write(qr_dir.join("header.txt"), b"").unwrap();

    let out_dir = dir.path().join("restored");
    let err = restore_dir(&qr_dir, &out_dir, &config(40), TextScanner, Arc::new(NoProgress))
        .await
        .unwrap_err();

    assert!(matches!(err, ArchiveError::HeaderUnreadable { .. }));
    assert!(!out_dir.exists());
}

#[tokio::test]
async fn missing_header_artifact_aborts() {
    let dir = TempDir::new().unwrap();
    let qr_dir = encode_sample(&dir, "a.bin", &sample_bytes(100), 40).await;
    std::fs::remove_file(qr_dir.join("header.txt")).unwrap();

    let out_dir = dir.path().join("restored");
    let err = restore_dir(&qr_dir, &out_dir, &config(40), TextScanner, Arc::new(NoProgress))
        .await
        .unwrap_err();

    assert!(matches!(err, ArchiveError::HeaderUnreadable { .. }));
    assert!(!out_dir.exists());
}

#[tokio::test]
async fn malformed_header_aborts_without_output() {
    let dir = TempDir::new().unwrap();
    let qr_dir = encode_sample(&dir, "a.bin", &sample_bytes(100), 40).await;
    std::fs::write(qr_dir.join("header.txt"), STANDARD.encode(b"a.bin")).unwrap();

    let out_dir = dir.path().join("restored");
    let err = restore_dir(&qr_dir, &out_dir, &config(40), TextScanner, Arc::new(NoProgress))
        .await
        .unwrap_err();

    assert!(matches!(err, ArchiveError::Frame(FrameError::MalformedHeader(_))));
    assert!(!out_dir.exists());
}

#[tokio::test]
async fn missing_artifact_directory_is_file_not_found() {
    let dir = TempDir::new().unwrap();
    let err = restore_dir(
        &dir.path().join("nowhere"),
        &dir.path().join("out"),
        &config(40),
        TextScanner,
        Arc::new(NoProgress),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ArchiveError::FileNotFound(_)));
}

#[tokio::test]
async fn empty_file_is_header_only_and_restores_to_zero_bytes() {
    let dir = TempDir::new().unwrap();
    let qr_dir = encode_sample(&dir, "empty.txt", &[], 800).await;
    assert_eq!(artifact_names(&qr_dir), vec!["header.txt"]);

    let out_dir = dir.path().join("restored");
    let report = restore_dir(&qr_dir, &out_dir, &config(800), TextScanner, Arc::new(NoProgress))
        .await
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(std::fs::read(out_dir.join("empty.txt")).unwrap(), Vec::<u8>::new());
}

#[tokio::test]
async fn renamed_artifacts_restore_by_embedded_index() {
    let dir = TempDir::new().unwrap();
    let data = sample_bytes(90);
    let qr_dir = encode_sample(&dir, "a.bin", &data, 30).await;

    let first = qr_dir.join("chunk_0001.txt");
    let third = qr_dir.join("chunk_0003.txt");
    let tmp = qr_dir.join("swap.tmp");
    std::fs::rename(&first, &tmp).unwrap();
    std::fs::rename(&third, &first).unwrap();
    std::fs::rename(&tmp, &third).unwrap();

    let by_index = restore_dir(&qr_dir, &dir.path().join("by_index"), &config(30), TextScanner, Arc::new(NoProgress))
        .await
        .unwrap();
    assert!(by_index.is_clean());
    assert_eq!(std::fs::read(&by_index.output_path).unwrap(), data);

    let legacy = ArchiveConfig {
        ordering: ChunkOrdering::ArtifactName,
        ..config(30)
    };
    let by_name = restore_dir(&qr_dir, &dir.path().join("by_name"), &legacy, TextScanner, Arc::new(NoProgress))
        .await
        .unwrap();
    assert!(by_name.is_clean());
    let restored = std::fs::read(&by_name.output_path).unwrap();
    assert_eq!(&restored[..30], &data[60..]);
    assert_ne!(restored, data);
}

#[tokio::test]
async fn name_with_delimiter_is_rejected_before_writing() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("a:b.bin");
    std::fs::write(&source, b"data").unwrap();
    let qr_dir = dir.path().join("qr");

    let err = encode_file(&source, &qr_dir, &config(2), TextRenderer, Arc::new(NoProgress))
        .await
        .unwrap_err();

    assert!(matches!(err, ArchiveError::Frame(FrameError::InvalidFileName { .. })));
    assert!(!qr_dir.exists());
}

#[tokio::test]
async fn progress_is_reported_per_artifact() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("a.bin");
    std::fs::write(&source, sample_bytes(25)).unwrap();
    let qr_dir = dir.path().join("qr");
    let progress = Arc::new(RecordingProgress::default());

    let single_worker = ArchiveConfig {
        workers: 1,
        ..config(10)
    };
    encode_file(&source, &qr_dir, &single_worker, TextRenderer, progress.clone())
        .await
        .unwrap();

    let events = progress.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "start Render 3",
            "step Render chunk_0001.txt",
            "step Render chunk_0002.txt",
            "step Render chunk_0003.txt",
            "done Render",
        ]
    );
}

#[tokio::test]
async fn inspect_reports_missing_chunks_without_writing() {
    let dir = TempDir::new().unwrap();
    let qr_dir = encode_sample(&dir, "a.bin", &sample_bytes(50), 10).await;
    std::fs::remove_file(qr_dir.join("chunk_0004.txt")).unwrap();

    let report = inspect_dir(&qr_dir, &config(10), TextScanner, Arc::new(NoProgress))
        .await
        .unwrap();

    assert_eq!(report.file_name, "a.bin");
    assert_eq!(report.file_size, 50);
    assert_eq!(report.total_chunks, Some(5));
    assert_eq!(report.chunk_artifacts, 4);
    assert_eq!(report.present, vec![1, 2, 3, 5]);
    assert!(report.warnings.contains(&Warning::MissingChunks { ranges: vec![IndexRange::single(4)] }));
    assert_eq!(artifact_names(&qr_dir).len(), 5);
}

#[tokio::test]
async fn reencoding_into_a_used_folder_restores_the_new_file() {
    let dir = TempDir::new().unwrap();
    encode_sample(&dir, "old.bin", &sample_bytes(100), 10).await;
    let new_data = vec![b'7'; 30];
    let qr_dir = encode_sample(&dir, "new.bin", &new_data, 10).await;

    assert_eq!(
        artifact_names(&qr_dir),
        vec!["chunk_0001.txt", "chunk_0002.txt", "chunk_0003.txt", "header.txt"]
    );

    let out_dir = dir.path().join("restored");
    let report = restore_dir(&qr_dir, &out_dir, &config(10), TextScanner, Arc::new(NoProgress))
        .await
        .unwrap();

    assert!(report.is_clean(), "{:?}", report.warnings);
    assert_eq!(std::fs::read(out_dir.join("new.bin")).unwrap(), new_data);
}

#[tokio::test]
async fn leftover_chunks_of_another_archive_are_skipped() {
    let dir = TempDir::new().unwrap();
    let old_dir = dir.path().join("old");
    let old_source = dir.path().join("old.bin");
    std::fs::write(&old_source, sample_bytes(100)).unwrap();
    encode_file(&old_source, &old_dir, &config(10), TextRenderer, Arc::new(NoProgress))
        .await
        .unwrap();

    let new_data = vec![b'7'; 30];
    let qr_dir = encode_sample(&dir, "new.bin", &new_data, 10).await;
    for i in 4..=10 {
        let name = format!("chunk_{:04}.txt", i);
        std::fs::copy(old_dir.join(&name), qr_dir.join(&name)).unwrap();
    }

    let out_dir = dir.path().join("restored");
    let report = restore_dir(&qr_dir, &out_dir, &config(10), TextScanner, Arc::new(NoProgress))
        .await
        .unwrap();

    assert_eq!(std::fs::read(out_dir.join("new.bin")).unwrap(), new_data);
    assert_eq!(report.chunks_used, 3);
    assert_eq!(report.warnings.len(), 7);
    assert!(report
        .warnings
        .iter()
        .all(|w| matches!(w, Warning::InconsistentTotal { expected: 3, found: 10, .. })));
}

#[tokio::test]
async fn foreign_frame_with_huge_total_loses_the_tie() {
    let dir = TempDir::new().unwrap();
    let qr_dir = encode_sample(&dir, "hi.txt", b"hi", 800).await;
    std::fs::write(qr_dir.join("chunk_0002.txt"), "1/200000000:eHg=").unwrap();

    let out_dir = dir.path().join("restored");
    let report = restore_dir(&qr_dir, &out_dir, &config(800), TextScanner, Arc::new(NoProgress))
        .await
        .unwrap();

    assert_eq!(std::fs::read(out_dir.join("hi.txt")).unwrap(), b"hi");
    assert_eq!(
        report.warnings,
        vec![Warning::InconsistentTotal {
            artifact: "chunk_0002.txt".to_string(),
            expected: 1,
            found: 200_000_000
        }]
    );

    let inspected = inspect_dir(&qr_dir, &config(800), TextScanner, Arc::new(NoProgress))
        .await
        .unwrap();
    assert_eq!(inspected.total_chunks, Some(1));
}

#[tokio::test]
async fn artifact_name_ordering_still_requires_a_valid_position() {
    let dir = TempDir::new().unwrap();
    let qr_dir = encode_sample(&dir, "a.bin", b"abcd", 2).await;
    std::fs::write(qr_dir.join("chunk_0002.txt"), format!("x/2:{}", STANDARD.encode(b"cd"))).unwrap();

    let legacy = ArchiveConfig {
        ordering: ChunkOrdering::ArtifactName,
        ..config(2)
    };
    let report = restore_dir(&qr_dir, &dir.path().join("out"), &legacy, TextScanner, Arc::new(NoProgress))
        .await
        .unwrap();

    assert_eq!(std::fs::read(&report.output_path).unwrap(), b"ab");
    assert!(matches!(
        report.warnings.as_slice(),
        [Warning::MalformedChunk { artifact, .. }, Warning::SizeMismatch { expected: 4, actual: 2 }]
            if artifact == "chunk_0002.txt"
    ));
}
