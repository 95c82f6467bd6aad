//! Property-based tests for the frame codec, splitter and assembler.

use proptest::prelude::*;

use crate::engine::{assemble, split_bytes, ChunkOrdering, SourcedChunk};
use crate::protocol::{decode_chunk, decode_header, encode_chunk, encode_header, ChunkFrame};

fn sourced(archive_chunks: Vec<ChunkFrame>) -> Vec<SourcedChunk> {
    archive_chunks
        .into_iter()
        .map(|frame| SourcedChunk {
            artifact: format!("chunk_{:04}.png", frame.index()),
            frame,
        })
        .collect()
}

proptest! {
    #[test]
    fn chunk_codec_is_idempotent(
        (total, index) in (1u32..=10_000).prop_flat_map(|n| (Just(n), 1..=n)),
        payload in prop::collection::vec(any::<u8>(), 0..2048),
    ) {
        let text = encode_chunk(index, total, &payload).unwrap();
        prop_assert_eq!(decode_chunk(&text).unwrap(), (index, total, payload));
    }

    #[test]
    fn header_codec_is_idempotent(
        name in "[A-Za-z0-9_ .-]{1,40}",
        size in any::<u64>(),
    ) {
        prop_assume!(name != "." && name != "..");
        let text = encode_header(&name, size).unwrap();
        prop_assert_eq!(decode_header(&text).unwrap(), (name, size));
    }

    #[test]
    fn chunk_count_is_ceiling_division(
        data in prop::collection::vec(any::<u8>(), 0..5000),
        chunk_size in 1usize..1200,
    ) {
        let archive = split_bytes("f.bin", &data, chunk_size).unwrap();
        prop_assert_eq!(archive.total_chunks() as usize, data.len().div_ceil(chunk_size));
        prop_assert!(archive.chunks.iter().all(|c| c.payload().len() <= chunk_size));
    }

    #[test]
    fn split_then_assemble_round_trips(
        data in prop::collection::vec(any::<u8>(), 0..5000),
        chunk_size in 1usize..1200,
    ) {
        let archive = split_bytes("f.bin", &data, chunk_size).unwrap();
        let header = archive.header.clone();

        // through the wire form and back, in reverse order
        let mut frames: Vec<ChunkFrame> = archive
            .chunks
            .iter()
            .map(|c| ChunkFrame::decode(&c.encode()).unwrap())
            .collect();
        frames.reverse();

        let assembly = assemble(&header, sourced(frames), ChunkOrdering::EmbeddedIndex);
        prop_assert!(assembly.warnings.is_empty());
        prop_assert_eq!(assembly.data, data);
    }

    #[test]
    fn dropping_a_chunk_warns_but_does_not_fail(
        data in prop::collection::vec(any::<u8>(), 2..3000),
        chunk_size in 1usize..500,
        drop_seed in any::<prop::sample::Index>(),
    ) {
        let archive = split_bytes("f.bin", &data, chunk_size).unwrap();
        let mut frames = archive.chunks.clone();
        prop_assume!(frames.len() > 1);
        let dropped = frames.remove(drop_seed.index(frames.len()));

        let assembly = assemble(&archive.header, sourced(frames), ChunkOrdering::EmbeddedIndex);
        prop_assert_eq!(assembly.data.len(), data.len() - dropped.payload().len());
        let has_size_mismatch = assembly
            .warnings
            .iter()
            .any(|w| matches!(w, crate::report::Warning::SizeMismatch { .. }));
        prop_assert!(has_size_mismatch);
    }
}
