use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::Result;
use crate::protocol::{ChunkFrame, HeaderFrame};
use crate::report::{IndexRange, Warning};
use crate::utils::io::write_into;

/// How retained chunk frames are ordered before concatenation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ChunkOrdering {
    /// Sort by the `index` carried inside each frame.
    #[default]
    EmbeddedIndex,
    /// Sort by artifact file name. Renamed artifacts corrupt the output.
    ///
    /// The position field is ignored for ordering but must still parse:
    /// a chunk whose `i/n` prefix is invalid is dropped as malformed even
    /// when its payload is intact.
    ArtifactName,
}

/// A decoded chunk frame and the artifact it came from.
#[derive(Debug, Clone)]
pub struct SourcedChunk {
    pub artifact: String,
    pub frame: ChunkFrame,
}

#[derive(Debug, Clone)]
pub struct Assembly {
    pub data: Vec<u8>,
    pub chunks_used: usize,
    pub warnings: Vec<Warning>,
}

impl Assembly {
    fn warn(&mut self, warning: Warning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// Concatenate chunk payloads and check the result against the header size.
///
/// Never fails: gaps, duplicates and size mismatches are reported as warnings
/// and the best-effort bytes are returned.
pub fn assemble(header: &HeaderFrame, mut chunks: Vec<SourcedChunk>, ordering: ChunkOrdering) -> Assembly {
    chunks.sort_by(|a, b| a.artifact.cmp(&b.artifact));

    let capacity = chunks.iter().map(|c| c.frame.payload().len()).sum();
    let mut assembly = Assembly {
        data: Vec::with_capacity(capacity),
        chunks_used: 0,
        warnings: Vec::new(),
    };

    let ordered = match ordering {
        ChunkOrdering::ArtifactName => chunks,
        ChunkOrdering::EmbeddedIndex => select_by_index(header, chunks, &mut assembly),
    };

    for chunk in ordered {
        assembly.data.extend_from_slice(chunk.frame.payload());
        assembly.chunks_used += 1;
    }

    let actual = assembly.data.len() as u64;
    if actual != header.file_size() {
        assembly.warn(Warning::SizeMismatch {
            expected: header.file_size(),
            actual,
        });
    }

    assembly
}

/// Keep one frame per index under the archive's chunk total.
fn select_by_index(header: &HeaderFrame, chunks: Vec<SourcedChunk>, assembly: &mut Assembly) -> Vec<SourcedChunk> {
    let Some(expected_total) = select_total(header, &chunks) else {
        return Vec::new();
    };

    let mut by_index: BTreeMap<u32, SourcedChunk> = BTreeMap::new();
    for chunk in chunks {
        let found = chunk.frame.total_chunks();
        if found != expected_total {
            assembly.warn(Warning::InconsistentTotal {
                artifact: chunk.artifact,
                expected: expected_total,
                found,
            });
            continue;
        }

        let index = chunk.frame.index();
        if by_index.contains_key(&index) {
            assembly.warn(Warning::DuplicateChunk {
                index,
                artifact: chunk.artifact,
            });
            continue;
        }
        by_index.insert(index, chunk);
    }

    let missing = missing_ranges(by_index.keys().copied(), expected_total);
    if !missing.is_empty() {
        assembly.warn(Warning::MissingChunks { ranges: missing });
    }

    by_index.into_values().collect()
}

/// Gaps in `1..=total` not covered by `present`, which must be sorted.
///
/// Output grows with the number of present indices, not with `total`.
fn missing_ranges(present: impl Iterator<Item = u32>, total: u32) -> Vec<IndexRange> {
    let mut ranges = Vec::new();
    let mut next: u64 = 1;
    for index in present {
        if u64::from(index) > next {
            ranges.push(IndexRange {
                first: next as u32,
                last: index - 1,
            });
        }
        next = u64::from(index) + 1;
    }
    if next <= u64::from(total) {
        ranges.push(IndexRange {
            first: next as u32,
            last: total,
        });
    }
    ranges
}

/// Frames seen for one candidate chunk total.
#[derive(Default)]
struct TotalVotes {
    frames: usize,
    /// Payload length shared by the non-final chunks.
    body_len: Option<usize>,
    body_mixed: bool,
    last_len: Option<usize>,
}

impl TotalVotes {
    fn record(&mut self, frame: &ChunkFrame) {
        self.frames += 1;
        let len = frame.payload().len();
        if frame.index() == frame.total_chunks() {
            self.last_len.get_or_insert(len);
            return;
        }
        match self.body_len {
            None => self.body_len = Some(len),
            Some(body) if body != len => self.body_mixed = true,
            Some(_) => {}
        }
    }

    /// Whether splitting `file_size` bytes could yield `total` chunks with
    /// the payload lengths seen.
    fn fits(&self, total: u32, file_size: u64) -> bool {
        let total = u64::from(total);
        if total > file_size || self.body_mixed {
            return false;
        }
        match (self.body_len, self.last_len) {
            (Some(body), last) => {
                let body = body as u64;
                body > 0
                    && file_size.div_ceil(body) == total
                    && last.map_or(true, |last| {
                        body.checked_mul(total - 1)
                            .and_then(|n| n.checked_add(last as u64))
                            == Some(file_size)
                    })
            }
            (None, Some(last)) => {
                let last = last as u64;
                last > 0
                    && (total - 1).checked_add(last).is_some_and(|min| min <= file_size)
                    && (total > 1 || last == file_size)
            }
            (None, None) => false,
        }
    }
}

/// Chunk total for an archive whose header declares `header.file_size()`.
///
/// Totals the header can account for beat those it cannot; then the total
/// with the most frames wins, and remaining ties go to the smaller total.
pub(crate) fn select_total(header: &HeaderFrame, chunks: &[SourcedChunk]) -> Option<u32> {
    let mut votes: BTreeMap<u32, TotalVotes> = BTreeMap::new();
    for chunk in chunks {
        votes.entry(chunk.frame.total_chunks()).or_default().record(&chunk.frame);
    }
    votes
        .into_iter()
        .max_by_key(|(total, v)| (v.fits(*total, header.file_size()), v.frames, Reverse(*total)))
        .map(|(total, _)| total)
}

/// Write the assembled bytes to `output_dir/<header file name>`.
pub async fn write_output(header: &HeaderFrame, assembly: &Assembly, output_dir: &Path) -> Result<PathBuf> {
    let path = write_into(output_dir, header.file_name(), &assembly.data).await?;
    info!("Restored {} ({} bytes)", path.display(), assembly.data.len());
    Ok(path)
}
