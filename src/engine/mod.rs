pub mod assembler;
pub mod splitter;

pub use assembler::{assemble, write_output, Assembly, ChunkOrdering, SourcedChunk};
pub use splitter::{split_bytes, split_file, Archive};
