pub mod constants;
pub mod error;
pub mod frame;

pub use constants::*;
pub use error::FrameError;
pub use frame::{decode_chunk, decode_header, encode_chunk, encode_header, ChunkFrame, HeaderFrame};
