//! Split files into QR code artifacts and restore them.
//!
//! A file becomes one header frame (`base64("<name>:<size>:")`) plus chunk
//! frames (`"<index>/<total>:" + base64(bytes)`), each rendered to its own
//! image. Restoring scans the images back, orders chunks, and checks the
//! reassembled size against the header.

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod optical;
pub mod pipeline;
pub mod progress;
pub mod protocol;
pub mod report;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod proptests;

pub use config::ArchiveConfig;
pub use engine::{Archive, ChunkOrdering};
pub use error::{ArchiveError, Result};
pub use report::{EncodeReport, IndexRange, InspectReport, RestoreReport, Warning};
