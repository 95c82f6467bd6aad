//! Optical collaborators: turn frame text into image artifacts and back.
//!
//! Both traits are synchronous; the encoder and decoder call them from
//! tokio's blocking pool.

pub mod qr;

use std::path::Path;
use thiserror::Error;

pub use qr::{QrRenderer, QrScanner};

#[derive(Error, Debug)]
pub enum OpticalError {
    #[error("payload does not fit in a single symbol: {0}")]
    Encode(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders one frame's text into an artifact file.
pub trait Renderer: Send + Sync {
    /// File extension of produced artifacts, without the dot.
    fn extension(&self) -> &str;

    fn render(&self, payload: &str, dest: &Path) -> Result<(), OpticalError>;
}

/// Extracts the embedded text from an artifact file.
pub trait Scanner: Send + Sync {
    /// File extension of artifacts this scanner reads, without the dot.
    fn extension(&self) -> &str;

    /// `Ok(None)` means the artifact was read but carries no decodable payload.
    fn scan(&self, artifact: &Path) -> Result<Option<String>, OpticalError>;
}
