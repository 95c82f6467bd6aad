#![allow(dead_code)]

use std::path::Path;
use std::sync::Mutex;

use qrarchive::optical::{OpticalError, Renderer, Scanner};
use qrarchive::progress::{ProgressObserver, Stage};

/// Stores frame text verbatim; stands in for the QR renderer.
pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn extension(&self) -> &str {
        "txt"
    }

    fn render(&self, payload: &str, dest: &Path) -> Result<(), OpticalError> {
        std::fs::write(dest, payload)?;
        Ok(())
    }
}

/// Reads frame text back; an empty file counts as "no code found".
pub struct TextScanner;

impl Scanner for TextScanner {
    fn extension(&self) -> &str {
        "txt"
    }

    fn scan(&self, artifact: &Path) -> Result<Option<String>, OpticalError> {
        let text = std::fs::read_to_string(artifact)?;
        Ok(if text.is_empty() { None } else { Some(text) })
    }
}

#[derive(Default)]
pub struct RecordingProgress {
    pub events: Mutex<Vec<String>>,
}

impl ProgressObserver for RecordingProgress {
    fn started(&self, stage: Stage, total: usize) {
        self.events.lock().unwrap().push(format!("start {:?} {}", stage, total));
    }

    fn advanced(&self, stage: Stage, artifact: &str) {
        self.events.lock().unwrap().push(format!("step {:?} {}", stage, artifact));
    }

    fn finished(&self, stage: Stage) {
        self.events.lock().unwrap().push(format!("done {:?}", stage));
    }
}

pub fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 256) as u8).collect()
}
