use image::{GrayImage, Luma};
use qrcode::types::{Color, EcLevel};
use qrcode::QrCode;
use std::path::Path;
use tracing::debug;

use crate::config::{ErrorCorrection, QrSettings};
use crate::optical::{OpticalError, Renderer, Scanner};
use crate::protocol::DEFAULT_ARTIFACT_EXTENSION;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => EcLevel::L,
            ErrorCorrection::M => EcLevel::M,
            ErrorCorrection::Q => EcLevel::Q,
            ErrorCorrection::H => EcLevel::H,
        }
    }
}

/// Renders frame text as a black-on-white PNG QR code.
#[derive(Debug, Clone)]
pub struct QrRenderer {
    settings: QrSettings,
}

impl QrRenderer {
    pub fn new(settings: QrSettings) -> Self {
        Self { settings }
    }

    /// Rasterize with `module_size` pixels per module and a `border`-module quiet zone.
    pub fn rasterize(&self, payload: &str) -> Result<GrayImage, OpticalError> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), self.settings.error_correction.into())
            .map_err(|e| OpticalError::Encode(e.to_string()))?;

        let width = code.width() as u32;
        let colors = code.to_colors();
        let scale = self.settings.module_size.max(1);
        let border = self.settings.border;
        let side = (width + 2 * border) * scale;

        Ok(GrayImage::from_fn(side, side, |x, y| {
            let (mx, my) = (x / scale, y / scale);
            if mx < border || my < border || mx >= border + width || my >= border + width {
                return LIGHT;
            }
            let idx = ((my - border) * width + (mx - border)) as usize;
            match colors[idx] {
                Color::Dark => DARK,
                Color::Light => LIGHT,
            }
        }))
    }
}

impl Default for QrRenderer {
    fn default() -> Self {
        Self::new(QrSettings::default())
    }
}

impl Renderer for QrRenderer {
    fn extension(&self) -> &str {
        DEFAULT_ARTIFACT_EXTENSION
    }

    fn render(&self, payload: &str, dest: &Path) -> Result<(), OpticalError> {
        let img = self.rasterize(payload)?;
        img.save(dest)?;
        debug!("Rendered {} ({}x{} px)", dest.display(), img.width(), img.height());
        Ok(())
    }
}

/// Finds QR codes in an image and returns the first one that decodes.
#[derive(Debug, Clone, Default)]
pub struct QrScanner;

impl QrScanner {
    pub fn new() -> Self {
        Self
    }

    pub fn scan_image(&self, gray: &GrayImage) -> Option<String> {
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            gray.width() as usize,
            gray.height() as usize,
            |x, y| gray.get_pixel(x as u32, y as u32).0[0],
        );

        prepared.detect_grids().into_iter().find_map(|grid| match grid.decode() {
            Ok((_, content)) => Some(content),
            Err(e) => {
                debug!("Grid failed to decode: {}", e);
                None
            }
        })
    }
}

impl Scanner for QrScanner {
    fn extension(&self) -> &str {
        DEFAULT_ARTIFACT_EXTENSION
    }

    fn scan(&self, artifact: &Path) -> Result<Option<String>, OpticalError> {
        let gray = image::open(artifact)?.to_luma8();
        Ok(self.scan_image(&gray))
    }
}
