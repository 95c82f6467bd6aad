use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};

use crate::engine::ChunkOrdering;
use crate::protocol::{DEFAULT_CHUNK_SIZE, DEFAULT_INDEX_WIDTH};

pub const DEFAULT_CONFIG_FILE: &str = "qrarchive.toml";

/// QR error correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    L,
    #[default]
    M,
    Q,
    H,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrSettings {
    pub error_correction: ErrorCorrection,
    /// Pixels per module.
    pub module_size: u32,
    /// Quiet zone width in modules.
    pub border: u32,
}

impl Default for QrSettings {
    fn default() -> Self {
        Self {
            error_correction: ErrorCorrection::M,
            module_size: 10,
            border: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub chunk_size: usize,
    pub index_width: usize,
    pub ordering: ChunkOrdering,
    /// Concurrent render/scan jobs; 0 picks the available parallelism.
    pub workers: usize,
    pub artifact_dir: PathBuf,
    pub restore_dir: PathBuf,
    pub qr: QrSettings,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            index_width: DEFAULT_INDEX_WIDTH,
            ordering: ChunkOrdering::EmbeddedIndex,
            workers: 0,
            artifact_dir: PathBuf::from("qrcodes"),
            restore_dir: PathBuf::from("restored"),
            qr: QrSettings::default(),
        }
    }
}

impl ArchiveConfig {
    /// Load `config_path` (or `qrarchive.toml`) if it exists, defaults otherwise.
    pub fn load_or_default(config_path: Option<&Path>) -> Result<Self> {
        let config_file = config_path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));

        if config_file.exists() {
            let content = std::fs::read_to_string(config_file)
                .with_context(|| format!("reading {}", config_file.display()))?;
            let config: ArchiveConfig = toml::from_str(&content)
                .with_context(|| format!("parsing {}", config_file.display()))?;
            tracing::debug!("Loaded config from {:?}", config_file);
            Ok(config)
        } else if config_path.is_some() {
            anyhow::bail!("config file not found: {}", config_file.display())
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, config_path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        }
    }
}
