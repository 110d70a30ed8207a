use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::compositor::CompositeResult;
use crate::config::Config;
use crate::error::{ImageError, Result};

/// Paths of the two persisted panel images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedWallpapers {
    pub upper: PathBuf,
    pub lower: PathBuf,
}

/// Writes composed panels to disk as JPEG
#[derive(Debug, Clone)]
pub struct WallpaperStore {
    dir: PathBuf,
    upper_name: String,
    lower_name: String,
    quality: u8,
}

impl WallpaperStore {
    pub fn new<P: Into<PathBuf>>(dir: P, quality: u8) -> Self {
        Self {
            dir: dir.into(),
            upper_name: "wallpaper_upper.jpg".to_string(),
            lower_name: "wallpaper_lower.jpg".to_string(),
            quality: quality.clamp(1, 100),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.output_dir(), config.output.jpeg_quality)
            .with_names(&config.output.upper_name, &config.output.lower_name)
    }

    pub fn with_names(mut self, upper: &str, lower: &str) -> Self {
        self.upper_name = upper.to_string();
        self.lower_name = lower.to_string();
        self
    }

    /// Save both panels, upper first
    pub fn save(&self, result: &CompositeResult) -> Result<SavedWallpapers> {
        create_dir_all(&self.dir)?;

        let upper = self.dir.join(&self.upper_name);
        let lower = self.dir.join(&self.lower_name);

        let (upper_bytes, lower_bytes) = result.encode_jpeg(self.quality)?;
        debug!(
            "Encoded panels at quality {}: {} + {} bytes",
            self.quality,
            upper_bytes.len(),
            lower_bytes.len()
        );

        write_file(&upper, &upper_bytes)?;
        info!(
            "Upper screen saved: {} ({}x{})",
            upper.display(),
            result.upper_output.width(),
            result.upper_output.height()
        );

        write_file(&lower, &lower_bytes)?;
        info!(
            "Lower screen saved: {} ({}x{})",
            lower.display(),
            result.lower_output.width(),
            result.lower_output.height()
        );

        Ok(SavedWallpapers { upper, lower })
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| {
        ImageError::SaveFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}
