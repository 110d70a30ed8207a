use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, SourceError};

/// Local image file used instead of the network in test mode
///
/// A relative path is looked up next to the config file's parent
/// directory first, then next to the config file, then as given.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    requested: PathBuf,
    candidates: Vec<PathBuf>,
}

impl FixtureSource {
    pub const NAME: &'static str = "local file";

    pub fn new<P: AsRef<Path>>(path: P, base_dir: Option<&Path>) -> Self {
        let requested = path.as_ref().to_path_buf();
        let mut candidates = Vec::new();

        if requested.is_relative() {
            if let Some(base) = base_dir {
                if let Some(parent) = base.parent() {
                    candidates.push(parent.join(&requested));
                }
                candidates.push(base.join(&requested));
            }
        }
        candidates.push(requested.clone());

        Self {
            requested,
            candidates,
        }
    }

    pub fn requested(&self) -> &Path {
        &self.requested
    }

    /// First candidate path that exists
    pub fn resolve(&self) -> Option<&Path> {
        self.candidates
            .iter()
            .map(PathBuf::as_path)
            .find(|path| path.is_file())
    }

    pub async fn fetch(&self) -> Result<Vec<u8>> {
        let path = self.resolve().ok_or_else(|| SourceError::FixtureNotFound {
            path: self.requested.display().to_string(),
        })?;

        info!("Test mode: loading local image {}", path.display());
        let bytes = tokio::fs::read(path).await?;
        debug!("Read {} bytes", bytes.len());
        Ok(bytes)
    }
}
