// src/download.rs

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
#[error("Failed to save {file_name}: {source}")]
pub struct SaveError {
    pub file_name: String,
    #[source]
    pub source: std::io::Error,
}

/// Somewhere a downloaded invoice can be handed off to.
pub trait FileSink: Send + Sync {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, SaveError>;
}

/// Writes downloads into a directory, creating it on first use.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl FileSink for DirectorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, SaveError> {
        let wrap = |source| SaveError {
            file_name: file_name.to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(wrap)?;
        let path = self.dir.join(file_name);
        fs::write(&path, bytes).map_err(wrap)?;

        info!(path = %path.display(), bytes = bytes.len(), "Invoice saved");
        Ok(path)
    }
}
