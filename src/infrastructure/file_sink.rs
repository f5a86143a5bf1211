//! Delivery of rendered exports.

use std::fs;
use std::path::PathBuf;

use crate::domain::{AppError, ExportFile, Result};

/// Destination for export files.
pub trait FileSink {
    /// Persists `file`, returning where it ended up.
    ///
    /// # Errors
    /// Returns error if the file cannot be stored.
    fn deliver(&self, file: &ExportFile) -> Result<PathBuf>;
}

/// Writes exports into a directory, creating it when missing.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FileSink for DirectorySink {
    fn deliver(&self, file: &ExportFile) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            AppError::io(format!("Failed to create directory {}", self.dir.display()), e)
        })?;

        let path = self.dir.join(&file.filename);
        fs::write(&path, file.content.as_bytes())
            .map_err(|e| AppError::io(format!("Failed to write {}", path.display()), e))?;

        tracing::info!(
            path = %path.display(),
            mime = file.mime_type,
            bytes = file.content.len(),
            "Export written"
        );

        Ok(path)
    }
}
