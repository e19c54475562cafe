//! On-disk store for generated term sheets served by the download-link flow.

use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub filename: String,
    pub path: PathBuf,
    pub size: usize,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Writes the PDF under a fresh, unique file name.
    pub async fn save(&self, pdf: &[u8], generated_at: DateTime<Utc>) -> Result<StoredDocument, AppError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("cannot create output directory {}", self.root.display()))?;

        let filename = generated_filename(generated_at, Uuid::new_v4());
        let path = self.root.join(&filename);
        tokio::fs::write(&path, pdf)
            .await
            .with_context(|| format!("cannot write {}", path.display()))?;

        info!(filename = %filename, bytes = pdf.len(), "Term sheet stored");

        Ok(StoredDocument {
            filename,
            path,
            size: pdf.len(),
        })
    }

    pub async fn read(&self, filename: &str) -> Result<Vec<u8>, AppError> {
        validate_filename(filename)?;
        let path = self.root.join(filename);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound("PDF file not found".to_string()))
            }
            Err(e) => Err(AppError::Internal(
                anyhow::Error::new(e).context(format!("cannot read {}", path.display())),
            )),
        }
    }
}

/// `term-sheet-2026-10-18T09-30-00-123Z-1a2b3c4d.pdf`
pub fn generated_filename(generated_at: DateTime<Utc>, id: Uuid) -> String {
    let timestamp = generated_at.format("%Y-%m-%dT%H-%M-%S-%3fZ");
    let short_id = &id.simple().to_string()[..8];
    format!("term-sheet-{timestamp}-{short_id}.pdf")
}

/// Only plain `*.pdf` names inside the store are served.
pub fn validate_filename(filename: &str) -> Result<(), AppError> {
    let plain = !filename.is_empty()
        && filename
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !filename.starts_with('.')
        && !filename.contains("..");

    if plain && filename.ends_with(".pdf") {
        Ok(())
    } else {
        Err(AppError::Validation(format!("invalid file name '{filename}'")))
    }
}
