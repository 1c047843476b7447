//! Request-scoped staging of uploaded documents.
//!
//! A multipart `file` field is streamed into the scratch directory under a random name and
//! wrapped in a [`TempUpload`]. The guard owns the file: [`TempUpload::run`] hands the path to an
//! operation and deletes the file before returning, and dropping an unfinished guard deletes it
//! synchronously. Either way the file is removed exactly once.

use axum::extract::multipart::{Multipart, MultipartError};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Multipart field carrying the document.
pub const FILE_FIELD: &str = "file";
/// Filename reported when the client did not send one.
pub const DEFAULT_FILENAME: &str = "upload";

/// Errors raised while staging an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The request contained no `file` field.
    #[error("No file uploaded")]
    MissingFile,
    /// The multipart body could not be read.
    #[error("Failed to read multipart body: {0}")]
    Multipart(#[from] MultipartError),
    /// Writing to the scratch directory failed.
    #[error("Failed to store upload: {0}")]
    Storage(#[from] io::Error),
}

/// An uploaded document staged on disk for the duration of one request.
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
    filename: String,
    size: u64,
    removed: bool,
}

impl TempUpload {
    /// Stream the first `file` field of `multipart` into `dir`.
    ///
    /// Other fields are skipped. A partially written file is removed if the body fails midway.
    pub async fn receive(mut multipart: Multipart, dir: &Path) -> Result<Self, UploadError> {
        while let Some(mut field) = multipart.next_field().await? {
            if field.name() != Some(FILE_FIELD) {
                continue;
            }

            let filename = field
                .file_name()
                .filter(|name| !name.is_empty())
                .unwrap_or(DEFAULT_FILENAME)
                .to_string();
            let path = dir.join(Uuid::new_v4().simple().to_string());
            let mut file = tokio::fs::File::create(&path).await?;
            let mut upload = Self::staged(path, filename);

            while let Some(chunk) = field.chunk().await? {
                file.write_all(&chunk).await?;
                upload.size += chunk.len() as u64;
            }
            file.flush().await?;

            tracing::debug!(
                path = %upload.path.display(),
                filename = %upload.filename,
                bytes = upload.size,
                "Staged upload"
            );
            return Ok(upload);
        }

        Err(UploadError::MissingFile)
    }

    pub(crate) fn staged(path: PathBuf, filename: String) -> Self {
        Self {
            path,
            filename,
            size: 0,
            removed: false,
        }
    }

    /// Location of the staged file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Filename supplied by the client.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Number of bytes written to disk.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Run `op` against the staged file, then delete it whatever the outcome.
    ///
    /// Returns the client filename together with the operation's output.
    pub async fn run<F, Fut, T>(mut self, op: F) -> (String, T)
    where
        F: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = T>,
    {
        let outcome = op(self.path.clone()).await;
        self.remove().await;
        (std::mem::take(&mut self.filename), outcome)
    }

    async fn remove(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        if let Err(error) = tokio::fs::remove_file(&self.path).await {
            tracing::warn!(path = %self.path.display(), error = %error, "Failed to delete upload");
        }
    }
}

// Requests normally finish through `run`, which deletes asynchronously. This covers guards
// dropped early: a failed body read, or a handler future cancelled by a client disconnect.
impl Drop for TempUpload {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        if let Err(error) = std::fs::remove_file(&self.path)
            && error.kind() != io::ErrorKind::NotFound
        {
            tracing::warn!(path = %self.path.display(), error = %error, "Failed to delete abandoned upload");
        }
    }
}
