//! Upload progress reporting.
//!
//! The payload stream is metered as the object store pulls it: each chunk
//! produces an `uploading` report with the running percentage. Once the store
//! returns, exactly one terminal report follows (`completed` with the locator,
//! or `error` with the message) and nothing after it. A body longer than its
//! declared length fails the upload.

use crate::{
    auth::{UserIdError, validate_user_id},
    models::upload::{StoredObject, UploadCategory, UploadProgress},
    services::blobs::{BlobError, BlobStore, ByteStream},
    validation::{FileRules, ValidationError},
};
use chrono::Utc;
use futures::StreamExt;
use std::io;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Receives every progress report of one upload.
pub type ProgressFn<'a> = &'a (dyn Fn(UploadProgress) + Send + Sync);

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("invalid owner: {0}")]
    InvalidOwner(#[from] UserIdError),
    #[error("upload failed: {0}")]
    Transfer(#[from] BlobError),
}

/// A payload ready to be stored.
pub struct UploadRequest<'a> {
    pub user_id: String,
    pub category: UploadCategory,
    /// Name of the file as picked by the user; recordings have none.
    pub original_name: Option<String>,
    /// Declared payload length, the denominator for progress.
    pub total_bytes: u64,
    pub body: ByteStream<'a>,
}

impl UploadRequest<'_> {
    /// Name validation and storage use, falling back to a recording name.
    pub fn file_name(&self, timestamp_ms: i64) -> String {
        match self.original_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("recording-{timestamp_ms}.webm"),
        }
    }
}

/// Percentage of `transferred` over `total`, capped at 100.
fn percent(transferred: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (transferred as f64 / total as f64 * 100.0).min(100.0)
}

/// Path separators and control characters become `_`.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// `{category}s/{userId}/{timestamp}-{name}`
pub fn storage_path(category: UploadCategory, user_id: &str, timestamp_ms: i64, name: &str) -> String {
    format!(
        "{}{}-{}",
        category.user_prefix(user_id),
        timestamp_ms,
        sanitize_name(name)
    )
}

/// Stream `req.body` into the object store, reporting progress.
pub async fn upload_file(
    blobs: &dyn BlobStore,
    req: UploadRequest<'_>,
    on_progress: Option<ProgressFn<'_>>,
) -> Result<StoredObject, UploadError> {
    validate_user_id(&req.user_id)?;

    let report = |progress: UploadProgress| {
        debug!(status = ?progress.status, "upload progress {:.1}%", progress.progress);
        if let Some(cb) = on_progress {
            cb(progress);
        }
    };

    let timestamp_ms = Utc::now().timestamp_millis();
    let name = req.file_name(timestamp_ms);
    let path = storage_path(req.category, &req.user_id, timestamp_ms, &name);
    let total = req.total_bytes;

    if total == 0 {
        report(UploadProgress::uploading(100.0));
    }

    // Nothing past the declared length reaches the store.
    let mut transferred: u64 = 0;
    let metered = req
        .body
        .map(move |chunk| -> io::Result<_> {
            let chunk = chunk?;
            transferred += chunk.len() as u64;
            if transferred > total {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("payload exceeds declared length of {total} bytes"),
                ));
            }
            report(UploadProgress::uploading(percent(transferred, total)));
            Ok(chunk)
        })
        .boxed();

    match blobs.put(&path, metered).await {
        Ok(outcome) => {
            let locator = blobs.locator(&path);
            info!(path = %path, size = outcome.size_bytes, "upload completed");
            report(UploadProgress::completed(locator.clone()));
            Ok(StoredObject {
                path,
                locator,
                size_bytes: outcome.size_bytes,
                etag: outcome.etag,
            })
        }
        Err(err) => {
            warn!(path = %path, "upload failed: {}", err);
            report(UploadProgress::failed(err.to_string()));
            Err(UploadError::Transfer(err))
        }
    }
}

/// Check the file against `rules` and upload it only if it passes.
///
/// A rejected file never reaches the object store.
pub async fn upload_validated(
    blobs: &dyn BlobStore,
    rules: &FileRules,
    req: UploadRequest<'_>,
    on_progress: Option<ProgressFn<'_>>,
) -> Result<StoredObject, UploadError> {
    let name = req.file_name(Utc::now().timestamp_millis());
    if let Err(err) = rules.validate(&name, req.total_bytes) {
        info!(user = %req.user_id, file = %name, "upload rejected: {}", err);
        return Err(err.into());
    }
    upload_file(blobs, req, on_progress).await
}
