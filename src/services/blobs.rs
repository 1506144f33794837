//! Binary object store.
//!
//! Objects are addressed only by their storage path
//! (`{audio|document}s/{userId}/{timestamp}-{name}`); there is no metadata
//! row. `LocalBlobStore` keeps payloads on disk beneath `base_path/{path}`
//! so that prefix listing is a directory walk.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, stream::BoxStream};
use md5::Context;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;

pub type ByteStream<'a> = BoxStream<'a, io::Result<Bytes>>;

#[derive(Debug, Error)]
pub enum BlobError {
    /// Nothing has ever been stored under the prefix.
    #[error("prefix `{0}` not found")]
    PrefixNotFound(String),
    #[error("object `{0}` not found")]
    ObjectNotFound(String),
    #[error("invalid object path `{0}`")]
    InvalidPath(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type BlobResult<T> = Result<T, BlobError>;

/// Size and digest of a payload that has been fully written.
#[derive(Debug, Clone)]
pub struct PutOutcome {
    pub size_bytes: u64,
    pub etag: String,
}

/// An object opened for reading.
pub struct BlobReader {
    pub size_bytes: u64,
    pub stream: ByteStream<'static>,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write the full stream to `path`, replacing any existing object.
    async fn put(&self, path: &str, stream: ByteStream<'_>) -> BlobResult<PutOutcome>;

    /// Retrieval locator for an object stored at `path`.
    fn locator(&self, path: &str) -> String;

    /// Every object path under `prefix`, sorted.
    ///
    /// Returns `PrefixNotFound` when the prefix has never held an object.
    async fn list_prefix(&self, prefix: &str) -> BlobResult<Vec<String>>;

    async fn open(&self, path: &str) -> BlobResult<BlobReader>;

    /// Remove the object at `path`. Returns `false` if it was already gone.
    async fn delete(&self, path: &str) -> BlobResult<bool>;
}

const MAX_OBJECT_PATH_LEN: usize = 1024;

/// In-flight writes land in `{dir}/.tmp-{uuid}` before the rename.
const TMP_FILE_PREFIX: &str = ".tmp-";

/// Disk-backed `BlobStore`.
#[derive(Clone)]
pub struct LocalBlobStore {
    /// Directory objects are stored beneath.
    pub base_path: PathBuf,

    /// Public origin used when building retrieval locators.
    pub public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(base_path: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Rejects paths that could escape `base_path`.
    fn ensure_path_safe(path: &str) -> BlobResult<()> {
        let invalid = path.is_empty()
            || path.len() > MAX_OBJECT_PATH_LEN
            || path.starts_with('/')
            || path
                .split('/')
                .any(|part| part.is_empty() || part == "." || part == "..")
            || path
                .bytes()
                .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0');
        if invalid {
            return Err(BlobError::InvalidPath(path.to_string()));
        }
        Ok(())
    }

    fn resolve(&self, path: &str) -> BlobResult<PathBuf> {
        Self::ensure_path_safe(path)?;
        Ok(self.base_path.join(path))
    }

    /// Remove empty directories from `start` upward, stopping at `base_path`.
    async fn prune_empty_dirs(&self, start: &Path) {
        let mut current = start.to_path_buf();
        while current.starts_with(&self.base_path) && current != self.base_path {
            match fs::remove_dir(&current).await {
                Ok(_) => match current.parent() {
                    Some(parent) => current = parent.to_path_buf(),
                    None => break,
                },
                Err(err) if err.kind() == ErrorKind::NotFound => break,
                Err(err) if err.kind() == ErrorKind::DirectoryNotEmpty => break,
                Err(err) => {
                    debug!("failed to prune directory {}: {}", current.display(), err);
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    /// Streams into a temp file beside the target, fsyncs, then renames
    /// into place. The temp file is removed on any failure.
    async fn put(&self, path: &str, mut stream: ByteStream<'_>) -> BlobResult<PutOutcome> {
        let file_path = self.resolve(path)?;
        let parent = file_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| BlobError::InvalidPath(path.to_string()))?;
        fs::create_dir_all(&parent).await?;
        let tmp_path = parent.join(format!("{TMP_FILE_PREFIX}{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let mut size_bytes: u64 = 0;
        let mut digest = Context::new();
        while let Some(chunk_res) = stream.next().await {
            let chunk = match chunk_res {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(BlobError::Io(err));
                }
            };
            size_bytes += chunk.len() as u64;
            digest.consume(&chunk);
            if let Err(err) = file.write_all(&chunk).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(BlobError::Io(err));
            }
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(BlobError::Io(err));
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(BlobError::Io(err));
        }
        drop(file);

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(BlobError::Io(err));
        }

        Ok(PutOutcome {
            size_bytes,
            etag: format!("{:x}", digest.compute()),
        })
    }

    fn locator(&self, path: &str) -> String {
        format!("{}/objects/{}", self.public_base_url, path)
    }

    async fn list_prefix(&self, prefix: &str) -> BlobResult<Vec<String>> {
        let trimmed = prefix.trim_end_matches('/');
        let root = self.resolve(trimmed)?;

        match fs::metadata(&root).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(BlobError::PrefixNotFound(prefix.to_string())),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(BlobError::PrefixNotFound(prefix.to_string()));
            }
            Err(err) => return Err(BlobError::Io(err)),
        }

        let mut paths = Vec::new();
        let mut pending = vec![(root, trimmed.to_string())];
        while let Some((dir, rel)) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                // Removed by a concurrent delete after we saw it.
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(BlobError::Io(err)),
            };
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with(TMP_FILE_PREFIX) {
                    continue;
                }
                let child = format!("{rel}/{name}");
                if entry.file_type().await?.is_dir() {
                    pending.push((entry.path(), child));
                } else {
                    paths.push(child);
                }
            }
        }

        paths.sort();
        Ok(paths)
    }

    async fn open(&self, path: &str) -> BlobResult<BlobReader> {
        let file_path = self.resolve(path)?;
        let file = File::open(&file_path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                BlobError::ObjectNotFound(path.to_string())
            } else {
                BlobError::Io(err)
            }
        })?;
        let size_bytes = file.metadata().await?.len();
        Ok(BlobReader {
            size_bytes,
            stream: ReaderStream::new(file).boxed(),
        })
    }

    async fn delete(&self, path: &str) -> BlobResult<bool> {
        let file_path = self.resolve(path)?;
        let removed = match fs::remove_file(&file_path).await {
            Ok(_) => {
                debug!("removed object file {}", file_path.display());
                true
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("object file {} already missing", file_path.display());
                false
            }
            Err(err) => return Err(BlobError::Io(err)),
        };

        if let Some(parent) = file_path.parent() {
            self.prune_empty_dirs(parent).await;
        }

        Ok(removed)
    }
}
