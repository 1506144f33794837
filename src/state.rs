//! Shared router state.

use crate::services::{
    blobs::{BlobStore, LocalBlobStore},
    erasure::ErasureService,
    meetings::MeetingService,
    records::{RecordStore, SqliteRecordStore},
};
use sqlx::SqlitePool;
use std::{path::PathBuf, sync::Arc};

#[derive(Clone)]
pub struct AppState {
    /// Used directly only by the readiness probe.
    pub db: Arc<SqlitePool>,
    pub storage_dir: PathBuf,
    pub blobs: Arc<dyn BlobStore>,
    pub meetings: MeetingService,
    pub erasure: ErasureService,
}

impl AppState {
    pub fn new(db: Arc<SqlitePool>, storage_dir: PathBuf, public_base_url: String) -> Self {
        let records: Arc<dyn RecordStore> = Arc::new(SqliteRecordStore::new(db.clone()));
        let blobs: Arc<dyn BlobStore> =
            Arc::new(LocalBlobStore::new(storage_dir.clone(), public_base_url));
        Self {
            db,
            storage_dir,
            meetings: MeetingService::new(records.clone()),
            erasure: ErasureService::new(records, blobs.clone()),
            blobs,
        }
    }
}
