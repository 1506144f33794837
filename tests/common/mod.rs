#![allow(dead_code)]
//! Shared fixtures: an in-memory record store, a temp-dir object store, and
//! wrappers that count calls and inject failures.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, stream};
use minutify_store::{
    db,
    models::{
        analysis::{ActionItem, Analysis, NewAnalysis, Priority, Topic},
        meeting::{ContentSegment, Meeting, MeetingPatch, NewMeeting, SourceKind, UnifiedContent},
    },
    services::{
        blobs::{BlobError, BlobReader, BlobResult, BlobStore, ByteStream, LocalBlobStore, PutOutcome},
        records::{RecordStore, SqliteRecordStore, StoreError, StoreResult},
    },
};
use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};
use tempfile::TempDir;
use uuid::Uuid;

pub fn injected() -> StoreError {
    StoreError::Sqlx(sqlx::Error::Protocol("injected failure".into()))
}

/// Record store wrapper that counts deletes and can fail selected calls.
pub struct CountingRecords {
    pub inner: SqliteRecordStore,
    pub meeting_deletes: AtomicUsize,
    pub analysis_deletes: AtomicUsize,
    pub fail_list_analyses_by_meeting: AtomicBool,
    pub fail_delete_analysis: AtomicBool,
}

impl CountingRecords {
    pub fn deletes(&self) -> usize {
        self.meeting_deletes.load(Ordering::SeqCst) + self.analysis_deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for CountingRecords {
    async fn insert_meeting(&self, meeting: &Meeting) -> StoreResult<()> {
        self.inner.insert_meeting(meeting).await
    }

    async fn get_meeting(&self, id: Uuid) -> StoreResult<Option<Meeting>> {
        self.inner.get_meeting(id).await
    }

    async fn list_meetings_by_user(&self, user_id: &str) -> StoreResult<Vec<Meeting>> {
        self.inner.list_meetings_by_user(user_id).await
    }

    async fn update_meeting(&self, id: Uuid, patch: &MeetingPatch) -> StoreResult<Meeting> {
        self.inner.update_meeting(id, patch).await
    }

    async fn delete_meeting(&self, id: Uuid) -> StoreResult<bool> {
        self.meeting_deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_meeting(id).await
    }

    async fn insert_analysis(&self, analysis: &Analysis) -> StoreResult<()> {
        self.inner.insert_analysis(analysis).await
    }

    async fn get_analysis(&self, id: Uuid) -> StoreResult<Option<Analysis>> {
        self.inner.get_analysis(id).await
    }

    async fn list_analyses_by_meeting(&self, meeting_id: Uuid) -> StoreResult<Vec<Analysis>> {
        if self.fail_list_analyses_by_meeting.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.list_analyses_by_meeting(meeting_id).await
    }

    async fn list_analyses_by_user(&self, user_id: &str) -> StoreResult<Vec<Analysis>> {
        self.inner.list_analyses_by_user(user_id).await
    }

    async fn delete_analysis(&self, id: Uuid) -> StoreResult<bool> {
        self.analysis_deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete_analysis.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.delete_analysis(id).await
    }
}

/// Object store wrapper that counts puts and deletes and can fail listing.
pub struct CountingBlobs {
    pub inner: LocalBlobStore,
    pub puts: AtomicUsize,
    pub deletes: AtomicUsize,
    pub fail_list: AtomicBool,
}

#[async_trait]
impl BlobStore for CountingBlobs {
    async fn put(&self, path: &str, stream: ByteStream<'_>) -> BlobResult<PutOutcome> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(path, stream).await
    }

    fn locator(&self, path: &str) -> String {
        self.inner.locator(path)
    }

    async fn list_prefix(&self, prefix: &str) -> BlobResult<Vec<String>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(BlobError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "injected failure",
            )));
        }
        self.inner.list_prefix(prefix).await
    }

    async fn open(&self, path: &str) -> BlobResult<BlobReader> {
        self.inner.open(path).await
    }

    async fn delete(&self, path: &str) -> BlobResult<bool> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(path).await
    }
}

pub struct Fixture {
    pub records: Arc<CountingRecords>,
    pub blobs: Arc<CountingBlobs>,
    pub dir: TempDir,
}

pub async fn fixture() -> Fixture {
    let pool = db::connect_in_memory().await.expect("in-memory sqlite");
    let dir = tempfile::tempdir().expect("temp dir");
    let records = Arc::new(CountingRecords {
        inner: SqliteRecordStore::new(Arc::new(pool)),
        meeting_deletes: AtomicUsize::new(0),
        analysis_deletes: AtomicUsize::new(0),
        fail_list_analyses_by_meeting: AtomicBool::new(false),
        fail_delete_analysis: AtomicBool::new(false),
    });
    let blobs = Arc::new(CountingBlobs {
        inner: LocalBlobStore::new(dir.path(), "http://localhost:3000"),
        puts: AtomicUsize::new(0),
        deletes: AtomicUsize::new(0),
        fail_list: AtomicBool::new(false),
    });
    Fixture {
        records,
        blobs,
        dir,
    }
}

pub fn new_meeting(title: &str) -> NewMeeting {
    NewMeeting {
        title: title.to_string(),
        source_type: SourceKind::Pdf,
        file_name: Some(format!("{title}.pdf")),
        file_url: None,
        raw_content: UnifiedContent {
            source_type: SourceKind::Pdf,
            segments: vec![
                ContentSegment {
                    index: 0,
                    minute: None,
                    title: Some("AGENDA".into()),
                    content: "budget review".into(),
                },
                ContentSegment {
                    index: 1,
                    minute: None,
                    title: Some("DECISIONS".into()),
                    content: "ship in march".into(),
                },
            ],
        },
    }
}

pub fn new_analysis(summary: &str) -> NewAnalysis {
    NewAnalysis {
        summary: summary.to_string(),
        topics: vec![Topic {
            title: "Budget".into(),
            start_index: 0,
            end_index: 1,
            explanation: "spend for next quarter".into(),
        }],
        action_items: vec![ActionItem {
            description: "send revised numbers".into(),
            context: "budget review".into(),
            segment_index: 0,
            priority: Some(Priority::High),
        }],
    }
}

/// A payload stream made of the given chunks.
pub fn chunks(parts: Vec<Vec<u8>>) -> ByteStream<'static> {
    stream::iter(parts.into_iter().map(|p| Ok(Bytes::from(p)))).boxed()
}
