//! Structured record store for meetings and analyses.
//!
//! `RecordStore` is the seam the rest of the service talks to; the shipped
//! implementation keeps rows in SQLite. Deletes are idempotent: removing an
//! id that is already gone succeeds and reports `false`.

use crate::models::{
    analysis::Analysis,
    meeting::{Meeting, MeetingPatch},
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, SqlitePool, sqlite::Sqlite, types::Json};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("meeting `{0}` not found")]
    MeetingNotFound(Uuid),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_meeting(&self, meeting: &Meeting) -> StoreResult<()>;

    async fn get_meeting(&self, id: Uuid) -> StoreResult<Option<Meeting>>;

    /// Meetings owned by `user_id`, newest first.
    async fn list_meetings_by_user(&self, user_id: &str) -> StoreResult<Vec<Meeting>>;

    /// Merge the provided fields and refresh `updated_at`.
    async fn update_meeting(&self, id: Uuid, patch: &MeetingPatch) -> StoreResult<Meeting>;

    async fn delete_meeting(&self, id: Uuid) -> StoreResult<bool>;

    async fn insert_analysis(&self, analysis: &Analysis) -> StoreResult<()>;

    async fn get_analysis(&self, id: Uuid) -> StoreResult<Option<Analysis>>;

    /// Analyses referencing `meeting_id`, oldest first.
    async fn list_analyses_by_meeting(&self, meeting_id: Uuid) -> StoreResult<Vec<Analysis>>;

    async fn list_analyses_by_user(&self, user_id: &str) -> StoreResult<Vec<Analysis>>;

    async fn delete_analysis(&self, id: Uuid) -> StoreResult<bool>;
}

const MEETING_COLUMNS: &str = "id, user_id, title, source_type, file_name, file_url, \
     raw_content, analyzed, created_at, updated_at";

const ANALYSIS_COLUMNS: &str =
    "id, meeting_id, user_id, summary, topics, action_items, created_at";

/// SQLite-backed `RecordStore`.
#[derive(Clone)]
pub struct SqliteRecordStore {
    pub db: Arc<SqlitePool>,
}

impl SqliteRecordStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert_meeting(&self, meeting: &Meeting) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO meetings (
                id, user_id, title, source_type, file_name, file_url,
                raw_content, analyzed, created_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(meeting.id)
        .bind(&meeting.user_id)
        .bind(&meeting.title)
        .bind(meeting.source_type)
        .bind(&meeting.file_name)
        .bind(&meeting.file_url)
        .bind(Json(&meeting.raw_content))
        .bind(meeting.analyzed)
        .bind(meeting.created_at)
        .bind(meeting.updated_at)
        .execute(&*self.db)
        .await?;
        Ok(())
    }

    async fn get_meeting(&self, id: Uuid) -> StoreResult<Option<Meeting>> {
        let sql = format!("SELECT {MEETING_COLUMNS} FROM meetings WHERE id = ?");
        let meeting = sqlx::query_as::<_, Meeting>(&sql)
            .bind(id)
            .fetch_optional(&*self.db)
            .await?;
        Ok(meeting)
    }

    async fn list_meetings_by_user(&self, user_id: &str) -> StoreResult<Vec<Meeting>> {
        let sql = format!(
            "SELECT {MEETING_COLUMNS} FROM meetings WHERE user_id = ? ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, Meeting>(&sql)
            .bind(user_id)
            .fetch_all(&*self.db)
            .await?;
        Ok(rows)
    }

    async fn update_meeting(&self, id: Uuid, patch: &MeetingPatch) -> StoreResult<Meeting> {
        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE meetings SET updated_at = ");
        builder.push_bind(Utc::now());

        if let Some(title) = &patch.title {
            builder.push(", title = ");
            builder.push_bind(title.clone());
        }
        if let Some(file_name) = &patch.file_name {
            builder.push(", file_name = ");
            builder.push_bind(file_name.clone());
        }
        if let Some(file_url) = &patch.file_url {
            builder.push(", file_url = ");
            builder.push_bind(file_url.clone());
        }
        if let Some(content) = &patch.raw_content {
            builder.push(", raw_content = ");
            builder.push_bind(Json(content.clone()));
        }
        if let Some(analyzed) = patch.analyzed {
            builder.push(", analyzed = ");
            builder.push_bind(analyzed);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {MEETING_COLUMNS}"));

        builder
            .build_query_as::<Meeting>()
            .fetch_optional(&*self.db)
            .await?
            .ok_or(StoreError::MeetingNotFound(id))
    }

    async fn delete_meeting(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM meetings WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            debug!("meeting {} already absent", id);
        }
        Ok(result.rows_affected() > 0)
    }

    async fn insert_analysis(&self, analysis: &Analysis) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO analysis (
                id, meeting_id, user_id, summary, topics, action_items, created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(analysis.id)
        .bind(analysis.meeting_id)
        .bind(&analysis.user_id)
        .bind(&analysis.summary)
        .bind(Json(&analysis.topics))
        .bind(Json(&analysis.action_items))
        .bind(analysis.created_at)
        .execute(&*self.db)
        .await?;
        Ok(())
    }

    async fn get_analysis(&self, id: Uuid) -> StoreResult<Option<Analysis>> {
        let sql = format!("SELECT {ANALYSIS_COLUMNS} FROM analysis WHERE id = ?");
        let analysis = sqlx::query_as::<_, Analysis>(&sql)
            .bind(id)
            .fetch_optional(&*self.db)
            .await?;
        Ok(analysis)
    }

    async fn list_analyses_by_meeting(&self, meeting_id: Uuid) -> StoreResult<Vec<Analysis>> {
        let sql = format!(
            "SELECT {ANALYSIS_COLUMNS} FROM analysis WHERE meeting_id = ? ORDER BY created_at ASC"
        );
        let rows = sqlx::query_as::<_, Analysis>(&sql)
            .bind(meeting_id)
            .fetch_all(&*self.db)
            .await?;
        Ok(rows)
    }

    async fn list_analyses_by_user(&self, user_id: &str) -> StoreResult<Vec<Analysis>> {
        let sql = format!("SELECT {ANALYSIS_COLUMNS} FROM analysis WHERE user_id = ?");
        let rows = sqlx::query_as::<_, Analysis>(&sql)
            .bind(user_id)
            .fetch_all(&*self.db)
            .await?;
        Ok(rows)
    }

    async fn delete_analysis(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM analysis WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            debug!("analysis {} already absent", id);
        }
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db,
        models::meeting::{ContentSegment, SourceKind, UnifiedContent},
    };
    use chrono::Duration;

    async fn store() -> SqliteRecordStore {
        let pool = db::connect_in_memory().await.unwrap();
        SqliteRecordStore::new(Arc::new(pool))
    }

    fn meeting(user_id: &str, minutes_ago: i64) -> Meeting {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        Meeting {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            title: format!("standup -{minutes_ago}m"),
            source_type: SourceKind::Audio,
            file_name: Some("standup.webm".into()),
            file_url: None,
            raw_content: UnifiedContent {
                source_type: SourceKind::Audio,
                segments: vec![ContentSegment {
                    index: 0,
                    minute: Some(0),
                    title: None,
                    content: "good morning".into(),
                }],
            },
            analyzed: false,
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn meetings_round_trip_with_json_content() {
        let store = store().await;
        let m = meeting("user-a", 0);
        store.insert_meeting(&m).await.unwrap();

        let loaded = store.get_meeting(m.id).await.unwrap().unwrap();
        assert_eq!(loaded.user_id, "user-a");
        assert_eq!(loaded.source_type, SourceKind::Audio);
        assert_eq!(loaded.raw_content, m.raw_content);
        assert!(!loaded.analyzed);
    }

    #[tokio::test]
    async fn list_by_user_is_newest_first_and_scoped() {
        let store = store().await;
        let older = meeting("user-a", 30);
        let newer = meeting("user-a", 5);
        let other = meeting("user-b", 1);
        for m in [&older, &newer, &other] {
            store.insert_meeting(m).await.unwrap();
        }

        let ids: Vec<Uuid> = store
            .list_meetings_by_user("user-a")
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn update_merges_fields_and_refreshes_timestamp() {
        let store = store().await;
        let m = meeting("user-a", 60);
        store.insert_meeting(&m).await.unwrap();

        let patch = MeetingPatch {
            title: Some("renamed".into()),
            analyzed: Some(true),
            ..Default::default()
        };
        let updated = store.update_meeting(m.id, &patch).await.unwrap();
        assert_eq!(updated.title, "renamed");
        assert!(updated.analyzed);
        assert_eq!(updated.file_name.as_deref(), Some("standup.webm"));
        assert!(updated.updated_at > m.updated_at);
    }

    #[tokio::test]
    async fn update_of_missing_meeting_is_not_found() {
        let store = store().await;
        let err = store
            .update_meeting(Uuid::new_v4(), &MeetingPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MeetingNotFound(_)));
    }

    #[tokio::test]
    async fn deletes_are_idempotent() {
        let store = store().await;
        let m = meeting("user-a", 0);
        store.insert_meeting(&m).await.unwrap();

        assert!(store.delete_meeting(m.id).await.unwrap());
        assert!(!store.delete_meeting(m.id).await.unwrap());
        assert!(!store.delete_analysis(Uuid::new_v4()).await.unwrap());
        assert!(store.get_meeting(m.id).await.unwrap().is_none());
    }
}
