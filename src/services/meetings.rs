//! Owner-scoped access to meetings and their analyses.
//!
//! Every operation takes the caller's `Session`. A record owned by someone
//! else is reported as not found so its existence is not leaked.

use crate::{
    auth::Session,
    models::{
        analysis::{Analysis, NewAnalysis},
        meeting::{Meeting, MeetingPatch, NewMeeting},
    },
    services::records::{RecordStore, StoreError},
    task_group::for_each_concurrent,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MeetingError {
    #[error("meeting `{0}` not found")]
    NotFound(Uuid),
    #[error("analysis `{0}` not found")]
    AnalysisNotFound(Uuid),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type MeetingResult<T> = Result<T, MeetingError>;

/// What a cascade delete removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeOutcome {
    /// `false` when the meeting row was already gone.
    pub meeting_removed: bool,
    pub analyses_deleted: usize,
}

/// Delete a meeting and every analysis that references it.
///
/// The meeting delete and the analysis cleanup run concurrently and both are
/// awaited before returning. Nothing is rolled back: if the cleanup fails the
/// meeting stays deleted and the error is returned so the caller can retry.
pub async fn cascade_delete_meeting(
    records: &dyn RecordStore,
    meeting_id: Uuid,
) -> Result<CascadeOutcome, StoreError> {
    let remove_meeting = records.delete_meeting(meeting_id);
    let remove_analyses = async {
        let analyses = records.list_analyses_by_meeting(meeting_id).await?;
        for_each_concurrent(analyses, |analysis| async move {
            records.delete_analysis(analysis.id).await.map(|_| ())
        })
        .await
    };

    let (meeting_res, analyses_res) = futures::join!(remove_meeting, remove_analyses);
    let meeting_removed = meeting_res?;
    let analyses_deleted = analyses_res?;

    Ok(CascadeOutcome {
        meeting_removed,
        analyses_deleted,
    })
}

#[derive(Clone)]
pub struct MeetingService {
    records: Arc<dyn RecordStore>,
}

impl MeetingService {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    /// Load a meeting the caller owns.
    async fn owned_meeting(&self, session: &Session, id: Uuid) -> MeetingResult<Meeting> {
        match self.records.get_meeting(id).await? {
            Some(meeting) if meeting.user_id == session.user_id => Ok(meeting),
            _ => Err(MeetingError::NotFound(id)),
        }
    }

    pub async fn create_meeting(
        &self,
        session: &Session,
        new: NewMeeting,
    ) -> MeetingResult<Meeting> {
        let now = Utc::now();
        let meeting = Meeting {
            id: Uuid::new_v4(),
            user_id: session.user_id.clone(),
            title: new.title,
            source_type: new.source_type,
            file_name: new.file_name,
            file_url: new.file_url,
            raw_content: new.raw_content,
            analyzed: false,
            created_at: now,
            updated_at: now,
        };
        self.records.insert_meeting(&meeting).await?;
        info!(user = %session.user_id, meeting = %meeting.id, "created meeting");
        Ok(meeting)
    }

    pub async fn get_meeting(&self, session: &Session, id: Uuid) -> MeetingResult<Meeting> {
        self.owned_meeting(session, id).await
    }

    /// The caller's meetings, newest first.
    pub async fn list_meetings(&self, session: &Session) -> MeetingResult<Vec<Meeting>> {
        Ok(self.records.list_meetings_by_user(&session.user_id).await?)
    }

    pub async fn update_meeting(
        &self,
        session: &Session,
        id: Uuid,
        patch: MeetingPatch,
    ) -> MeetingResult<Meeting> {
        self.owned_meeting(session, id).await?;
        self.records
            .update_meeting(id, &patch)
            .await
            .map_err(|err| match err {
                StoreError::MeetingNotFound(id) => MeetingError::NotFound(id),
                other => MeetingError::Store(other),
            })
    }

    /// Cascade-delete a meeting the caller owns.
    ///
    /// An already-deleted meeting is not an error; any analyses the caller
    /// still owns under that id are cleaned up, which lets a failed cascade
    /// be retried to completion.
    pub async fn delete_meeting(&self, session: &Session, id: Uuid) -> MeetingResult<CascadeOutcome> {
        match self.records.get_meeting(id).await? {
            Some(meeting) if meeting.user_id != session.user_id => Err(MeetingError::NotFound(id)),
            Some(_) => {
                let outcome = cascade_delete_meeting(self.records.as_ref(), id)
                    .await
                    .inspect_err(|err| warn!(meeting = %id, "cascade delete failed: {}", err))?;
                info!(
                    meeting = %id,
                    analyses = outcome.analyses_deleted,
                    "deleted meeting"
                );
                Ok(outcome)
            }
            None => {
                let records = self.records.as_ref();
                let leftovers: Vec<Analysis> = records
                    .list_analyses_by_meeting(id)
                    .await?
                    .into_iter()
                    .filter(|a| a.user_id == session.user_id)
                    .collect();
                let analyses_deleted = for_each_concurrent(leftovers, |analysis| async move {
                    records.delete_analysis(analysis.id).await.map(|_| ())
                })
                .await?;
                Ok(CascadeOutcome {
                    meeting_removed: false,
                    analyses_deleted,
                })
            }
        }
    }

    /// Record an analysis for a meeting the caller owns and mark the meeting
    /// as analyzed.
    pub async fn create_analysis(
        &self,
        session: &Session,
        meeting_id: Uuid,
        new: NewAnalysis,
    ) -> MeetingResult<Analysis> {
        self.owned_meeting(session, meeting_id).await?;

        let analysis = Analysis {
            id: Uuid::new_v4(),
            meeting_id,
            user_id: session.user_id.clone(),
            summary: new.summary,
            topics: new.topics,
            action_items: new.action_items,
            created_at: Utc::now(),
        };
        self.records.insert_analysis(&analysis).await?;

        let mark = MeetingPatch {
            analyzed: Some(true),
            ..Default::default()
        };
        self.records.update_meeting(meeting_id, &mark).await?;
        Ok(analysis)
    }

    /// First analysis recorded for the meeting, if any.
    pub async fn get_analysis_for_meeting(
        &self,
        session: &Session,
        meeting_id: Uuid,
    ) -> MeetingResult<Option<Analysis>> {
        let analyses = self.records.list_analyses_by_meeting(meeting_id).await?;
        Ok(analyses
            .into_iter()
            .find(|a| a.user_id == session.user_id))
    }

    /// Returns `false` when the analysis was already gone.
    pub async fn delete_analysis(&self, session: &Session, id: Uuid) -> MeetingResult<bool> {
        match self.records.get_analysis(id).await? {
            None => Ok(false),
            Some(analysis) if analysis.user_id != session.user_id => {
                Err(MeetingError::AnalysisNotFound(id))
            }
            Some(_) => Ok(self.records.delete_analysis(id).await?),
        }
    }
}
