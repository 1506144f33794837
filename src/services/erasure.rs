//! Account erasure: remove every record and object a user owns.
//!
//! Phases run in order (meetings, analyses, audio objects, document
//! objects). Within a phase all deletes are issued together and joined; the
//! first failure aborts the remaining phases. Completed phases are not
//! rolled back, and every step is idempotent, so a failed erasure can simply
//! be run again.

use crate::{
    auth::{UserIdError, validate_user_id},
    models::upload::UploadCategory,
    services::{
        blobs::{BlobError, BlobStore},
        records::{RecordStore, StoreError},
    },
    task_group::for_each_concurrent,
};
use serde::Serialize;
use std::{fmt, sync::Arc};
use thiserror::Error;
use tracing::{error, info};

/// The step of an erasure that was running when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErasurePhase {
    Meetings,
    Analyses,
    AudioObjects,
    DocumentObjects,
}

impl fmt::Display for ErasurePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErasurePhase::Meetings => "meetings",
            ErasurePhase::Analyses => "analyses",
            ErasurePhase::AudioObjects => "audio objects",
            ErasurePhase::DocumentObjects => "document objects",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ErasureError {
    #[error(transparent)]
    InvalidUserId(#[from] UserIdError),
    #[error("erasing {phase} failed: {source}")]
    Records {
        phase: ErasurePhase,
        #[source]
        source: StoreError,
    },
    #[error("erasing {phase} failed: {source}")]
    Objects {
        phase: ErasurePhase,
        #[source]
        source: BlobError,
    },
}

impl ErasureError {
    pub fn phase(&self) -> Option<ErasurePhase> {
        match self {
            ErasureError::InvalidUserId(_) => None,
            ErasureError::Records { phase, .. } | ErasureError::Objects { phase, .. } => {
                Some(*phase)
            }
        }
    }
}

/// Delete counts per phase of a successful erasure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErasureReport {
    pub meetings_deleted: usize,
    pub analyses_deleted: usize,
    pub audio_objects_deleted: usize,
    pub document_objects_deleted: usize,
}

impl ErasureReport {
    pub fn total(&self) -> usize {
        self.meetings_deleted
            + self.analyses_deleted
            + self.audio_objects_deleted
            + self.document_objects_deleted
    }
}

#[derive(Clone)]
pub struct ErasureService {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
}

impl ErasureService {
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { records, blobs }
    }

    pub async fn erase_user(&self, user_id: &str) -> Result<ErasureReport, ErasureError> {
        validate_user_id(user_id)?;

        let report = self
            .run_phases(user_id)
            .await
            .inspect_err(|err| error!(user = %user_id, "erasure failed: {}", err))?;

        info!(
            user = %user_id,
            meetings = report.meetings_deleted,
            analyses = report.analyses_deleted,
            audio = report.audio_objects_deleted,
            documents = report.document_objects_deleted,
            "all user data deleted"
        );
        Ok(report)
    }

    async fn run_phases(&self, user_id: &str) -> Result<ErasureReport, ErasureError> {
        let records = self.records.as_ref();

        let meetings_deleted = async {
            let meetings = records.list_meetings_by_user(user_id).await?;
            for_each_concurrent(meetings, |meeting| async move {
                records.delete_meeting(meeting.id).await.map(|_| ())
            })
            .await
        }
        .await
        .map_err(|source| ErasureError::Records {
            phase: ErasurePhase::Meetings,
            source,
        })?;

        let analyses_deleted = async {
            let analyses = records.list_analyses_by_user(user_id).await?;
            for_each_concurrent(analyses, |analysis| async move {
                records.delete_analysis(analysis.id).await.map(|_| ())
            })
            .await
        }
        .await
        .map_err(|source| ErasureError::Records {
            phase: ErasurePhase::Analyses,
            source,
        })?;

        let audio_objects_deleted = self
            .erase_prefix(UploadCategory::Audio, user_id)
            .await
            .map_err(|source| ErasureError::Objects {
                phase: ErasurePhase::AudioObjects,
                source,
            })?;

        let document_objects_deleted = self
            .erase_prefix(UploadCategory::Document, user_id)
            .await
            .map_err(|source| ErasureError::Objects {
                phase: ErasurePhase::DocumentObjects,
                source,
            })?;

        Ok(ErasureReport {
            meetings_deleted,
            analyses_deleted,
            audio_objects_deleted,
            document_objects_deleted,
        })
    }

    /// Delete everything under the user's prefix for `category`.
    ///
    /// A prefix that was never written to counts as zero objects.
    async fn erase_prefix(&self, category: UploadCategory, user_id: &str) -> Result<usize, BlobError> {
        let prefix = category.user_prefix(user_id);
        let paths = match self.blobs.list_prefix(&prefix).await {
            Ok(paths) => paths,
            Err(BlobError::PrefixNotFound(_)) => {
                info!("No {} objects to delete under {}", category.root_dir(), prefix);
                return Ok(0);
            }
            Err(err) => return Err(err),
        };

        let blobs = self.blobs.as_ref();
        for_each_concurrent(paths, |path| async move {
            blobs.delete(&path).await.map(|_| ())
        })
        .await
    }
}
