//! Meeting records: the container for one recording or document and its
//! normalized content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Where the meeting content came from.
#[derive(Serialize, Deserialize, sqlx::Type, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SourceKind {
    Audio,
    Pdf,
    Docx,
    Gdoc,
}

/// One unit of normalized content.
///
/// Audio transcripts carry a `minute`, documents carry a section `title`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentSegment {
    pub index: u32,
    pub minute: Option<u32>,
    pub title: Option<String>,
    pub content: String,
}

/// Source-independent representation of a meeting's content.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedContent {
    pub source_type: SourceKind,
    pub segments: Vec<ContentSegment>,
}

/// A stored meeting record.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    /// Server-assigned identifier.
    pub id: Uuid,

    /// Identity of the owning user, as issued by the auth provider.
    pub user_id: String,

    pub title: String,

    pub source_type: SourceKind,

    /// Original filename of the upload, if any.
    pub file_name: Option<String>,

    /// Retrieval locator of the uploaded binary object, if any.
    pub file_url: Option<String>,

    #[sqlx(json)]
    pub raw_content: UnifiedContent,

    /// Set once an analysis has been produced.
    pub analyzed: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating a meeting.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewMeeting {
    pub title: String,
    pub source_type: SourceKind,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    pub raw_content: UnifiedContent,
}

/// Partial update; `None` fields are left untouched.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct MeetingPatch {
    pub title: Option<String>,
    pub file_name: Option<String>,
    pub file_url: Option<String>,
    pub raw_content: Option<UnifiedContent>,
    pub analyzed: Option<bool>,
}

impl MeetingPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.file_name.is_none()
            && self.file_url.is_none()
            && self.raw_content.is_none()
            && self.analyzed.is_none()
    }
}
