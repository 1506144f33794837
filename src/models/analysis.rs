//! AI analysis records derived from exactly one meeting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A topic spanning a range of the parent meeting's segments.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub title: String,
    pub start_index: u32,
    pub end_index: u32,
    pub explanation: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// A follow-up extracted from the meeting content.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub description: String,
    pub context: String,
    /// Index of the segment the item was extracted from.
    pub segment_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

/// A stored analysis record.
///
/// `meeting_id` is a plain reference; the meeting does not own the analysis
/// row, but deleting the meeting removes it (see `MeetingService`).
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub id: Uuid,
    pub meeting_id: Uuid,
    pub user_id: String,
    pub summary: String,
    #[sqlx(json)]
    pub topics: Vec<Topic>,
    #[sqlx(json)]
    pub action_items: Vec<ActionItem>,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when recording an analysis.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewAnalysis {
    pub summary: String,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub action_items: Vec<ActionItem>,
}
