//! Core data models for meeting and analysis records and binary uploads.
//!
//! Records map to SQLite rows via `sqlx::FromRow` (structured sub-documents
//! are stored as JSON columns) and serialize as camelCase JSON via `serde`.

pub mod analysis;
pub mod meeting;
pub mod upload;
