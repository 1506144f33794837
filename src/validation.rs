//! Pre-upload file checks.
//!
//! A file is rejected when it is larger than the rule's limit or when its
//! extension is not in the accepted list. Size is checked first.

use crate::models::upload::UploadCategory;
use serde::Deserialize;
use thiserror::Error;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

const AUDIO_EXTENSIONS: [&str; 5] = ["mp3", "wav", "m4a", "webm", "ogg"];
const DOCUMENT_EXTENSIONS: [&str; 2] = ["pdf", "docx"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File size must be less than {max_mb}MB")]
    TooLarge { max_mb: u64 },
    #[error("Please upload a valid {label}")]
    UnsupportedType { label: &'static str },
}

/// The kinds of file the upload surface accepts.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Audio,
    Pdf,
    Docx,
}

impl FileKind {
    pub fn label(self) -> &'static str {
        match self {
            FileKind::Audio => "Audio File",
            FileKind::Pdf => "PDF Document",
            FileKind::Docx => "Word Document",
        }
    }

    pub fn category(self) -> UploadCategory {
        match self {
            FileKind::Audio => UploadCategory::Audio,
            FileKind::Pdf | FileKind::Docx => UploadCategory::Document,
        }
    }

    pub fn rules(self) -> FileRules {
        match self {
            FileKind::Audio => FileRules::new(self, ".mp3,.wav,.m4a,.webm,.ogg", 100),
            FileKind::Pdf => FileRules::new(self, ".pdf", 50),
            FileKind::Docx => FileRules::new(self, ".docx", 50),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileRules {
    pub kind: FileKind,
    /// Dot-prefixed, lowercase extensions.
    pub accepted: Vec<String>,
    pub max_size_mb: u64,
}

impl FileRules {
    /// `accepted` is a comma-separated list such as `".pdf, .docx"`.
    pub fn new(kind: FileKind, accepted: &str, max_size_mb: u64) -> Self {
        Self {
            kind,
            accepted: accepted
                .split(',')
                .map(|t| t.trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            max_size_mb,
        }
    }

    pub fn validate(&self, file_name: &str, size_bytes: u64) -> Result<(), ValidationError> {
        let size_mb = size_bytes as f64 / BYTES_PER_MB;
        if size_mb > self.max_size_mb as f64 {
            return Err(ValidationError::TooLarge {
                max_mb: self.max_size_mb,
            });
        }

        let extension = format!(".{}", file_extension(file_name));
        if !self.accepted.iter().any(|a| *a == extension) {
            return Err(ValidationError::UnsupportedType {
                label: self.kind.label(),
            });
        }

        Ok(())
    }
}

/// Lowercased text after the last `.`; the whole name when there is none.
pub fn file_extension(file_name: &str) -> String {
    file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

pub fn is_valid_audio_file(file_name: &str) -> bool {
    AUDIO_EXTENSIONS.contains(&file_extension(file_name).as_str())
}

pub fn is_valid_document_file(file_name: &str) -> bool {
    DOCUMENT_EXTENSIONS.contains(&file_extension(file_name).as_str())
}

/// PDFs and Word documents go under `documents/`, everything else is audio.
pub fn category_for(file_name: &str) -> UploadCategory {
    if is_valid_document_file(file_name) {
        UploadCategory::Document
    } else {
        UploadCategory::Audio
    }
}
