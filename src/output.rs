//! Result types returned by the conversion entry points.

use crate::error::{Office2MdError, PipelineError};
use crate::kind::FileKind;
use crate::pipeline::extract::{CanonicalPayload, Extraction};
use crate::pipeline::input::SourceFile;
use crate::tracker::{FileSession, SessionStatus};
use serde::Serialize;

/// One converted file, from [`crate::convert::convert_bytes`] and friends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutput {
    pub name: String,
    pub kind: FileKind,
    pub markdown: String,
    pub duration_ms: u64,
}

/// Every session of a batch once all of them are terminal.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutput {
    /// Sessions in ingestion order.
    pub sessions: Vec<FileSession>,
    pub stats: BatchStats,
}

impl BatchOutput {
    pub fn completed(&self) -> impl Iterator<Item = &FileSession> {
        self.sessions
            .iter()
            .filter(|s| matches!(s.status, SessionStatus::Completed { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileSession> {
        self.sessions
            .iter()
            .filter(|s| matches!(s.status, SessionStatus::Failed { .. }))
    }

    /// `Err(PartialFailure)` when any file failed.
    pub fn into_result(self) -> Result<Self, Office2MdError> {
        if self.stats.failed > 0 {
            Err(Office2MdError::PartialFailure {
                failed: self.stats.failed,
                total: self.stats.total_files,
            })
        } else {
            Ok(self)
        }
    }
}

/// Aggregate counts for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub total_files: usize,
    pub completed: usize,
    pub failed: usize,
    /// Sessions deleted before they finished (never counted as completed or failed).
    pub discarded: usize,
    pub total_markdown_bytes: usize,
    pub duration_ms: u64,
}

impl BatchStats {
    pub(crate) fn from_sessions(total_files: usize, sessions: &[FileSession], duration_ms: u64) -> Self {
        let mut stats = BatchStats {
            total_files,
            duration_ms,
            ..Default::default()
        };
        for s in sessions {
            match &s.status {
                SessionStatus::Completed { markdown } => {
                    stats.completed += 1;
                    stats.total_markdown_bytes += markdown.len();
                }
                SessionStatus::Failed { .. } => stats.failed += 1,
                _ => {}
            }
        }
        stats.discarded = total_files.saturating_sub(stats.completed + stats.failed);
        stats
    }
}

/// One file's result from [`crate::stream::convert_stream`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub name: String,
    pub kind: FileKind,
    pub result: Result<String, PipelineError>,
}

/// An input that never reached the pipeline, or a file the extractor rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    /// The input as given (path, URL) or the file name.
    pub name: String,
    pub reason: String,
}

impl FileFailure {
    pub fn new(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result of [`crate::convert::load_inputs`]: what could be read, and what could not.
#[derive(Debug, Default)]
pub struct LoadedInputs {
    /// Files in input order (directories expanded in name order).
    pub files: Vec<SourceFile>,
    pub failures: Vec<FileFailure>,
}

/// What the extractor makes of a file, without calling any service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inspection {
    pub name: String,
    pub kind: FileKind,
    pub size_bytes: usize,
    pub extraction: Extraction,
}

impl Inspection {
    /// `"binary"`, `"text"` or `"empty"`.
    pub fn shape(&self) -> &'static str {
        match &self.extraction {
            Extraction::Payload(CanonicalPayload::Binary { .. }) => "binary",
            Extraction::Payload(CanonicalPayload::Text { .. }) => "text",
            Extraction::Empty(_) => "empty",
        }
    }

    /// Extracted text, or the empty-content note. `None` for binary payloads.
    pub fn text(&self) -> Option<&str> {
        match &self.extraction {
            Extraction::Payload(CanonicalPayload::Text { text }) => Some(text),
            Extraction::Payload(CanonicalPayload::Binary { .. }) => None,
            Extraction::Empty(empty) => Some(empty.note()),
        }
    }
}
