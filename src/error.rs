//! Error types for the edgequake-office2md library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Office2MdError`]: **Fatal**: the call cannot proceed at all (input
//!   not found, download failed, provider not configured, bad config).
//!   Returned as `Err(Office2MdError)` from the top-level `convert*`
//!   functions.
//!
//! * [`PipelineError`]: **Per-file**: one document could not be extracted or
//!   converted, but every other document in the batch is unaffected. The
//!   session tracker stores its message in
//!   [`crate::tracker::SessionStatus::Failed`] instead of propagating it.
//!
//! Keeping them apart lets a batch of fifty files report forty-nine results
//! and one failure, rather than losing the whole batch to one corrupt archive.

use crate::kind::FileKind;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-office2md library.
///
/// Per-file failures use [`PipelineError`] and are recorded on the session
/// rather than propagated here.
#[derive(Debug, Error)]
pub enum Office2MdError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a usable file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Pipeline errors ───────────────────────────────────────────────────
    /// A single-file conversion failed.
    ///
    /// Only returned by the single-file entry points
    /// ([`crate::convert::convert_bytes`] and friends); batch conversion
    /// records the failure on the session instead.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Some files in a batch failed. Only returned by
    /// [`crate::output::BatchOutput::into_result`].
    #[error("{failed} of {total} file(s) failed to convert")]
    PartialFailure { failed: usize, total: usize },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single file's pipeline run.
///
/// The display string is what ends up in a failed session's reason, so the
/// messages are written for the person looking at the file list.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PipelineError {
    /// The file's extension has no extraction rule.
    #[error("Unsupported file type: .{extension}")]
    UnsupportedFormat { extension: String },

    /// The format reader rejected the file (corrupt archive, malformed XML,
    /// unreadable workbook). Displays the reader's own message.
    #[error("{detail}")]
    ExtractionFailure { kind: FileKind, detail: String },

    /// The generative service call failed (network, auth, quota, bad response).
    #[error("{message}")]
    ConversionFailure { message: String },
}

impl PipelineError {
    pub(crate) fn extraction(kind: FileKind, detail: impl std::fmt::Display) -> Self {
        PipelineError::ExtractionFailure {
            kind,
            detail: detail.to_string(),
        }
    }
}
