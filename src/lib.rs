//! # edgequake-office2md
//!
//! Convert office documents to Markdown with a generative model.
//!
//! PDF, Word, Excel, PowerPoint, CSV and plain-text files each get a reader
//! that turns them into one of two canonical payloads (base64 binary the model
//! reads natively, or extracted text), then a single model call per file turns
//! that payload into clean Markdown.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file
//!  │
//!  ├─ 1. Ingest   one session per file, kind decided from the extension
//!  ├─ 2. Extract  pdf → base64 │ docx/xlsx/pptx → text │ csv/txt/md/json → text
//!  │              (empty Office files stop here with a fixed note)
//!  ├─ 3. Convert  one request: rules + filename + payload
//!  └─ 4. Record   Completed { markdown } or Failed { reason } on the session
//! ```
//!
//! Every file runs on its own task from the moment it is ingested. A failure
//! stays with its session and never touches the others.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_office2md::{convert_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / ANTHROPIC_API_KEY
//!     let config = ConversionConfig::default();
//!     let output = convert_file("quarterly.pptx", &config).await?;
//!     println!("{}", output.markdown);
//!     Ok(())
//! }
//! ```
//!
//! ## Sessions
//!
//! [`SessionTracker`] is the interactive surface: ingest files, poll
//! [`SessionTracker::sessions`], select or delete sessions while conversions
//! are still running. A result that arrives for a deleted session is dropped.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `office2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-office2md = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod kind;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod stream;
pub mod tracker;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{
    convert_batch, convert_bytes, convert_file, convert_sync, convert_to_file, inspect,
    inspect_source, load_inputs,
};
pub use error::{Office2MdError, PipelineError};
pub use kind::FileKind;
pub use output::{
    BatchOutput, BatchStats, FileFailure, FileOutcome, FileOutput, Inspection, LoadedInputs,
};
pub use pipeline::extract::{CanonicalPayload, EmptyContent, Extraction};
pub use pipeline::input::SourceFile;
pub use pipeline::llm::{
    ConversionClient, ConversionRequest, GenerativeBackend, LlmBackend, RequestContent,
    ServiceError,
};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{convert_stream, OutcomeStream};
pub use tracker::{FileSession, IngestBatch, SessionId, SessionStatus, SessionTracker};
