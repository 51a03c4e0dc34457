//! Progress-callback trait for per-file conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the session tracker moves each file through the pipeline.
//!
//! Callers can forward events to a channel, a WebSocket, a database record or
//! a terminal progress bar without the library knowing how the host
//! application communicates.
//!
//! # Example
//!
//! ```rust
//! use edgequake_office2md::{ConversionConfig, ConversionProgressCallback, SessionId};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, _id: SessionId, name: &str, markdown_len: usize) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{done}: {name} ({markdown_len} bytes)");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::tracker::{SessionId, SessionStatus};
use std::sync::Arc;

/// Called by the session tracker as files move through the pipeline.
///
/// Every file runs on its own task, so methods may be called concurrently
/// from different threads. All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once per ingested batch, before any file starts.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called after every recorded status change, terminal ones included.
    fn on_status_change(&self, id: SessionId, name: &str, status: &SessionStatus) {
        let _ = (id, name, status);
    }

    /// Called when a file completes.
    ///
    /// # Arguments
    /// * `markdown_len`: byte length of the produced Markdown
    fn on_file_complete(&self, id: SessionId, name: &str, markdown_len: usize) {
        let _ = (id, name, markdown_len);
    }

    /// Called when a file fails.
    fn on_file_error(&self, id: SessionId, name: &str, error: &str) {
        let _ = (id, name, error);
    }

    /// Called by [`crate::convert::convert_batch`] once every file is terminal.
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
