//! Per-file session tracking.
//!
//! Every ingested file becomes a [`FileSession`] with its own status and its
//! own pipeline task, started the moment the file is ingested. Files never
//! wait for each other and never share extraction state; one corrupt archive
//! fails exactly one session.
//!
//! ## Lifecycle
//!
//! ```text
//! Queued ──▶ Extracting ──▶ Converting ──▶ Completed
//!                 │  │            │
//!                 │  └──▶ Completed (empty-content note, no service call)
//!                 └─────────────▶ Failed ◀───┘
//! ```
//!
//! Terminal states have no outgoing transitions. The session list is the only
//! shared mutable state; every update is one locked read-check-write, so a
//! result arriving for a deleted session is simply dropped.

use crate::config::ConversionConfig;
use crate::convert::resolve_client;
use crate::error::Office2MdError;
use crate::kind::FileKind;
use crate::pipeline::extract::{extract_blocking, Extraction};
use crate::pipeline::input::SourceFile;
use crate::pipeline::llm::ConversionClient;
use crate::progress::ProgressCallback;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Stable identifier of a session, generated at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Where a file is in the pipeline.
///
/// The Markdown result and the failure reason live inside the terminal
/// variants, so a session can never carry both, or either one early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SessionStatus {
    Queued,
    Extracting,
    Converting,
    Completed { markdown: String },
    Failed { reason: String },
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed { .. } | SessionStatus::Failed { .. }
        )
    }

    /// Lowercase name of the state, as shown in listings and JSON.
    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Queued => "queued",
            SessionStatus::Extracting => "extracting",
            SessionStatus::Converting => "converting",
            SessionStatus::Completed { .. } => "completed",
            SessionStatus::Failed { .. } => "failed",
        }
    }

    /// The Markdown of a completed session.
    pub fn markdown(&self) -> Option<&str> {
        match self {
            SessionStatus::Completed { markdown } => Some(markdown),
            _ => None,
        }
    }

    /// The reason of a failed session.
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            SessionStatus::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: &SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, next),
            (Queued, Extracting)
                | (Extracting, Converting)
                | (Extracting, Completed { .. })
                | (Extracting, Failed { .. })
                | (Converting, Completed { .. })
                | (Converting, Failed { .. })
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One ingested file and its pipeline status.
#[derive(Debug, Clone, Serialize)]
pub struct FileSession {
    pub id: SessionId,
    pub name: String,
    /// Decided once at ingestion from the extension.
    pub kind: FileKind,
    #[serde(flatten)]
    pub status: SessionStatus,
    #[serde(skip)]
    source: Arc<SourceFile>,
}

impl FileSession {
    fn new(source: SourceFile) -> Self {
        Self {
            id: SessionId::new(),
            name: source.name.clone(),
            kind: source.kind(),
            status: SessionStatus::Queued,
            source: Arc::new(source),
        }
    }

    /// The raw file this session was created from.
    pub fn source(&self) -> &Arc<SourceFile> {
        &self.source
    }

    pub fn size(&self) -> usize {
        self.source.len()
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    sessions: Vec<FileSession>,
    selected: Option<SessionId>,
}

impl TrackerState {
    fn find_mut(&mut self, id: SessionId) -> Option<&mut FileSession> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }
}

/// Owns every session and drives each one through the pipeline.
///
/// Cheap to clone: clones share the same session list.
#[derive(Clone)]
pub struct SessionTracker {
    state: Arc<Mutex<TrackerState>>,
    client: ConversionClient,
    progress: Option<ProgressCallback>,
}

impl SessionTracker {
    pub fn new(client: ConversionClient) -> Self {
        Self {
            state: Arc::new(Mutex::new(TrackerState::default())),
            client,
            progress: None,
        }
    }

    /// A tracker whose client and progress callback come from `config`.
    pub fn from_config(config: &ConversionConfig) -> Result<Self, Office2MdError> {
        let tracker = Self::new(resolve_client(config)?);
        Ok(match &config.progress_callback {
            Some(cb) => tracker.with_progress(Arc::clone(cb)),
            None => tracker,
        })
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Create one queued session per file and start every pipeline run.
    ///
    /// Must be called from within a tokio runtime. If nothing is selected,
    /// the first new session becomes the selection.
    pub fn ingest(&self, files: Vec<SourceFile>) -> IngestBatch {
        let new_sessions: Vec<FileSession> = files.into_iter().map(FileSession::new).collect();
        let runs: Vec<(SessionId, Arc<SourceFile>, FileKind)> = new_sessions
            .iter()
            .map(|s| (s.id, Arc::clone(&s.source), s.kind))
            .collect();

        {
            let mut state = self.state.lock();
            if state.selected.is_none() {
                state.selected = new_sessions.first().map(|s| s.id);
            }
            state.sessions.extend(new_sessions);
        }

        info!("Ingested {} file(s)", runs.len());
        if let Some(cb) = &self.progress {
            cb.on_batch_start(runs.len());
        }

        let mut ids = Vec::with_capacity(runs.len());
        let mut handles = Vec::with_capacity(runs.len());
        for (id, source, kind) in runs {
            ids.push(id);
            handles.push(tokio::spawn(run_session(self.clone(), id, source, kind)));
        }
        IngestBatch { ids, handles }
    }

    /// Make `id` the selected session. Returns `false` for an unknown id.
    pub fn select(&self, id: SessionId) -> bool {
        let mut state = self.state.lock();
        if state.sessions.iter().any(|s| s.id == id) {
            state.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn selected(&self) -> Option<SessionId> {
        self.state.lock().selected
    }

    pub fn selected_session(&self) -> Option<FileSession> {
        let state = self.state.lock();
        let id = state.selected?;
        state.sessions.iter().find(|s| s.id == id).cloned()
    }

    /// Remove a session permanently. Its run, if still going, finishes but
    /// the result is dropped. Returns `false` for an unknown id.
    pub fn delete(&self, id: SessionId) -> bool {
        let mut state = self.state.lock();
        let before = state.sessions.len();
        state.sessions.retain(|s| s.id != id);
        let removed = state.sessions.len() != before;
        if removed && state.selected == Some(id) {
            state.selected = None;
        }
        if removed {
            debug!("Deleted session {}", id);
        }
        removed
    }

    /// Remove every session and clear the selection.
    pub fn clear_all(&self) {
        let mut state = self.state.lock();
        state.sessions.clear();
        state.selected = None;
    }

    /// Snapshot of every session in ingestion order.
    pub fn sessions(&self) -> Vec<FileSession> {
        self.state.lock().sessions.clone()
    }

    pub fn session(&self, id: SessionId) -> Option<FileSession> {
        self.state.lock().sessions.iter().find(|s| s.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().sessions.is_empty()
    }

    /// Record a status change for `id`.
    ///
    /// Returns `false`, leaving everything untouched, when the session no
    /// longer exists or the lifecycle forbids the move.
    fn transition(&self, id: SessionId, next: SessionStatus) -> bool {
        let name = {
            let mut state = self.state.lock();
            let Some(session) = state.find_mut(id) else {
                debug!("Session {} is gone; dropping '{}' update", id, next);
                return false;
            };
            if !session.status.can_transition_to(&next) {
                warn!(
                    "Session {} ({}): rejected transition {} → {}",
                    id, session.name, session.status, next
                );
                return false;
            }
            session.status = next.clone();
            session.name.clone()
        };

        debug!("Session {} ({}): {}", id, name, next);
        if let Some(cb) = &self.progress {
            cb.on_status_change(id, &name, &next);
            match &next {
                SessionStatus::Completed { markdown } => cb.on_file_complete(id, &name, markdown.len()),
                SessionStatus::Failed { reason } => cb.on_file_error(id, &name, reason),
                _ => {}
            }
        }
        true
    }

    fn complete(&self, id: SessionId, markdown: String) {
        self.transition(id, SessionStatus::Completed { markdown });
    }

    fn fail(&self, id: SessionId, reason: String) {
        self.transition(id, SessionStatus::Failed { reason });
    }
}

impl fmt::Debug for SessionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SessionTracker")
            .field("sessions", &state.sessions.len())
            .field("selected", &state.selected)
            .field("client", &self.client)
            .finish()
    }
}

/// The sessions created by one [`SessionTracker::ingest`] call.
#[derive(Debug)]
pub struct IngestBatch {
    ids: Vec<SessionId>,
    handles: Vec<JoinHandle<()>>,
}

impl IngestBatch {
    /// New session ids, in the order the files were given.
    pub fn ids(&self) -> &[SessionId] {
        &self.ids
    }

    /// Wait for every run in the batch to finish.
    pub async fn wait(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!("Pipeline task ended abnormally: {}", e);
            }
        }
    }
}

/// One file's pipeline run.
async fn run_session(
    tracker: SessionTracker,
    id: SessionId,
    source: Arc<SourceFile>,
    kind: FileKind,
) {
    if !tracker.transition(id, SessionStatus::Extracting) {
        return;
    }

    let name = source.name.clone();
    let payload = match extract_blocking(source, kind).await {
        Ok(Extraction::Payload(payload)) => payload,
        Ok(Extraction::Empty(empty)) => {
            info!("{}: nothing to convert", name);
            tracker.complete(id, empty.note().to_string());
            return;
        }
        Err(e) => {
            warn!("{}: {}", name, e);
            tracker.fail(id, e.to_string());
            return;
        }
    };

    if !tracker.transition(id, SessionStatus::Converting) {
        return;
    }

    match tracker.client.convert(payload, &name).await {
        Ok(markdown) => {
            info!("{}: converted ({} bytes)", name, markdown.len());
            tracker.complete(id, markdown);
        }
        Err(e) => tracker.fail(id, e.to_string()),
    }
}
