//! UI events consumed by the reducer.
//!
//! Terminal input, timer ticks and the results of effects all arrive as
//! `UiEvent`s. Async results are wrapped in `TaskCompleted` so the reducer can
//! drop completions of superseded tasks.

use claimdesk_core::api::ApiResult;
use claimdesk_core::models::{AnalysisResult, HistoryEntry, TokenResponse};
use claimdesk_core::session::Session;
use claimdesk_core::workflow::{DocumentFile, DocumentRole};
use crossterm::event::Event;

use crate::common::{TaskCompleted, TaskKind, TaskStarted};

#[derive(Debug)]
pub enum UiEvent {
    /// Spinner / redraw cadence.
    Tick,
    Terminal(Event),

    TaskStarted {
        kind: TaskKind,
        started: TaskStarted,
    },
    TaskCompleted {
        kind: TaskKind,
        completed: TaskCompleted<Box<UiEvent>>,
    },

    /// Startup validation of the persisted token finished.
    SessionRestored(Option<Session>),
    /// Login or registration request finished.
    AuthResponded(ApiResult<TokenResponse>),
    /// Token from a successful auth response was persisted (or not).
    SessionStarted(Result<Session, String>),
    DocumentLoaded {
        role: DocumentRole,
        result: Result<DocumentFile, String>,
    },
    AnalyzeFinished(ApiResult<AnalysisResult>),
    HistoryLoaded(ApiResult<Vec<HistoryEntry>>),
}
