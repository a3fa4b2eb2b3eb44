//! Application state composition.
//!
//! ```text
//! AppState
//! ├── screen: Screen            (loading / auth / workflow)
//! ├── session: Option<Session>  (present only on the workflow screen)
//! ├── auth: AuthViewState       (form + focus)
//! ├── workflow: WorkflowViewState (uploads, result, history, prompt)
//! ├── task_seq: TaskSeq         (async task id generator)
//! └── tasks: Tasks              (task lifecycle state)
//! ```

use claimdesk_core::models::User;
use claimdesk_core::session::Session;

use crate::auth::AuthViewState;
use crate::common::{TaskSeq, Tasks};
use crate::workflow::WorkflowViewState;

/// Which view is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Session restoration in progress.
    #[default]
    Loading,
    Auth,
    Workflow,
}

#[derive(Debug, Default)]
pub struct AppState {
    pub screen: Screen,
    /// Shown in the header; informational only.
    pub api_base_url: String,
    pub session: Option<Session>,
    pub auth: AuthViewState,
    pub workflow: WorkflowViewState,
    pub task_seq: TaskSeq,
    pub tasks: Tasks,
    pub spinner_frame: usize,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(Session::user)
    }

    /// Mounts the workflow view for `session`, starting from a clean workflow.
    pub fn enter_workflow(&mut self, session: Session) {
        self.session = Some(session);
        self.workflow = WorkflowViewState::default();
        self.auth.reset_after_sign_in();
        self.screen = Screen::Workflow;
    }

    /// Drops the session and everything derived from it, then mounts the
    /// auth view. In-flight tasks are forgotten.
    pub fn enter_auth(&mut self) {
        self.session = None;
        self.workflow = WorkflowViewState::default();
        self.tasks.reset(&self.task_seq);
        self.screen = Screen::Auth;
    }
}
