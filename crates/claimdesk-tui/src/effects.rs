//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They represent I/O and task spawning only; the reducer never performs I/O.

use std::path::PathBuf;

use claimdesk_core::auth::AuthRequest;
use claimdesk_core::models::TokenResponse;
use claimdesk_core::workflow::{CompleteUpload, DocumentRole};

use crate::common::TaskId;

#[derive(Debug)]
pub enum UiEffect {
    /// Validate the persisted token against the backend.
    RestoreSession { task: TaskId },

    /// Send a login or registration request.
    SubmitAuth { task: TaskId, request: AuthRequest },

    /// Persist the token from a successful auth response.
    StartSession { response: TokenResponse },

    /// Remove the persisted token.
    Logout,

    /// Read a file from disk for a document role, off the UI thread.
    LoadDocument {
        task: TaskId,
        role: DocumentRole,
        path: PathBuf,
    },

    /// Upload the four documents for analysis.
    Analyze { task: TaskId, upload: CompleteUpload },

    /// Fetch past analyses.
    FetchHistory { task: TaskId },
}
