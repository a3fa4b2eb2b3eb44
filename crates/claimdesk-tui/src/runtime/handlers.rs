//! Effect handlers.
//!
//! Handlers perform I/O and return the `UiEvent` describing the outcome.
//! They never touch `AppState`; the runtime sends their result to the inbox.

use std::path::PathBuf;

use claimdesk_core::api::ApiError;
use claimdesk_core::auth::AuthRequest;
use claimdesk_core::models::TokenResponse;
use claimdesk_core::session::{Session, SessionStore};
use claimdesk_core::workflow::{CompleteUpload, DocumentFile, DocumentRole};

use tokio::task;

use crate::events::UiEvent;

pub async fn restore_session(store: SessionStore) -> UiEvent {
    UiEvent::SessionRestored(store.restore().await)
}

pub async fn submit_auth(store: SessionStore, request: AuthRequest) -> UiEvent {
    let outcome = match store.anonymous_client() {
        Ok(client) => request.send(&client).await,
        Err(e) => Err(ApiError::setup(&format!("{e:#}"))),
    };
    UiEvent::AuthResponded(outcome)
}

pub fn start_session(store: &SessionStore, response: TokenResponse) -> UiEvent {
    let result = store.login(response).map_err(|e| {
        tracing::error!(error = %format!("{e:#}"), "failed to persist session");
        format!("Signed in, but the session could not be saved: {e}")
    });
    UiEvent::SessionStarted(result)
}

pub fn logout(store: &SessionStore) {
    if let Err(e) = store.logout() {
        tracing::warn!(error = %format!("{e:#}"), "failed to remove session");
    }
}

pub async fn load_document(role: DocumentRole, path: PathBuf) -> UiEvent {
    let result = match task::spawn_blocking(move || DocumentFile::read(&path)).await {
        Ok(read) => read.map_err(|e| format!("{e:#}")),
        Err(e) => Err(format!("Failed to read document: {e}")),
    };
    UiEvent::DocumentLoaded { role, result }
}

pub async fn analyze(store: SessionStore, session: Session, upload: CompleteUpload) -> UiEvent {
    let outcome = match store.client(&session) {
        Ok(client) => client.analyze(&upload).await,
        Err(e) => Err(ApiError::setup(&format!("{e:#}"))),
    };
    UiEvent::AnalyzeFinished(outcome)
}

pub async fn fetch_history(store: SessionStore, session: Session) -> UiEvent {
    let outcome = match store.client(&session) {
        Ok(client) => client.history().await,
        Err(e) => Err(ApiError::setup(&format!("{e:#}"))),
    };
    UiEvent::HistoryLoaded(outcome)
}
