//! CLI command handlers.

pub mod auth;
pub mod claims;
pub mod config;

use anyhow::{Context, Result};
use claimdesk_core::session::{Session, SessionStore};

pub const NOT_LOGGED_IN: &str = "Not logged in. Run `claimdesk login` first.";

/// Validates the stored token, failing when there is no usable session.
pub async fn require_session(store: &SessionStore) -> Result<Session> {
    store.restore().await.context(NOT_LOGGED_IN)
}
