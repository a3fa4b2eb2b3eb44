//! Session persistence and restoration.
//!
//! The bearer token lives in `<home>/session.json` under the `token` key,
//! written with 0600 permissions. The user is never persisted: it is
//! re-resolved from the backend on every start.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, ApiSettings};
use crate::config::paths;
use crate::models::{TokenResponse, User};

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

/// Masks a token for display.
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 {
        return "***".to_string();
    }
    let prefix: String = token.chars().take(12).collect();
    format!("{prefix}...")
}

/// On-disk token storage.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<home>/session.json`.
    pub fn default_location() -> Self {
        Self::new(paths::session_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the persisted token, if any.
    ///
    /// # Errors
    /// Returns an error if the session file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session from {}", self.path.display()))?;
        let file: SessionFile = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session from {}", self.path.display()))?;
        Ok(file.token.filter(|token| !token.trim().is_empty()))
    }

    /// # Errors
    /// Returns an error if the session file cannot be written.
    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(&SessionFile {
            token: Some(token.to_string()),
        })
        .context("Failed to serialize session")?;

        #[cfg(unix)]
        {
            use std::fs::OpenOptions;
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;

            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }

    /// Removes the persisted token. Missing files are not an error.
    ///
    /// # Errors
    /// Returns an error if an existing session file cannot be removed.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove session {}", self.path.display())),
        }
    }
}

/// An authenticated identity: the bearer token and the user it resolved to.
///
/// Immutable; a different identity is a different `Session`.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    user: User,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.masked_token())
            .field("user", &self.user)
            .finish()
    }
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn masked_token(&self) -> String {
        mask_token(&self.token)
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// Client that authenticates every request with this session's token.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn client(&self, settings: &ApiSettings) -> Result<ApiClient> {
        ApiClient::with_token(settings, &self.token)
    }
}

/// Creates, restores and destroys sessions.
#[derive(Debug, Clone)]
pub struct SessionStore {
    tokens: TokenStore,
    settings: ApiSettings,
}

impl SessionStore {
    pub fn new(tokens: TokenStore, settings: ApiSettings) -> Self {
        Self { tokens, settings }
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Client for the unauthenticated endpoints.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn anonymous_client(&self) -> Result<ApiClient> {
        ApiClient::anonymous(&self.settings)
    }

    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn client(&self, session: &Session) -> Result<ApiClient> {
        session.client(&self.settings)
    }

    /// Validates the persisted token against the backend.
    ///
    /// Any failure (unreadable file, 401, transport or parse error) removes
    /// the token and yields `None`.
    pub async fn restore(&self) -> Option<Session> {
        let token = match self.tokens.load() {
            Ok(Some(token)) => token,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "discarding unreadable session");
                self.discard();
                return None;
            }
        };

        let client = match ApiClient::with_token(&self.settings, &token) {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "discarding unusable session token");
                self.discard();
                return None;
            }
        };

        match client.current_user().await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, token = %mask_token(&token), "session restored");
                Some(Session::new(token, user))
            }
            Err(err) => {
                tracing::warn!(error = %err, "session token rejected");
                self.discard();
                None
            }
        }
    }

    /// Persists the token from a login/registration response.
    ///
    /// # Errors
    /// Returns an error if the token cannot be persisted.
    pub fn login(&self, response: TokenResponse) -> Result<Session> {
        self.tokens.save(&response.access_token)?;
        tracing::info!(user_id = %response.user.id, "signed in");
        Ok(Session::new(response.access_token, response.user))
    }

    /// # Errors
    /// Returns an error if the session file cannot be removed.
    pub fn logout(&self) -> Result<()> {
        self.tokens.clear()?;
        tracing::info!("signed out");
        Ok(())
    }

    fn discard(&self) {
        if let Err(e) = self.tokens.clear() {
            tracing::warn!(error = %format!("{e:#}"), "failed to remove session file");
        }
    }
}
