//! Login, registration and session command handlers.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result, anyhow};
use claimdesk_core::auth::{AuthForm, AuthMode, SubmitRejected};
use claimdesk_core::session::SessionStore;

use super::require_session;

pub async fn login(store: &SessionStore, email: String, password: Option<String>) -> Result<()> {
    let form = AuthForm {
        mode: AuthMode::Login,
        email,
        password: resolve_password(password)?,
        ..AuthForm::default()
    };
    sign_in(store, form).await
}

pub async fn register(
    store: &SessionStore,
    email: String,
    full_name: String,
    password: Option<String>,
) -> Result<()> {
    let form = AuthForm {
        mode: AuthMode::Register,
        email,
        password: resolve_password(password)?,
        full_name,
        ..AuthForm::default()
    };
    sign_in(store, form).await
}

async fn sign_in(store: &SessionStore, mut form: AuthForm) -> Result<()> {
    let request = form.begin_submit().map_err(|rejected| match rejected {
        SubmitRejected::Invalid(err) => anyhow!(err),
        SubmitRejected::AlreadySubmitting => anyhow!("A sign-in is already in progress"),
    })?;

    let client = store.anonymous_client()?;
    let outcome = request.send(&client).await;
    let Some(response) = form.finish(outcome) else {
        let message = form
            .error
            .take()
            .unwrap_or_else(|| form.mode.failure_message().to_string());
        anyhow::bail!(message);
    };

    let session = store.login(response).context("save session")?;
    let user = session.user();
    println!("Signed in as {} <{}>", user.full_name, user.email);
    Ok(())
}

pub fn logout(store: &SessionStore) -> Result<()> {
    store.logout().context("remove session")?;
    println!("Signed out.");
    Ok(())
}

pub async fn whoami(store: &SessionStore) -> Result<()> {
    let session = require_session(store).await?;
    let user = session.user();
    println!("{} <{}>", user.full_name, user.email);
    println!("id:    {}", user.id);
    println!("token: {}", session.masked_token());
    println!("api:   {}", store.settings().base_url);
    Ok(())
}

/// Flag or `CLAIMDESK_PASSWORD` first, then one line from stdin.
fn resolve_password(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        let mut err = io::stderr();
        write!(err, "Password: ")?;
        err.flush()?;
    }

    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .context("read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
