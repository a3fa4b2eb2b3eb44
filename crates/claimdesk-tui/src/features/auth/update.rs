//! Auth screen reducer.

use claimdesk_core::api::ApiResult;
use claimdesk_core::auth::SubmitRejected;
use claimdesk_core::models::TokenResponse;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::state::AuthViewState;
use crate::common::TaskSeq;
use crate::effects::UiEffect;

pub fn handle_key(auth: &mut AuthViewState, seq: &mut TaskSeq, key: KeyEvent) -> Vec<UiEffect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        KeyCode::Tab | KeyCode::Down => auth.focus_next(),
        KeyCode::BackTab | KeyCode::Up => auth.focus_prev(),
        KeyCode::Char('r') if ctrl => {
            auth.form.toggle_mode();
            auth.ensure_focus_visible();
        }
        KeyCode::Enter => return submit(auth, seq),
        KeyCode::Esc => auth.form.error = None,
        KeyCode::Backspace if !auth.form.is_submitting() => {
            auth.focused_value_mut().pop();
        }
        KeyCode::Char(c) if !ctrl && !alt && !auth.form.is_submitting() => {
            auth.focused_value_mut().push(c);
        }
        _ => {}
    }
    vec![]
}

/// Pasted text goes into the focused field, minus line breaks.
pub fn handle_paste(auth: &mut AuthViewState, text: &str) -> Vec<UiEffect> {
    if !auth.form.is_submitting() {
        let cleaned: String = text.chars().filter(|c| !matches!(c, '\n' | '\r')).collect();
        auth.focused_value_mut().push_str(&cleaned);
    }
    vec![]
}

fn submit(auth: &mut AuthViewState, seq: &mut TaskSeq) -> Vec<UiEffect> {
    match auth.form.begin_submit() {
        Ok(request) => {
            tracing::info!(mode = ?request.mode(), "submitting credentials");
            vec![UiEffect::SubmitAuth {
                task: seq.next_id(),
                request,
            }]
        }
        Err(SubmitRejected::AlreadySubmitting | SubmitRejected::Invalid(_)) => vec![],
    }
}

/// Applies the login/registration outcome. A token response is handed to
/// the session store.
pub fn handle_auth_response(
    auth: &mut AuthViewState,
    outcome: ApiResult<TokenResponse>,
) -> Vec<UiEffect> {
    match auth.form.finish(outcome) {
        Some(response) => vec![UiEffect::StartSession { response }],
        None => vec![],
    }
}
