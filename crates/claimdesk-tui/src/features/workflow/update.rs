//! Workflow screen reducer.

use std::path::PathBuf;

use claimdesk_core::api::ApiResult;
use claimdesk_core::models::{AnalysisResult, HistoryEntry};
use claimdesk_core::workflow::{AnalyzeRejected, DocumentFile, DocumentRole, HistoryStatus, Panel};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::state::WorkflowViewState;
use crate::common::TaskSeq;
use crate::common::text::clean_path_input;
use crate::effects::UiEffect;

pub fn handle_key(
    state: &mut WorkflowViewState,
    seq: &mut TaskSeq,
    key: KeyEvent,
) -> Vec<UiEffect> {
    if state.prompt.is_some() {
        return handle_prompt_key(state, seq, key);
    }

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => match state.workflow.panel {
            Panel::Upload => state.select_prev(),
            Panel::History => state.scroll_history(false),
        },
        KeyCode::Down | KeyCode::Char('j') => match state.workflow.panel {
            Panel::Upload => state.select_next(),
            Panel::History => state.scroll_history(true),
        },
        KeyCode::Enter if state.workflow.panel == Panel::Upload => state.open_prompt(""),
        KeyCode::Char('a') => return analyze(state, seq),
        KeyCode::Char('h') => {
            state.workflow.toggle_panel();
            if state.workflow.panel == Panel::History
                && state.workflow.history_status == HistoryStatus::NotLoaded
            {
                return fetch_history(state, seq);
            }
        }
        KeyCode::Char('r') => return fetch_history(state, seq),
        KeyCode::Esc => state.workflow.error = None,
        _ => {}
    }
    vec![]
}

fn handle_prompt_key(
    state: &mut WorkflowViewState,
    seq: &mut TaskSeq,
    key: KeyEvent,
) -> Vec<UiEffect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let Some(prompt) = state.prompt.as_mut() else {
        return vec![];
    };

    match key.code {
        KeyCode::Esc => state.prompt = None,
        KeyCode::Enter => {
            let role = prompt.role;
            let path = clean_path_input(&prompt.input);
            state.prompt = None;
            if !path.is_empty() {
                return vec![load_document(seq, role, &path)];
            }
        }
        KeyCode::Backspace => {
            prompt.input.pop();
        }
        KeyCode::Char('u') if ctrl => prompt.input.clear(),
        KeyCode::Char(c) if !ctrl => prompt.input.push(c),
        _ => {}
    }
    vec![]
}

/// A pasted path fills the open prompt, or loads straight into the
/// highlighted row.
pub fn handle_paste(
    state: &mut WorkflowViewState,
    seq: &mut TaskSeq,
    text: &str,
) -> Vec<UiEffect> {
    if let Some(prompt) = state.prompt.as_mut() {
        prompt.input.push_str(&clean_path_input(text));
        return vec![];
    }
    if state.workflow.panel != Panel::Upload {
        return vec![];
    }
    let path = clean_path_input(text);
    if path.is_empty() {
        return vec![];
    }
    vec![load_document(seq, state.selected_role(), &path)]
}

fn load_document(seq: &mut TaskSeq, role: DocumentRole, path: &str) -> UiEffect {
    UiEffect::LoadDocument {
        task: seq.next_id(),
        role,
        path: PathBuf::from(path),
    }
}

pub fn handle_document_loaded(
    state: &mut WorkflowViewState,
    role: DocumentRole,
    result: Result<DocumentFile, String>,
) -> Vec<UiEffect> {
    match result {
        Ok(file) => {
            // Rejections are recorded on the workflow and rendered from there.
            if state.workflow.select_file(role, file).is_ok() {
                tracing::debug!(role = role.field_name(), "document selected");
            }
        }
        Err(message) => state.workflow.reject_file(message),
    }
    vec![]
}

fn analyze(state: &mut WorkflowViewState, seq: &mut TaskSeq) -> Vec<UiEffect> {
    match state.workflow.begin_analyze() {
        Ok(upload) => vec![UiEffect::Analyze {
            task: seq.next_id(),
            upload,
        }],
        Err(AnalyzeRejected::InProgress | AnalyzeRejected::Incomplete(_)) => vec![],
    }
}

pub fn fetch_history(state: &mut WorkflowViewState, seq: &mut TaskSeq) -> Vec<UiEffect> {
    state.workflow.begin_history_refresh();
    vec![UiEffect::FetchHistory {
        task: seq.next_id(),
    }]
}

/// Applies the analyze outcome; success starts a separate history refresh.
pub fn handle_analyze_finished(
    state: &mut WorkflowViewState,
    seq: &mut TaskSeq,
    outcome: ApiResult<AnalysisResult>,
) -> Vec<UiEffect> {
    if state.workflow.finish_analyze(outcome) {
        fetch_history(state, seq)
    } else {
        vec![]
    }
}

pub fn handle_history_loaded(
    state: &mut WorkflowViewState,
    outcome: ApiResult<Vec<HistoryEntry>>,
) -> Vec<UiEffect> {
    state.workflow.finish_history(outcome);
    state.history_offset = state
        .history_offset
        .min(state.workflow.history.len().saturating_sub(1));
    vec![]
}
