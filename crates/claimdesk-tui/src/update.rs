//! Dashboard reducer.
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::{AppState, Screen};
use crate::{auth, workflow};

/// Effects to run when the dashboard starts: session restoration.
pub fn bootstrap(app: &mut AppState) -> Vec<UiEffect> {
    app.screen = Screen::Loading;
    vec![UiEffect::RestoreSession {
        task: app.task_seq.next_id(),
    }]
}

pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            app.spinner_frame = app.spinner_frame.wrapping_add(1);
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(app, term_event),
        UiEvent::TaskStarted { kind, started } => {
            if !app.tasks.on_started(kind, &started) {
                tracing::debug!(?kind, id = started.id.0, "ignoring task issued before reset");
            }
            vec![]
        }
        UiEvent::TaskCompleted { kind, completed } => {
            if app.tasks.state_mut(kind).finish_if_active(completed.id) {
                update(app, *completed.result)
            } else {
                tracing::debug!(?kind, id = completed.id.0, "dropping stale task result");
                vec![]
            }
        }
        UiEvent::SessionRestored(session) => {
            if app.screen == Screen::Loading {
                match session {
                    Some(session) => app.enter_workflow(session),
                    None => app.enter_auth(),
                }
            }
            vec![]
        }
        UiEvent::AuthResponded(outcome) => auth::handle_auth_response(&mut app.auth, outcome),
        UiEvent::SessionStarted(result) => {
            match result {
                Ok(session) => app.enter_workflow(session),
                Err(message) => app.auth.form.error = Some(message),
            }
            vec![]
        }
        UiEvent::DocumentLoaded { role, result } => {
            workflow::handle_document_loaded(&mut app.workflow, role, result)
        }
        UiEvent::AnalyzeFinished(outcome) => {
            workflow::handle_analyze_finished(&mut app.workflow, &mut app.task_seq, outcome)
        }
        UiEvent::HistoryLoaded(outcome) => {
            workflow::handle_history_loaded(&mut app.workflow, outcome)
        }
    }
}

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
        Event::Paste(text) => match app.screen {
            Screen::Auth => auth::handle_paste(&mut app.auth, &text),
            Screen::Workflow => workflow::handle_paste(&mut app.workflow, &mut app.task_seq, &text),
            Screen::Loading => vec![],
        },
        _ => vec![],
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return vec![];
    }

    match app.screen {
        Screen::Loading => {
            if key.code == KeyCode::Char('q') {
                app.should_quit = true;
            }
            vec![]
        }
        Screen::Auth => auth::handle_key(&mut app.auth, &mut app.task_seq, key),
        Screen::Workflow => {
            if app.workflow.prompt.is_none() {
                match key.code {
                    KeyCode::Char('q') => {
                        app.should_quit = true;
                        return vec![];
                    }
                    KeyCode::Char('l') => return logout(app),
                    _ => {}
                }
            }
            workflow::handle_key(&mut app.workflow, &mut app.task_seq, key)
        }
    }
}

fn logout(app: &mut AppState) -> Vec<UiEffect> {
    tracing::info!("logging out from dashboard");
    app.enter_auth();
    vec![UiEffect::Logout]
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use claimdesk_core::api::ApiError;
    use claimdesk_core::models::{AnalysisResult, Decision, HistoryEntry, TokenResponse, User};
    use claimdesk_core::session::Session;
    use claimdesk_core::workflow::{
        DocumentFile, DocumentRole, MISSING_DOCUMENTS_MESSAGE, Panel,
    };
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::common::{TaskCompleted, TaskId, TaskKind, TaskStarted};
    use crate::render::render;

    const PDF: &[u8] = b"%PDF-1.4\n";

    fn user() -> User {
        User {
            id: "u1".to_string(),
            email: "ada@example.com".to_string(),
            full_name: "Ada Lovelace".to_string(),
        }
    }

    fn key(code: KeyCode) -> UiEvent {
        UiEvent::Terminal(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn ctrl(c: char) -> UiEvent {
        UiEvent::Terminal(Event::Key(KeyEvent::new(
            KeyCode::Char(c),
            KeyModifiers::CONTROL,
        )))
    }

    fn type_text(app: &mut AppState, text: &str) {
        for c in text.chars() {
            update(app, key(KeyCode::Char(c)));
        }
    }

    /// Runs `event` as the completion of a task of `kind` that was started now.
    fn complete(app: &mut AppState, kind: TaskKind, id: TaskId, event: UiEvent) -> Vec<UiEffect> {
        update(
            app,
            UiEvent::TaskStarted {
                kind,
                started: TaskStarted { id },
            },
        );
        update(
            app,
            UiEvent::TaskCompleted {
                kind,
                completed: TaskCompleted {
                    id,
                    result: Box::new(event),
                },
            },
        )
    }

    fn signed_in() -> AppState {
        let mut app = AppState::new("http://localhost:8000");
        app.enter_workflow(Session::new("token", user()));
        app
    }

    fn with_all_documents(app: &mut AppState) {
        for role in DocumentRole::ALL {
            update(
                app,
                UiEvent::DocumentLoaded {
                    role,
                    result: Ok(DocumentFile::from_bytes(
                        format!("{}.pdf", role.field_name()),
                        PDF.to_vec(),
                    )),
                },
            );
        }
    }

    fn start_analyze(app: &mut AppState) -> TaskId {
        let effects = update(app, key(KeyCode::Char('a')));
        match effects.as_slice() {
            [UiEffect::Analyze { task, .. }] => *task,
            other => panic!("expected analyze effect, got {other:?}"),
        }
    }

    fn analysis(decision: Decision, score: Option<f64>, reasoning: &str) -> AnalysisResult {
        AnalysisResult {
            id: None,
            decision,
            reasoning: reasoning.to_string(),
            confidence_score: score,
            analyzed_at: None,
        }
    }

    fn draw(app: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_bootstrap_restores_session() {
        let mut app = AppState::new("http://localhost:8000");
        let effects = bootstrap(&mut app);
        assert!(matches!(effects.as_slice(), [UiEffect::RestoreSession { .. }]));
        assert_eq!(app.screen, Screen::Loading);
        assert!(draw(&app).contains("Restoring session"));
    }

    #[test]
    fn test_failed_restore_mounts_auth() {
        let mut app = AppState::new("http://localhost:8000");
        let effects = bootstrap(&mut app);
        let [UiEffect::RestoreSession { task }] = effects.as_slice() else {
            panic!("expected restore effect");
        };
        complete(
            &mut app,
            TaskKind::SessionRestore,
            *task,
            UiEvent::SessionRestored(None),
        );
        assert_eq!(app.screen, Screen::Auth);
        assert!(app.session.is_none());
        assert!(draw(&app).contains("Sign in"));
    }

    #[test]
    fn test_restored_session_mounts_workflow() {
        let mut app = AppState::new("http://localhost:8000");
        let effects = bootstrap(&mut app);
        let [UiEffect::RestoreSession { task }] = effects.as_slice() else {
            panic!("expected restore effect");
        };
        complete(
            &mut app,
            TaskKind::SessionRestore,
            *task,
            UiEvent::SessionRestored(Some(Session::new("t", user()))),
        );
        assert_eq!(app.screen, Screen::Workflow);
        assert!(draw(&app).contains("Ada Lovelace"));
    }

    #[test]
    fn test_login_flow_reaches_workflow() {
        let mut app = AppState::new("http://localhost:8000");
        app.enter_auth();
        type_text(&mut app, "ada@example.com");
        update(&mut app, key(KeyCode::Tab));
        type_text(&mut app, "secret");

        let effects = update(&mut app, key(KeyCode::Enter));
        let [UiEffect::SubmitAuth { task, request }] = effects.as_slice() else {
            panic!("expected submit effect");
        };
        assert_eq!(request.email(), "ada@example.com");
        assert!(app.auth.form.is_submitting());
        assert!(draw(&app).contains("Signing in"));

        // A second Enter while submitting does nothing.
        assert!(update(&mut app, key(KeyCode::Enter)).is_empty());

        let response = TokenResponse {
            access_token: "tok".to_string(),
            token_type: "bearer".to_string(),
            user: user(),
        };
        let effects = complete(
            &mut app,
            TaskKind::AuthSubmit,
            *task,
            UiEvent::AuthResponded(Ok(response)),
        );
        assert!(matches!(effects.as_slice(), [UiEffect::StartSession { .. }]));

        update(
            &mut app,
            UiEvent::SessionStarted(Ok(Session::new("tok", user()))),
        );
        assert_eq!(app.screen, Screen::Workflow);
        assert!(app.auth.form.password.is_empty());
    }

    #[test]
    fn test_password_is_masked() {
        let mut app = AppState::new("http://localhost:8000");
        app.enter_auth();
        update(&mut app, key(KeyCode::Tab));
        type_text(&mut app, "hunter2");
        let screen = draw(&app);
        assert!(!screen.contains("hunter2"));
        assert!(screen.contains("•••••••"));
    }

    #[test]
    fn test_invalid_form_issues_no_request() {
        let mut app = AppState::new("http://localhost:8000");
        app.enter_auth();
        type_text(&mut app, "not-an-email");
        assert!(update(&mut app, key(KeyCode::Enter)).is_empty());
        assert!(app.auth.form.error.is_some());
    }

    #[test]
    fn test_ctrl_r_switches_to_register() {
        let mut app = AppState::new("http://localhost:8000");
        app.enter_auth();
        type_text(&mut app, "ada@example.com");
        update(&mut app, ctrl('r'));
        assert!(draw(&app).contains("Full name"));
        assert_eq!(app.auth.form.email, "ada@example.com");
    }

    #[test]
    fn test_server_detail_is_shown_on_auth_failure() {
        let mut app = AppState::new("http://localhost:8000");
        app.enter_auth();
        type_text(&mut app, "ada@example.com");
        update(&mut app, key(KeyCode::Tab));
        type_text(&mut app, "wrong");
        let effects = update(&mut app, key(KeyCode::Enter));
        let [UiEffect::SubmitAuth { task, .. }] = effects.as_slice() else {
            panic!("expected submit effect");
        };
        complete(
            &mut app,
            TaskKind::AuthSubmit,
            *task,
            UiEvent::AuthResponded(Err(ApiError::from_status(
                401,
                r#"{"detail":"Invalid credentials"}"#,
            ))),
        );
        assert!(!app.auth.form.is_submitting());
        assert!(draw(&app).contains("Invalid credentials"));
    }

    /// Every word of `text` is on screen and nothing was cut with an ellipsis.
    fn assert_shown_in_full(screen: &str, text: &str) {
        for word in text.split_whitespace() {
            assert!(screen.contains(word), "missing {word:?} from screen");
        }
        assert!(!screen.contains('…'));
    }

    #[test]
    fn test_long_auth_detail_wraps_instead_of_truncating() {
        let detail = "value is not a valid email address: The part after the @-sign \
                      is not valid. It should have a period.";
        let mut app = AppState::new("http://localhost:8000");
        app.enter_auth();
        type_text(&mut app, "ada@example.com");
        update(&mut app, key(KeyCode::Tab));
        type_text(&mut app, "secret");
        let effects = update(&mut app, key(KeyCode::Enter));
        let [UiEffect::SubmitAuth { task, .. }] = effects.as_slice() else {
            panic!("expected submit effect");
        };
        let body = serde_json::json!({ "detail": [{ "msg": detail }] }).to_string();
        complete(
            &mut app,
            TaskKind::AuthSubmit,
            *task,
            UiEvent::AuthResponded(Err(ApiError::from_status(422, &body))),
        );

        assert_eq!(app.auth.form.error.as_deref(), Some(detail));
        assert_shown_in_full(&draw(&app), detail);
    }

    #[test]
    fn test_long_analyze_detail_wraps_instead_of_truncating() {
        let detail = "Error analyzing claim: the policy document could not be parsed \
                      because page 3 contains an embedded scan without a text layer, \
                      upload a searchable copy";
        let mut app = signed_in();
        with_all_documents(&mut app);
        let task = start_analyze(&mut app);
        let body = serde_json::json!({ "detail": detail }).to_string();
        complete(
            &mut app,
            TaskKind::Analyze,
            task,
            UiEvent::AnalyzeFinished(Err(ApiError::from_status(500, &body))),
        );

        assert_eq!(app.workflow.workflow.error.as_deref(), Some(detail));
        assert_shown_in_full(&draw(&app), detail);
    }

    #[test]
    fn test_analyze_with_missing_documents_has_no_effect() {
        let mut app = signed_in();
        update(
            &mut app,
            UiEvent::DocumentLoaded {
                role: DocumentRole::Policy,
                result: Ok(DocumentFile::from_bytes("policy.pdf", PDF.to_vec())),
            },
        );
        assert!(update(&mut app, key(KeyCode::Char('a'))).is_empty());
        assert!(draw(&app).contains(MISSING_DOCUMENTS_MESSAGE));
    }

    #[test]
    fn test_pass_result_shows_gauge() {
        let mut app = signed_in();
        with_all_documents(&mut app);
        let task = start_analyze(&mut app);
        assert!(draw(&app).contains("Analyzing claim"));

        let effects = complete(
            &mut app,
            TaskKind::Analyze,
            task,
            UiEvent::AnalyzeFinished(Ok(analysis(Decision::Pass, Some(87.0), "ok"))),
        );
        assert!(matches!(effects.as_slice(), [UiEffect::FetchHistory { .. }]));

        let screen = draw(&app);
        assert!(screen.contains("PASS"));
        assert!(screen.contains("Confidence 87%"));
    }

    #[test]
    fn test_fail_result_without_score_has_no_gauge() {
        let mut app = signed_in();
        with_all_documents(&mut app);
        let task = start_analyze(&mut app);
        complete(
            &mut app,
            TaskKind::Analyze,
            task,
            UiEvent::AnalyzeFinished(Ok(analysis(Decision::Fail, None, "mismatch"))),
        );

        let screen = draw(&app);
        assert!(screen.contains("FAIL"));
        assert!(screen.contains("mismatch"));
        assert!(!screen.contains("Confidence"));
    }

    #[test]
    fn test_second_analyze_while_running_is_ignored() {
        let mut app = signed_in();
        with_all_documents(&mut app);
        start_analyze(&mut app);
        assert!(update(&mut app, key(KeyCode::Char('a'))).is_empty());
    }

    #[test]
    fn test_history_toggle_keeps_result_and_files() {
        let mut app = signed_in();
        with_all_documents(&mut app);
        let task = start_analyze(&mut app);
        complete(
            &mut app,
            TaskKind::Analyze,
            task,
            UiEvent::AnalyzeFinished(Ok(analysis(Decision::Pass, Some(87.0), "ok"))),
        );

        update(&mut app, key(KeyCode::Char('h')));
        assert_eq!(app.workflow.workflow.panel, Panel::History);
        update(&mut app, key(KeyCode::Char('h')));
        assert_eq!(app.workflow.workflow.panel, Panel::Upload);

        assert!(app.workflow.workflow.uploads.is_complete());
        let screen = draw(&app);
        assert!(screen.contains("Confidence 87%"));
        assert!(screen.contains("policy.pdf"));
    }

    #[test]
    fn test_history_failure_does_not_touch_analyze_error() {
        let mut app = signed_in();
        let effects = update(&mut app, key(KeyCode::Char('r')));
        let [UiEffect::FetchHistory { task }] = effects.as_slice() else {
            panic!("expected history effect");
        };
        complete(
            &mut app,
            TaskKind::History,
            *task,
            UiEvent::HistoryLoaded(Err(ApiError::from_status(500, ""))),
        );
        assert_eq!(app.workflow.workflow.error, None);
    }

    #[test]
    fn test_history_renders_in_server_order() {
        let mut app = signed_in();
        let effects = update(&mut app, key(KeyCode::Char('h')));
        let [UiEffect::FetchHistory { task }] = effects.as_slice() else {
            panic!("expected history effect");
        };
        let entries = history_entries();
        complete(
            &mut app,
            TaskKind::History,
            *task,
            UiEvent::HistoryLoaded(Ok(entries)),
        );

        let screen = draw(&app);
        let first = screen.find("second-policy.pdf").unwrap();
        let second = screen.find("first-policy.pdf").unwrap();
        assert!(first < second);
    }

    fn history_entries() -> Vec<HistoryEntry> {
        let entry = |id: &str, prefix: &str, day: u32| HistoryEntry {
            id: id.to_string(),
            analyzed_at: chrono_at(day),
            policy_file: format!("{prefix}-policy.pdf"),
            claim_file: format!("{prefix}-claim.pdf"),
            bills_file: None,
            doctor_notes_file: None,
            decision: Decision::Pass,
            reasoning: String::new(),
            confidence_score: Some(90.0),
        };
        // Server order is authoritative, even when not sorted by date.
        vec![entry("b", "second", 1), entry("a", "first", 2)]
    }

    fn chrono_at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_logout_returns_to_auth_and_drops_late_results() {
        let mut app = signed_in();
        with_all_documents(&mut app);
        let task = start_analyze(&mut app);
        update(
            &mut app,
            UiEvent::TaskStarted {
                kind: TaskKind::Analyze,
                started: TaskStarted { id: task },
            },
        );

        let effects = update(&mut app, key(KeyCode::Char('l')));
        assert!(matches!(effects.as_slice(), [UiEffect::Logout]));
        assert_eq!(app.screen, Screen::Auth);
        assert!(app.session.is_none());

        update(
            &mut app,
            UiEvent::TaskCompleted {
                kind: TaskKind::Analyze,
                completed: TaskCompleted {
                    id: task,
                    result: Box::new(UiEvent::AnalyzeFinished(Ok(analysis(
                        Decision::Pass,
                        None,
                        "late",
                    )))),
                },
            },
        );
        assert!(app.workflow.workflow.result.is_none());
    }

    #[test]
    fn test_path_prompt_loads_document() {
        let mut app = signed_in();
        update(&mut app, key(KeyCode::Down));
        update(&mut app, key(KeyCode::Enter));
        assert!(app.workflow.prompt.is_some());
        // 'q' is text inside the prompt, not quit.
        type_text(&mut app, "/tmp/q.pdf");
        assert!(!app.should_quit);

        let effects = update(&mut app, key(KeyCode::Enter));
        match effects.as_slice() {
            [UiEffect::LoadDocument { role, path, .. }] => {
                assert_eq!(*role, DocumentRole::Claim);
                assert_eq!(path.to_str(), Some("/tmp/q.pdf"));
            }
            other => panic!("expected load effect, got {other:?}"),
        }
        assert!(app.workflow.prompt.is_none());
    }

    #[test]
    fn test_paste_loads_into_highlighted_row() {
        let mut app = signed_in();
        let effects = update(
            &mut app,
            UiEvent::Terminal(Event::Paste("'/tmp/my policy.pdf'".to_string())),
        );
        match effects.as_slice() {
            [UiEffect::LoadDocument { role, path, .. }] => {
                assert_eq!(*role, DocumentRole::Policy);
                assert_eq!(path.to_str(), Some("/tmp/my policy.pdf"));
            }
            other => panic!("expected load effect, got {other:?}"),
        }
    }

    #[test]
    fn test_document_read_finishing_after_logout_is_dropped() {
        let mut app = signed_in();
        let effects = update(
            &mut app,
            UiEvent::Terminal(Event::Paste("/tmp/policy.pdf".to_string())),
        );
        let [UiEffect::LoadDocument { task, role, .. }] = effects.as_slice() else {
            panic!("expected load effect, got {effects:?}");
        };
        let (task, role) = (*task, *role);
        let kind = TaskKind::load_document(role);
        update(
            &mut app,
            UiEvent::TaskStarted {
                kind,
                started: TaskStarted { id: task },
            },
        );
        assert!(app.tasks.is_any_running());

        update(&mut app, key(KeyCode::Char('l')));
        app.enter_workflow(Session::new("token", user()));
        update(
            &mut app,
            UiEvent::TaskCompleted {
                kind,
                completed: TaskCompleted {
                    id: task,
                    result: Box::new(UiEvent::DocumentLoaded {
                        role,
                        result: Ok(DocumentFile::from_bytes("policy.pdf", PDF.to_vec())),
                    }),
                },
            },
        );
        assert!(app.workflow.workflow.uploads.get(role).is_none());
    }

    #[test]
    fn test_newer_pick_for_a_row_wins_over_slower_read() {
        let mut app = signed_in();
        let first = paste_path(&mut app, "/tmp/old.pdf");
        let second = paste_path(&mut app, "/tmp/new.pdf");
        let kind = TaskKind::load_document(DocumentRole::Policy);
        for id in [first, second] {
            update(
                &mut app,
                UiEvent::TaskStarted {
                    kind,
                    started: TaskStarted { id },
                },
            );
        }

        for (id, name) in [(second, "new.pdf"), (first, "old.pdf")] {
            update(
                &mut app,
                UiEvent::TaskCompleted {
                    kind,
                    completed: TaskCompleted {
                        id,
                        result: Box::new(UiEvent::DocumentLoaded {
                            role: DocumentRole::Policy,
                            result: Ok(DocumentFile::from_bytes(name, PDF.to_vec())),
                        }),
                    },
                },
            );
        }
        let selected = app.workflow.workflow.uploads.get(DocumentRole::Policy).unwrap();
        assert_eq!(selected.name(), "new.pdf");
    }

    fn paste_path(app: &mut AppState, path: &str) -> TaskId {
        let effects = update(app, UiEvent::Terminal(Event::Paste(path.to_string())));
        match effects.as_slice() {
            [UiEffect::LoadDocument { task, .. }] => *task,
            other => panic!("expected load effect, got {other:?}"),
        }
    }

    #[test]
    fn test_non_pdf_document_is_rejected_visibly() {
        let mut app = signed_in();
        update(
            &mut app,
            UiEvent::DocumentLoaded {
                role: DocumentRole::Bills,
                result: Ok(DocumentFile::from_bytes("bills.txt", b"hello".to_vec())),
            },
        );
        assert!(app.workflow.workflow.uploads.get(DocumentRole::Bills).is_none());
        assert!(draw(&app).contains("Please select a PDF file"));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = signed_in();
        update(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);

        let mut app = AppState::new("http://localhost:8000");
        app.enter_auth();
        type_text(&mut app, "q");
        assert!(!app.should_quit);
        update(&mut app, ctrl('c'));
        assert!(app.should_quit);
    }
}
