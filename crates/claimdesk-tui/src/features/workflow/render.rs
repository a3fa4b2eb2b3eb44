use claimdesk_core::models::{AnalysisResult, Decision, HistoryEntry};
use claimdesk_core::workflow::{DisplayedResult, DocumentRole, HistoryStatus, Panel};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Wrap};

use super::state::WorkflowViewState;
use crate::common::text::{display_width, truncate_with_ellipsis, wrap_words};
use crate::render::spinner;
use crate::state::AppState;

const LABEL_WIDTH: usize = 17;

/// Rows the body keeps even when a long error pushes the status area up.
const MIN_BODY_HEIGHT: u16 = 6;

pub fn render_workflow(app: &AppState, frame: &mut Frame, area: Rect) {
    let state = &app.workflow;
    let error = error_lines(state, usize::from(area.width));
    let max_status = area.height.saturating_sub(MIN_BODY_HEIGHT + 2).max(1);
    let status_height = u16::try_from(error.len())
        .unwrap_or(u16::MAX)
        .clamp(1, max_status);
    let [header, body, status, hints] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(MIN_BODY_HEIGHT),
        Constraint::Length(status_height),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header);

    match state.workflow.panel {
        Panel::Upload => {
            let [documents, result] =
                Layout::vertical([Constraint::Length(6), Constraint::Min(4)]).areas(body);
            render_documents(state, frame, documents);
            render_result(state, app.spinner_frame, frame, result);
        }
        Panel::History => render_history(state, frame, body),
    }

    render_status(state, error, frame, status);
    render_hints(state, frame, hints);
}

fn render_header(app: &AppState, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled(
        "ClaimDesk",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(user) = app.user() {
        spans.push(Span::raw(format!(" · {} <{}>", user.full_name, user.email)));
    }
    spans.push(Span::styled(
        format!(" · {}", app.api_base_url),
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_documents(state: &WorkflowViewState, frame: &mut Frame, area: Rect) {
    let uploads = &state.workflow.uploads;
    let selected_count = DocumentRole::ALL.len() - uploads.missing().len();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Documents ({selected_count}/4) "));
    let inner = block.inner(area);
    let name_width = usize::from(inner.width).saturating_sub(LABEL_WIDTH + 2);

    let lines: Vec<Line> = DocumentRole::ALL
        .iter()
        .enumerate()
        .map(|(i, role)| {
            let highlighted = i == state.selected;
            let marker = if highlighted { "▸ " } else { "  " };
            let label_style = if highlighted {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let file = match uploads.get(*role) {
                Some(file) => Span::styled(
                    truncate_with_ellipsis(file.name(), name_width),
                    Style::default().fg(Color::Green),
                ),
                None => Span::styled("not selected", Style::default().fg(Color::DarkGray)),
            };
            Line::from(vec![
                Span::raw(marker),
                Span::styled(format!("{:<LABEL_WIDTH$}", role.label()), label_style),
                file,
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn decision_span(decision: Decision, dimmed: bool) -> Span<'static> {
    let (text, color) = match decision {
        Decision::Pass => ("✔ PASS", Color::Green),
        Decision::Fail => ("✘ FAIL", Color::Red),
        Decision::Unknown => ("? UNKNOWN", Color::Yellow),
    };
    let color = if dimmed { Color::DarkGray } else { color };
    Span::styled(
        text,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )
}

fn render_result(state: &WorkflowViewState, spinner_frame: usize, frame: &mut Frame, area: Rect) {
    let workflow = &state.workflow;
    let title = match &workflow.result {
        Some(DisplayedResult { stale: true, .. }) => " Previous result (latest analysis failed) ",
        _ => " Result ",
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if workflow.is_analyzing() {
        let line = Line::from(vec![
            Span::styled(spinner(spinner_frame), Style::default().fg(Color::Cyan)),
            Span::raw(" Analyzing claim…"),
        ]);
        frame.render_widget(Paragraph::new(line), inner);
        return;
    }

    match &workflow.result {
        Some(shown) => render_analysis(&shown.result, shown.stale, frame, inner),
        None => frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "Select all four PDFs, then press a to analyze.",
                Style::default().fg(Color::DarkGray),
            ))),
            inner,
        ),
    }
}

fn render_analysis(result: &AnalysisResult, stale: bool, frame: &mut Frame, area: Rect) {
    let percent = result.confidence_percent();
    let gauge_height = u16::from(percent.is_some());
    let [decision_row, gauge_row, _, reasoning_row] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(gauge_height),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(area);

    frame.render_widget(
        Paragraph::new(Line::from(decision_span(result.decision, stale))),
        decision_row,
    );

    if let Some(percent) = percent {
        let color = match result.decision {
            Decision::Pass => Color::Green,
            Decision::Fail => Color::Red,
            Decision::Unknown => Color::Yellow,
        };
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(color).bg(Color::Black))
            .percent(percent)
            .label(format!("Confidence {percent}%"));
        frame.render_widget(gauge, gauge_row);
    }

    frame.render_widget(
        Paragraph::new(result.reasoning.as_str()).wrap(Wrap { trim: false }),
        reasoning_row,
    );
}

fn history_line(entry: &HistoryEntry, width: usize) -> Line<'static> {
    let confidence = entry
        .confidence_percent()
        .map_or_else(|| "  --".to_string(), |p| format!("{p:>3}%"));
    let mut files = vec![entry.policy_file.as_str(), entry.claim_file.as_str()];
    files.extend(entry.bills_file.as_deref());
    files.extend(entry.doctor_notes_file.as_deref());
    let prefix = format!("{}  ", entry.display_date());
    let files = files.join(", ");
    // date, decision column, confidence, separators
    let used = prefix.len() + 10 + 4 + 2;
    Line::from(vec![
        Span::styled(prefix, Style::default().fg(Color::DarkGray)),
        decision_span(entry.decision, false),
        Span::raw(" "),
        Span::raw(confidence),
        Span::raw("  "),
        Span::raw(truncate_with_ellipsis(&files, width.saturating_sub(used))),
    ])
}

fn render_history(state: &WorkflowViewState, frame: &mut Frame, area: Rect) {
    let workflow = &state.workflow;
    let suffix = match &workflow.history_status {
        HistoryStatus::Loading => " · loading…",
        HistoryStatus::Failed(_) => " · refresh failed",
        HistoryStatus::NotLoaded | HistoryStatus::Loaded => "",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" History ({}){suffix} ", workflow.history.len()));
    let inner = block.inner(area);

    let lines: Vec<Line> = if workflow.history.is_empty() {
        let text = match workflow.history_status {
            HistoryStatus::Loading | HistoryStatus::NotLoaded => "Loading history…",
            HistoryStatus::Failed(_) => "Could not load history. Press r to retry.",
            HistoryStatus::Loaded => "No past analyses.",
        };
        vec![Line::from(Span::styled(
            text,
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        workflow
            .history
            .iter()
            .skip(state.history_offset)
            .take(usize::from(inner.height))
            .map(|entry| history_line(entry, usize::from(inner.width)))
            .collect()
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// The workflow error wrapped to `width`; empty while a path prompt is open.
fn error_lines(state: &WorkflowViewState, width: usize) -> Vec<Line<'static>> {
    if state.prompt.is_some() {
        return vec![];
    }
    state
        .workflow
        .error
        .as_deref()
        .map(|error| wrap_words(error, width))
        .unwrap_or_default()
        .into_iter()
        .map(|line| Line::from(Span::styled(line, Style::default().fg(Color::Red))))
        .collect()
}

fn render_status(
    state: &WorkflowViewState,
    error: Vec<Line<'static>>,
    frame: &mut Frame,
    area: Rect,
) {
    if let Some(prompt) = &state.prompt {
        let label = format!("Path for {}: ", prompt.role.label().to_lowercase());
        let cursor_x = area
            .x
            .saturating_add(display_width(&label))
            .saturating_add(display_width(&prompt.input))
            .min(area.right().saturating_sub(1));
        let line = Line::from(vec![
            Span::styled(label, Style::default().fg(Color::Yellow)),
            Span::raw(prompt.input.clone()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        frame.set_cursor_position((cursor_x, area.y));
        return;
    }

    frame.render_widget(Paragraph::new(error), area);
}

fn render_hints(state: &WorkflowViewState, frame: &mut Frame, area: Rect) {
    let text = if state.prompt.is_some() {
        "Enter load · Esc cancel · paste a path or drop a file"
    } else {
        match state.workflow.panel {
            Panel::Upload => {
                "↑/↓ select · Enter choose file · a analyze · h history · l log out · q quit"
            }
            Panel::History => "↑/↓ scroll · h back · r refresh · l log out · q quit",
        }
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            text,
            Style::default().fg(Color::DarkGray),
        ))),
        area,
    );
}
