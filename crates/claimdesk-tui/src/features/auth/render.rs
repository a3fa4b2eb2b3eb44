use claimdesk_core::auth::AuthMode;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use super::state::{AuthField, AuthViewState};
use crate::common::text::{display_width, mask, wrap_words};
use crate::render::{centered_rect, spinner};

const FORM_WIDTH: u16 = 56;
const FIELD_HEIGHT: u16 = 3;

pub fn render_auth(auth: &AuthViewState, spinner_frame: usize, frame: &mut Frame, area: Rect) {
    let fields = auth.fields();
    let field_count = u16::try_from(fields.len()).unwrap_or(3);

    // Borders take two columns; the error wraps inside what is left.
    let inner_width = FORM_WIDTH.min(area.width).saturating_sub(2);
    let status = status_lines(auth, spinner_frame, usize::from(inner_width));
    let status_height = u16::try_from(status.len()).unwrap_or(u16::MAX).max(1);
    // fields + status + hint line + borders
    let height = (field_count * FIELD_HEIGHT)
        .saturating_add(status_height)
        .saturating_add(3);
    let outer = centered_rect(FORM_WIDTH, height, area);

    let title = format!(" ClaimDesk · {} ", auth.form.mode.title());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(Span::styled(title, Style::default().add_modifier(Modifier::BOLD)))
        .title_alignment(Alignment::Center);
    let inner = block.inner(outer);
    frame.render_widget(block, outer);

    let mut constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(FIELD_HEIGHT))
        .collect();
    constraints.push(Constraint::Length(status_height));
    constraints.push(Constraint::Length(1));
    let rows = Layout::vertical(constraints).split(inner);

    for (i, field) in fields.iter().enumerate() {
        render_field(auth, *field, frame, rows[i]);
    }

    let status_row = rows[fields.len()];
    let hint_row = rows[fields.len() + 1];
    frame.render_widget(Paragraph::new(status), status_row);

    let switch = match auth.form.mode {
        AuthMode::Login => "Ctrl+R register",
        AuthMode::Register => "Ctrl+R sign in",
    };
    let hint = format!("Tab next · Enter submit · {switch} · Ctrl+C quit");
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            hint,
            Style::default().fg(Color::DarkGray),
        ))),
        hint_row,
    );
}

/// Spinner while submitting, otherwise the full error wrapped to `width`.
fn status_lines(auth: &AuthViewState, spinner_frame: usize, width: usize) -> Vec<Line<'static>> {
    if auth.form.is_submitting() {
        let label = match auth.form.mode {
            AuthMode::Login => "Signing in…",
            AuthMode::Register => "Creating account…",
        };
        return vec![Line::from(vec![
            Span::styled(spinner(spinner_frame), Style::default().fg(Color::Cyan)),
            Span::raw(" "),
            Span::raw(label),
        ])];
    }

    let Some(error) = &auth.form.error else {
        return vec![];
    };
    wrap_words(error, width)
        .into_iter()
        .map(|line| Line::from(Span::styled(line, Style::default().fg(Color::Red))))
        .collect()
}

fn render_field(auth: &AuthViewState, field: AuthField, frame: &mut Frame, area: Rect) {
    let focused = auth.focus == field;
    let border = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let raw = auth.value(field);
    let shown = if field == AuthField::Password {
        mask(raw)
    } else {
        raw.to_string()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(field.label());
    let inner = block.inner(area);
    frame.render_widget(Paragraph::new(shown.as_str()).block(block), area);

    if focused && !auth.form.is_submitting() {
        let x = inner
            .x
            .saturating_add(display_width(&shown))
            .min(inner.right().saturating_sub(1));
        frame.set_cursor_position((x, inner.y));
    }
}
