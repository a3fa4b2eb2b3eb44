//! Pure view functions.
//!
//! Rendering takes `&AppState`, draws to a ratatui `Frame`, and never mutates
//! state or returns effects.

use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::state::{AppState, Screen};
use crate::{auth, workflow};

/// Spinner frames for in-progress indicators.
const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

pub fn spinner(frame: usize) -> &'static str {
    SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]
}

/// A `width` x `height` rect centered in `area`, clamped to fit.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    cell
}

pub fn render(app: &AppState, frame: &mut Frame) {
    let area = frame.area();
    match app.screen {
        Screen::Loading => render_loading(app, frame, area),
        Screen::Auth => auth::render_auth(&app.auth, app.spinner_frame, frame, area),
        Screen::Workflow => workflow::render_workflow(app, frame, area),
    }
}

fn render_loading(app: &AppState, frame: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled(spinner(app.spinner_frame), Style::default().fg(Color::Cyan)),
        Span::raw(" Restoring session…"),
    ]);
    frame.render_widget(Paragraph::new(line), centered_rect(22, 1, area));
}
