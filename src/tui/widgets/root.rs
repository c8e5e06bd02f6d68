//! Root layout widget

use crate::app::state::AppState;
use crate::tui::theme::get_theme;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::{help, lyric_list, transport_bar};

/// ┌─────────────────────────────────────────┐
/// │ Title - Artist                          │
/// ├─────────────────────────────────────────┤
/// │  Lyrics (synced / current / upcoming)   │
/// ├─────────────────────────────────────────┤
/// │  Transport                              │
/// └─────────────────────────────────────────┘
pub fn render(frame: &mut Frame, state: &AppState) {
    let root = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(5),    // Lyric list
            Constraint::Length(5), // Transport bar
        ])
        .split(root);

    render_header(frame, state, rows[0]);
    lyric_list::render(frame, state, rows[1]);
    transport_bar::render(frame, state, rows[2]);

    if state.show_help {
        help::render(frame, centered(root, 50, 12));
    }
}

fn render_header(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();
    let line = Line::from(vec![
        Span::styled(
            format!(" {}", state.title),
            Style::default()
                .fg(theme.palette.fg_primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" - {}", state.artist),
            Style::default().fg(theme.palette.fg_secondary),
        ),
        Span::styled("   ? help", Style::default().fg(theme.palette.fg_secondary)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
