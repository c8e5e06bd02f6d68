//! Transport bar - timer, progress and the latest message

use super::truncate_str;
use crate::app::state::AppState;
use crate::lyrics::format_clock;
use crate::sync::SyncState;
use crate::tui::theme::{Icons, LoadingSpinner, get_theme};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

pub fn render(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();
    let icons = &theme.icons;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(theme.palette.border))
        .title(format!(" {} Transport ", icons.music))
        .title_style(Style::default().fg(theme.palette.accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Add horizontal padding
    let padded = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner)[1];

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Progress bar
            Constraint::Length(1), // Time + state + next step
            Constraint::Min(0),    // Toast or status
        ])
        .split(padded);

    let content_width = padded.width.saturating_sub(1) as usize;
    let transport = state.transport;

    let ratio = match transport.duration_ms {
        Some(d) if d > 0 => (transport.position_ms as f64 / d as f64).clamp(0.0, 1.0),
        _ => 0.0,
    };
    let progress_line = Line::from(Span::styled(
        render_progress_bar(rows[0].width as usize, ratio, icons),
        Style::default().fg(theme.palette.accent),
    ));
    frame.render_widget(Paragraph::new(progress_line), rows[0]);

    let play_icon = if transport.is_playing { icons.pause } else { icons.play };
    let duration = transport
        .duration_ms
        .map(format_clock)
        .unwrap_or_else(|| "-:--.-".to_string());

    let mut spans = vec![
        Span::styled(play_icon, Style::default().fg(theme.palette.playing)),
        Span::raw(" "),
        Span::styled(
            format!("{} / {}", format_clock(transport.position_ms), duration),
            Style::default()
                .fg(theme.palette.fg_primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            state_label(state),
            Style::default().fg(theme.palette.accent_alt),
        ),
    ];
    if state.publishing {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!("{} {}", icons.upload, LoadingSpinner::frame(state.tick)),
            Style::default().fg(theme.palette.accent_alt),
        ));
    }
    spans.push(Span::styled(
        format!("  {} {}", icons.bullet, state.next_step()),
        Style::default().fg(theme.palette.fg_secondary),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), rows[1]);

    // Toast wins over the status line.
    let message = if let Some(toast) = &state.toast
        && !toast.is_expired()
    {
        let (prefix, color) = theme.toast(toast.kind);
        Line::from(vec![
            Span::styled(format!("{} ", prefix), Style::default().fg(color)),
            Span::styled(
                truncate_str(&toast.message, content_width.saturating_sub(3)),
                Style::default().fg(color),
            ),
        ])
    } else {
        Line::from(Span::styled(
            truncate_str(&state.status, content_width),
            Style::default().fg(theme.palette.fg_secondary),
        ))
    };
    frame.render_widget(Paragraph::new(message), rows[2]);
}

fn state_label(state: &AppState) -> &'static str {
    match state.sync_state {
        Some(SyncState::Idle) => "IDLE",
        Some(SyncState::Armed) => "SYNCING",
        Some(SyncState::Complete) if state.published.is_some() => "PUBLISHED",
        Some(SyncState::Complete) => "COMPLETE",
        Some(SyncState::Discarded) => "DISCARDED",
        None => "",
    }
}

fn render_progress_bar(width: usize, ratio: f64, icons: &Icons) -> String {
    if width < 3 {
        return String::new();
    }

    let filled = ((width - 1) as f64 * ratio).round() as usize;
    let empty = width.saturating_sub(filled + 1);

    let mut bar = String::with_capacity(width * 3);
    for _ in 0..filled {
        bar.push_str(icons.progress_full);
    }
    bar.push_str(icons.progress_head);
    for _ in 0..empty {
        bar.push_str(icons.progress_empty);
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_width() {
        let icons = Icons::nerd();
        assert_eq!(render_progress_bar(2, 0.5, &icons), "");
        assert_eq!(render_progress_bar(5, 0.0, &icons), "●────");
        assert_eq!(render_progress_bar(5, 1.0, &icons), "━━━━●");
        assert_eq!(render_progress_bar(5, 0.5, &icons).chars().count(), 5);
    }
}
