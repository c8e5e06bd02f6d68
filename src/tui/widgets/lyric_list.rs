//! Lyric list: synced lines dimmed with their timestamp, the line under the
//! cursor highlighted, upcoming lines below.

use super::truncate_str;
use crate::app::state::{AppState, LineView};
use crate::lyrics::{SingerPart, format_clock};
use crate::tui::theme::{Theme, get_theme};
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::ops::Range;

pub fn render(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();
    let icons = &theme.icons;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(theme.palette.border))
        .title(format!(
            " {} Lyrics {}/{} ",
            icons.lyrics,
            state.synced_count(),
            state.lines.len()
        ))
        .title_style(Style::default().fg(theme.palette.accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.lines.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "No lyric lines",
            Style::default().fg(theme.palette.fg_secondary),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(empty, inner);
        return;
    }

    let width = inner.width as usize;
    let window = visible_window(state.lines.len(), state.cursor, inner.height as usize);
    let rows: Vec<Line> = window
        .map(|i| render_line(&state.lines[i], i == state.cursor, width, &theme))
        .collect();

    frame.render_widget(Paragraph::new(rows), inner);
}

fn render_line(line: &LineView, is_current: bool, width: usize, theme: &Theme) -> Line<'static> {
    let icons = &theme.icons;
    let (marker, stamp, style) = match line.timestamp_ms {
        Some(ms) => (
            icons.marked,
            format!("{:>7}", format_clock(ms)),
            Style::default().fg(theme.palette.fg_done),
        ),
        None if is_current => (
            icons.selected,
            format!("{:>7}", ""),
            Style::default()
                .fg(theme.palette.accent)
                .bg(theme.palette.bg_highlight)
                .add_modifier(Modifier::BOLD),
        ),
        None => (
            " ",
            format!("{:>7}", ""),
            Style::default().fg(theme.palette.fg_secondary),
        ),
    };

    let singer = match line.singer {
        SingerPart::Both => "   ".to_string(),
        part => format!("{:<3}", part.label()),
    };

    // marker, space, stamp, space, singer, text
    let used = 1 + 1 + 7 + 1 + 3;
    Line::from(vec![
        Span::styled(format!("{marker} "), style),
        Span::styled(stamp, Style::default().fg(theme.palette.fg_secondary)),
        Span::raw(" "),
        Span::styled(singer, Style::default().fg(theme.palette.accent_alt)),
        Span::styled(truncate_str(&line.text, width.saturating_sub(used)), style),
    ])
}

/// Rows to show so the cursor stays in the upper third of the list.
fn visible_window(len: usize, cursor: usize, height: usize) -> Range<usize> {
    if height == 0 || len == 0 {
        return 0..0;
    }
    if len <= height {
        return 0..len;
    }
    let start = cursor.saturating_sub(height / 3).min(len - height);
    start..start + height
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_window() {
        assert_eq!(visible_window(5, 0, 10), 0..5);
        assert_eq!(visible_window(30, 0, 9), 0..9);
        assert_eq!(visible_window(30, 12, 9), 9..18);
        // Completed: cursor == len keeps the tail on screen.
        assert_eq!(visible_window(30, 30, 9), 21..30);
        assert_eq!(visible_window(30, 3, 0), 0..0);
    }
}
