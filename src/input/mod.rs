use crate::app::actions::Action;
use crate::app::events::{Event, InputEvent};
use crate::app::state::AppState;
use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

pub fn spawn_input_task(tx: mpsc::Sender<Event>) {
    tokio::task::spawn_blocking(move || {
        loop {
            if event::poll(std::time::Duration::from_millis(250)).unwrap_or(false) {
                match event::read() {
                    Ok(CtEvent::Key(k)) => {
                        if k.kind == KeyEventKind::Press
                            && tx.blocking_send(Event::Input(InputEvent::Key(k))).is_err()
                        {
                            break;
                        }
                    }
                    Ok(CtEvent::Resize(_, _)) => {
                        if tx
                            .blocking_send(Event::Input(InputEvent::Resize))
                            .is_err()
                        {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(_) => {}
                }
            } else if tx.is_closed() {
                break;
            }
        }
    });
}

pub fn map_input_to_action(state: &AppState, ev: InputEvent) -> Option<Action> {
    match ev {
        InputEvent::Resize => Some(Action::Resize),
        InputEvent::Key(k) if state.show_help => handle_help_overlay(k),
        InputEvent::Key(k) => handle_sync_screen(k),
    }
}

fn handle_sync_screen(k: KeyEvent) -> Option<Action> {
    match k.code {
        KeyCode::Char('c') if k.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char(' ') => Some(Action::TogglePlay),
        KeyCode::Enter | KeyCode::Char('t') => Some(Action::Mark),
        KeyCode::Char('s') => Some(Action::Rewind),
        KeyCode::Char('p') => Some(Action::Publish),
        KeyCode::Esc | KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        _ => None,
    }
}

fn handle_help_overlay(k: KeyEvent) -> Option<Action> {
    match k.code {
        KeyCode::Char('c') if k.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Esc | KeyCode::Char('?') | KeyCode::Enter => Some(Action::ToggleHelp),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_sync_keys() {
        let state = AppState::new();
        let map = |code| map_input_to_action(&state, key(code));
        assert_eq!(map(KeyCode::Char(' ')), Some(Action::TogglePlay));
        assert_eq!(map(KeyCode::Enter), Some(Action::Mark));
        assert_eq!(map(KeyCode::Char('t')), Some(Action::Mark));
        assert_eq!(map(KeyCode::Char('s')), Some(Action::Rewind));
        assert_eq!(map(KeyCode::Char('p')), Some(Action::Publish));
        assert_eq!(map(KeyCode::Esc), Some(Action::Quit));
        assert_eq!(map(KeyCode::Char('x')), None);
    }

    #[test]
    fn test_help_overlay_swallows_sync_keys() {
        let mut state = AppState::new();
        state.show_help = true;
        assert_eq!(map_input_to_action(&state, key(KeyCode::Enter)), Some(Action::ToggleHelp));
        assert_eq!(map_input_to_action(&state, key(KeyCode::Char(' '))), None);
        assert_eq!(map_input_to_action(&state, key(KeyCode::Char('q'))), Some(Action::Quit));
    }

    #[test]
    fn test_ctrl_c_quits() {
        let state = AppState::new();
        let ev = InputEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(map_input_to_action(&state, ev), Some(Action::Quit));
    }
}
