pub mod actions;
pub mod events;
pub mod state;

use crate::error::{Precondition, SyncError};
use crate::input;
use crate::player::{AudioBackend, TransportNotice};
use crate::publish::{Catalog, PublishResult, SongId};
use crate::sync::{self, MarkOutcome, SyncSession, SyncState};
use crate::tui::{self, TuiTerminal};
use actions::Action;
use events::{Event, PlayerEvent, PublishEvent};
use state::{AppState, Toast};
use tokio::sync::mpsc;

/// The interactive sync screen: one session, one catalog, one event loop.
pub struct App<B, C> {
    state: AppState,
    session: SyncSession<B>,
    catalog: C,
    /// Set when the audio died under an unfinished pass.
    fatal: Option<SyncError>,
}

impl<B: AudioBackend, C: Catalog> App<B, C> {
    pub fn new(session: SyncSession<B>, catalog: C) -> Self {
        let mut state = AppState::new();
        state.refresh(&session);
        Self {
            state,
            session,
            catalog,
            fatal: None,
        }
    }

    /// Drive the screen until the user quits. Returns the id the song was
    /// published under, if it was.
    pub async fn run(
        &mut self,
        terminal: &mut TuiTerminal,
        tx: mpsc::Sender<Event>,
        mut rx: mpsc::Receiver<Event>,
    ) -> anyhow::Result<Option<SongId>> {
        input::spawn_input_task(tx.clone());

        tui::draw(terminal, &mut self.state)?;

        while let Some(ev) = rx.recv().await {
            self.handle_event(ev, &tx).await;
            if self.state.should_quit {
                break;
            }
            self.state.tick = self.state.tick.wrapping_add(1);
            self.state.refresh(&self.session);
            tui::draw(terminal, &mut self.state)?;
        }

        self.shutdown().await;
        if let Some(e) = self.fatal.take() {
            return Err(e.into());
        }
        Ok(self.session.published().cloned())
    }

    async fn handle_event(&mut self, ev: Event, tx: &mpsc::Sender<Event>) {
        match ev {
            Event::Input(input_ev) => {
                if let Some(action) = input::map_input_to_action(&self.state, input_ev) {
                    self.handle_action(action, tx).await;
                }
            }
            Event::Player(pe) => self.handle_player(pe, tx).await,
            Event::Publish(pe) => self.handle_publish(pe).await,
        }
    }

    async fn shutdown(&mut self) {
        if self.session.published().is_none() {
            self.session.discard().await;
        }
    }

    async fn handle_action(&mut self, action: Action, tx: &mpsc::Sender<Event>) {
        match action {
            Action::Quit => self.state.should_quit = true,
            Action::ToggleHelp => self.state.show_help = !self.state.show_help,
            Action::Resize => {}
            Action::TogglePlay => {
                if let Err(e) = self.session.toggle().await {
                    self.state.toast = Some(Toast::from(&e));
                }
            }
            Action::Rewind => match self.session.rewind().await {
                Ok(()) => {
                    self.state.status = "Rewound. Every line needs a new mark".into();
                }
                Err(e) => self.state.toast = Some(Toast::from(&e)),
            },
            Action::Mark => match self.session.mark() {
                Ok(MarkOutcome::Marked { index, timestamp_ms }) => {
                    self.state.status = format!(
                        "Line {} at {}",
                        index + 1,
                        crate::lyrics::format_clock(timestamp_ms)
                    );
                }
                Ok(MarkOutcome::Completed { timestamp_ms }) => {
                    self.state.status = format!(
                        "Last line at {}",
                        crate::lyrics::format_clock(timestamp_ms)
                    );
                    self.state.toast = Some(Toast::success("All lines synced. p to publish"));
                }
                // Tapping past the last line asks to finalize.
                Err(e) if e.precondition() == Some(Precondition::NoRemainingLines)
                    && self.session.state() == SyncState::Complete =>
                {
                    self.start_publish(tx).await;
                }
                Err(e) => self.state.toast = Some(Toast::from(&e)),
            },
            Action::Publish => self.start_publish(tx).await,
        }
    }

    async fn start_publish(&mut self, tx: &mpsc::Sender<Event>) {
        let (attempt, artifact) = match self.session.begin_publish() {
            Ok(v) => v,
            Err(e) => {
                self.state.toast = Some(Toast::from(&e));
                return;
            }
        };
        if let Err(e) = self.session.pause().await {
            tracing::debug!("pause before publish: {e}");
        }
        self.state.last_failure = None;
        self.state.status = format!("Publishing {} lines...", artifact.lyrics.len());

        let catalog = self.catalog.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let outcome = sync::submit_artifact(&catalog, artifact).await;
            let _ = tx.send(Event::Publish(PublishEvent { attempt, outcome })).await;
        });
    }

    async fn handle_publish(&mut self, ev: PublishEvent) {
        match self.session.finish_publish(ev.attempt, ev.outcome).await {
            Some(PublishResult::Published(id)) => {
                self.state.status = format!("Published as {id}, pending review");
                self.state.toast = Some(Toast::success(format!("Published as {id}")));
            }
            Some(PublishResult::Failed(reason)) => {
                self.state.toast = Some(Toast::from(&SyncError::PublishFailure(reason.clone())));
                self.state.status = "Sync kept. p to retry".into();
                self.state.last_failure = Some(reason);
            }
            None => {}
        }
    }

    async fn handle_player(&mut self, pe: PlayerEvent, tx: &mpsc::Sender<Event>) {
        if let PlayerEvent::Error(e) = &pe {
            self.state.status = format!("Player: {e}");
        }
        match self.session.on_player_event(&pe) {
            Some(TransportNotice::Ended) => {
                if self.session.state() == SyncState::Complete {
                    self.start_publish(tx).await;
                } else {
                    let left = self.session.queue().len() - self.session.cursor();
                    self.state.status =
                        format!("Song ended with {left} lines unsynced. s to rewind");
                }
            }
            // Finished marks do not need the audio any more.
            Some(TransportNotice::Failed(e)) if self.session.state() == SyncState::Complete => {
                self.state.toast = Some(Toast::error(format!("Audio lost: {e}")));
                self.state.status = "Audio lost. Marks kept, p to publish".into();
            }
            Some(TransportNotice::Failed(e)) => {
                tracing::error!("audio failed mid-sync: {e}");
                self.session.discard().await;
                self.fatal = Some(SyncError::ResourceUnavailable(e));
                self.state.should_quit = true;
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::ToastKind;
    use crate::lyrics::segment;
    use crate::player::testing::FakeBackend;
    use crate::publish::Artifact;
    use crate::sync::SongInfo;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Default)]
    struct RecordingCatalog {
        submitted: Arc<Mutex<Vec<Artifact>>>,
    }

    impl Catalog for RecordingCatalog {
        async fn submit(&self, artifact: Artifact) -> anyhow::Result<SongId> {
            self.submitted.lock().unwrap().push(artifact);
            Ok(SongId("s_app".into()))
        }
    }

    async fn app(text: &str) -> App<FakeBackend, RecordingCatalog> {
        let info = SongInfo {
            title: "Song".into(),
            artist: "Band".into(),
            audio: "song.mp3".into(),
            cover: None,
        };
        let session = SyncSession::start(info, segment(text), FakeBackend::default())
            .await
            .unwrap();
        App::new(session, RecordingCatalog::default())
    }

    #[tokio::test]
    async fn test_mark_before_play_shows_hint() {
        let mut app = app("a\nb").await;
        let (tx, _rx) = mpsc::channel(8);
        app.handle_action(Action::Mark, &tx).await;
        let toast = app.state.toast.clone().unwrap();
        assert_eq!(toast.kind, ToastKind::Hint);
        assert_eq!(toast.message, "start playback first");
        assert_eq!(app.session.cursor(), 0);
    }

    #[tokio::test]
    async fn test_full_pass_publishes_through_event() {
        let mut app = app("a\nb").await;
        let (tx, mut rx) = mpsc::channel(8);

        app.handle_action(Action::TogglePlay, &tx).await;
        app.handle_event(Event::Player(PlayerEvent::Position { seconds: 1.0 }), &tx).await;
        app.handle_action(Action::Mark, &tx).await;
        app.handle_event(Event::Player(PlayerEvent::Position { seconds: 2.0 }), &tx).await;
        app.handle_action(Action::Mark, &tx).await;
        assert_eq!(app.session.state(), SyncState::Complete);

        // One more tap finalizes.
        app.handle_action(Action::Mark, &tx).await;
        assert!(app.session.is_publishing());

        let ev = rx.recv().await.unwrap();
        app.handle_event(ev, &tx).await;
        assert_eq!(app.session.published(), Some(&SongId("s_app".into())));
        let sent = app.catalog.submitted.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].lyrics.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_publish_is_retryable() {
        let mut app = app("a").await;
        let (tx, _rx) = mpsc::channel(8);
        app.handle_action(Action::TogglePlay, &tx).await;
        app.handle_action(Action::Mark, &tx).await;

        let (attempt, _) = app.session.begin_publish().unwrap();
        app.handle_publish(PublishEvent { attempt, outcome: Err("HTTP 503".into()) }).await;
        assert_eq!(app.state.last_failure.as_deref(), Some("HTTP 503"));
        assert_eq!(app.session.lines().len(), 1);

        app.state.refresh(&app.session);
        assert_eq!(app.state.next_step(), "p to retry publish");
    }

    #[tokio::test]
    async fn test_quit_discards_unpublished() {
        let mut app = app("a\nb").await;
        let (tx, _rx) = mpsc::channel(8);
        app.handle_action(Action::Quit, &tx).await;
        assert!(app.state.should_quit);
        app.shutdown().await;
        assert_eq!(app.session.state(), SyncState::Discarded);
    }

    #[tokio::test]
    async fn test_song_end_with_lines_left() {
        let mut app = app("a\nb\nc").await;
        let (tx, _rx) = mpsc::channel(8);
        app.handle_action(Action::TogglePlay, &tx).await;
        app.handle_action(Action::Mark, &tx).await;
        app.handle_event(Event::Player(PlayerEvent::Ended), &tx).await;
        assert_eq!(app.state.status, "Song ended with 2 lines unsynced. s to rewind");
        assert!(!app.session.is_publishing());
    }

    #[tokio::test]
    async fn test_natural_end_publishes_complete_session() {
        let mut app = app("a\nb").await;
        let (tx, mut rx) = mpsc::channel(8);
        app.handle_action(Action::TogglePlay, &tx).await;
        app.handle_event(Event::Player(PlayerEvent::Position { seconds: 1.0 }), &tx).await;
        app.handle_action(Action::Mark, &tx).await;
        app.handle_event(Event::Player(PlayerEvent::Position { seconds: 2.0 }), &tx).await;
        app.handle_action(Action::Mark, &tx).await;

        app.handle_event(Event::Player(PlayerEvent::Ended), &tx).await;
        assert!(app.session.is_publishing());

        let ev = rx.recv().await.unwrap();
        app.handle_event(ev, &tx).await;
        assert_eq!(app.session.published(), Some(&SongId("s_app".into())));
        assert_eq!(app.catalog.submitted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_audio_failure_ends_unfinished_session() {
        let mut app = app("a\nb").await;
        let (tx, _rx) = mpsc::channel(8);
        app.handle_action(Action::TogglePlay, &tx).await;
        app.handle_action(Action::Mark, &tx).await;

        let failed = PlayerEvent::LoadFailed("unrecognized file format".into());
        app.handle_event(Event::Player(failed), &tx).await;
        assert!(app.state.should_quit);
        assert_eq!(app.session.state(), SyncState::Discarded);
        assert!(matches!(app.fatal, Some(SyncError::ResourceUnavailable(_))));
        assert!(app.catalog.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_audio_failure_after_last_mark_keeps_sync() {
        let mut app = app("a").await;
        let (tx, mut rx) = mpsc::channel(8);
        app.handle_action(Action::TogglePlay, &tx).await;
        app.handle_action(Action::Mark, &tx).await;

        app.handle_event(Event::Player(PlayerEvent::LoadFailed("stream lost".into())), &tx).await;
        assert!(!app.state.should_quit);
        assert!(app.fatal.is_none());
        assert_eq!(app.session.state(), SyncState::Complete);
        assert_eq!(app.state.toast.clone().unwrap().kind, ToastKind::Error);

        app.handle_action(Action::Publish, &tx).await;
        let ev = rx.recv().await.unwrap();
        app.handle_event(ev, &tx).await;
        assert_eq!(app.session.published(), Some(&SongId("s_app".into())));
    }
}
