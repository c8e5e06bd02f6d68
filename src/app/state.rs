use crate::error::SyncError;
use crate::lyrics::SingerPart;
use crate::player::{AudioBackend, TransportState};
use crate::publish::SongId;
use crate::sync::{SyncSession, SyncState};

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub created_at: std::time::Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    /// A rejected key press. Nothing changed.
    Hint,
    Error,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Success)
    }

    pub fn hint(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Hint)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, ToastKind::Error)
    }

    fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            kind,
            created_at: std::time::Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        // Errors stay up longer so a failed publish is not missed.
        let ttl = match self.kind {
            ToastKind::Error => 6,
            _ => 3,
        };
        self.created_at.elapsed() > std::time::Duration::from_secs(ttl)
    }
}

impl From<&SyncError> for Toast {
    fn from(err: &SyncError) -> Self {
        match err {
            SyncError::Precondition(p) => Toast::hint(p.to_string()),
            other => Toast::error(other.to_string()),
        }
    }
}

/// One row of the lyric list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineView {
    pub text: String,
    pub singer: SingerPart,
    pub timestamp_ms: Option<u64>,
}

/// Everything the screen draws, copied out of the session after each event.
#[derive(Debug, Default)]
pub struct AppState {
    pub should_quit: bool,
    pub show_help: bool,
    pub tick: u64,

    pub title: String,
    pub artist: String,
    pub lines: Vec<LineView>,
    pub cursor: usize,
    pub transport: TransportState,
    pub sync_state: Option<SyncState>,
    pub publishing: bool,
    pub published: Option<SongId>,
    /// Reason of the last failed publish, cleared on retry.
    pub last_failure: Option<String>,

    pub toast: Option<Toast>,
    pub status: String,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh<B: AudioBackend>(&mut self, session: &SyncSession<B>) {
        let info = session.info();
        self.title.clone_from(&info.title);
        self.artist.clone_from(&info.artist);

        let synced = session.lines();
        self.lines = session
            .queue()
            .iter()
            .enumerate()
            .map(|(i, raw)| LineView {
                text: raw.text().to_string(),
                singer: raw.singer(),
                timestamp_ms: synced.get(i).map(|l| l.timestamp_ms),
            })
            .collect();

        self.cursor = session.cursor();
        self.transport = session.transport_state();
        self.sync_state = Some(session.state());
        self.publishing = session.is_publishing();
        self.published = session.published().cloned();
    }

    pub fn synced_count(&self) -> usize {
        self.lines.iter().filter(|l| l.timestamp_ms.is_some()).count()
    }

    /// One-line hint for the next thing to do.
    pub fn next_step(&self) -> &'static str {
        if self.published.is_some() {
            return "Published. q to quit";
        }
        if self.publishing {
            return "Publishing...";
        }
        match self.sync_state {
            Some(SyncState::Idle) if self.cursor == 0 => "Space to start playback",
            Some(SyncState::Idle) => "Paused. Space to resume",
            Some(SyncState::Armed) => "Enter to mark the highlighted line",
            Some(SyncState::Complete) if self.last_failure.is_some() => "p to retry publish",
            Some(SyncState::Complete) => "p to publish",
            Some(SyncState::Discarded) | None => "",
        }
    }
}
