use crate::publish::SongId;

#[derive(Debug, Clone)]
pub enum Event {
    Input(InputEvent),
    Player(PlayerEvent),
    Publish(PublishEvent),
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Key(crossterm::event::KeyEvent),
    Resize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Started,
    Paused,
    Position { seconds: f64 },
    Duration { seconds: f64 },
    Ended,
    /// The loaded resource could not be played.
    LoadFailed(String),
    Error(String),
}

/// Outcome of a spawned catalog submission, tagged with the attempt that
/// produced it.
#[derive(Debug, Clone)]
pub struct PublishEvent {
    pub attempt: u64,
    pub outcome: Result<SongId, String>,
}
