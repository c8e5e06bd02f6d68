//! Error kinds surfaced by a sync session.
//!
//! Collaborator failures (mpv, the catalog) arrive as `anyhow` errors and are
//! folded into one of these before they reach the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The audio resource could not be opened, or the transport stopped
    /// answering. The session cannot run without its clock.
    #[error("audio unavailable: {0}")]
    ResourceUnavailable(String),

    /// The request does not fit the current session state. Nothing changed.
    #[error("{0}")]
    Precondition(#[from] Precondition),

    /// The catalog rejected or never received the artifact. Session state is
    /// kept so the publish can be retried.
    #[error("publish failed: {0}")]
    PublishFailure(String),
}

impl SyncError {
    pub fn resource(err: anyhow::Error) -> Self {
        Self::ResourceUnavailable(format!("{err:#}"))
    }

    /// The precondition kind, if this is a local rejection.
    pub fn precondition(&self) -> Option<Precondition> {
        match self {
            Self::Precondition(p) => Some(*p),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Precondition {
    #[error("start playback first")]
    NotPlaying,
    #[error("every line is already synced")]
    NoRemainingLines,
    #[error("session was discarded")]
    Discarded,
    #[error("sync is not complete yet")]
    NotComplete,
    #[error("publish already in progress")]
    PublishInFlight,
    #[error("song was already published")]
    AlreadyPublished,
}
