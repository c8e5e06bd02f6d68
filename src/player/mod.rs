//! Transport: the clock a sync session reads.
//!
//! A backend (mpv or the silent clock) plays one resource and reports progress
//! as [`PlayerEvent`]s on the app channel. [`Transport`] sends commands to the
//! backend and folds those events into a [`TransportState`].

pub mod clock;
pub mod mpv;

use crate::app::events::PlayerEvent;
use crate::error::SyncError;

pub use clock::ClockBackend;
pub use mpv::MpvHandle;

/// Snapshot of playback as the recorder sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransportState {
    pub position_ms: u64,
    pub is_playing: bool,
    pub duration_ms: Option<u64>,
}

/// Commands a playback backend must understand.
///
/// Progress is not returned from these calls; backends push it as events.
#[allow(async_fn_in_trait)]
pub trait AudioBackend {
    async fn load(&self, uri: &str) -> anyhow::Result<()>;
    async fn play(&self) -> anyhow::Result<()>;
    async fn pause(&self) -> anyhow::Result<()>;
    async fn seek_to_zero(&self) -> anyhow::Result<()>;
    /// Stop playback and let go of the loaded resource.
    async fn unload(&self) -> anyhow::Result<()>;
}

/// Backend picked from config at startup.
#[derive(Debug)]
pub enum AnyBackend {
    Mpv(MpvHandle),
    Clock(ClockBackend),
}

impl AudioBackend for AnyBackend {
    async fn load(&self, uri: &str) -> anyhow::Result<()> {
        match self {
            AnyBackend::Mpv(b) => b.load(uri).await,
            AnyBackend::Clock(b) => b.load(uri).await,
        }
    }

    async fn play(&self) -> anyhow::Result<()> {
        match self {
            AnyBackend::Mpv(b) => b.play().await,
            AnyBackend::Clock(b) => b.play().await,
        }
    }

    async fn pause(&self) -> anyhow::Result<()> {
        match self {
            AnyBackend::Mpv(b) => b.pause().await,
            AnyBackend::Clock(b) => b.pause().await,
        }
    }

    async fn seek_to_zero(&self) -> anyhow::Result<()> {
        match self {
            AnyBackend::Mpv(b) => b.seek_to_zero().await,
            AnyBackend::Clock(b) => b.seek_to_zero().await,
        }
    }

    async fn unload(&self) -> anyhow::Result<()> {
        match self {
            AnyBackend::Mpv(b) => b.unload().await,
            AnyBackend::Clock(b) => b.unload().await,
        }
    }
}

/// What a backend event meant for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportNotice {
    /// Media played to its end. Playback has stopped.
    Ended,
    /// The backend reported a failure it could not recover from.
    Failed(String),
}

/// Owns one backend and the state derived from its events.
#[derive(Debug)]
pub struct Transport<B> {
    backend: Option<B>,
    state: TransportState,
    loaded: bool,
}

impl<B: AudioBackend> Transport<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Some(backend),
            state: TransportState::default(),
            loaded: false,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_released(&self) -> bool {
        self.backend.is_none()
    }

    fn backend(&self) -> Result<&B, SyncError> {
        self.backend
            .as_ref()
            .ok_or_else(|| SyncError::ResourceUnavailable("transport released".into()))
    }

    pub async fn load(&mut self, uri: &str) -> Result<(), SyncError> {
        self.backend()?.load(uri).await.map_err(SyncError::resource)?;
        self.state = TransportState::default();
        self.loaded = true;
        tracing::info!(uri, "audio loaded");
        Ok(())
    }

    pub async fn play(&mut self) -> Result<(), SyncError> {
        if !self.loaded {
            return Err(SyncError::ResourceUnavailable("no audio loaded".into()));
        }
        self.backend()?.play().await.map_err(SyncError::resource)?;
        self.state.is_playing = true;
        Ok(())
    }

    pub async fn pause(&mut self) -> Result<(), SyncError> {
        self.backend()?.pause().await.map_err(SyncError::resource)?;
        self.state.is_playing = false;
        Ok(())
    }

    /// Rewind to the start and stay paused.
    pub async fn stop(&mut self) -> Result<(), SyncError> {
        self.backend()?.seek_to_zero().await.map_err(SyncError::resource)?;
        self.state.is_playing = false;
        self.state.position_ms = 0;
        Ok(())
    }

    /// Stop playback and drop the backend. Safe to call more than once.
    pub async fn release(&mut self) {
        if let Some(backend) = self.backend.take() {
            if let Err(e) = backend.unload().await {
                tracing::warn!("unload audio: {e:#}");
            }
            tracing::debug!("transport released");
        }
        self.state.is_playing = false;
        self.loaded = false;
    }

    /// Fold a backend event into the state.
    pub fn apply(&mut self, ev: &PlayerEvent) -> Option<TransportNotice> {
        // mpv reports its idle state before anything is loaded.
        if self.is_released() || !self.loaded {
            return None;
        }
        match ev {
            PlayerEvent::Started => self.state.is_playing = true,
            PlayerEvent::Paused => self.state.is_playing = false,
            PlayerEvent::Position { seconds } => {
                let ms = seconds_to_ms(*seconds);
                // The clock only moves forward while playing; backend jitter
                // must not pull it back.
                if !self.state.is_playing || ms >= self.state.position_ms {
                    self.state.position_ms = ms;
                }
            }
            PlayerEvent::Duration { seconds } => {
                self.state.duration_ms = (*seconds > 0.0).then(|| seconds_to_ms(*seconds));
            }
            PlayerEvent::Ended => {
                let was_playing = self.state.is_playing;
                self.state.is_playing = false;
                if was_playing {
                    return Some(TransportNotice::Ended);
                }
            }
            PlayerEvent::LoadFailed(e) => {
                // Nothing is left to play; `play` must fail from here on.
                self.state.is_playing = false;
                self.loaded = false;
                tracing::warn!("audio failed: {e}");
                return Some(TransportNotice::Failed(e.clone()));
            }
            PlayerEvent::Error(e) => tracing::warn!("player: {e}"),
        }
        None
    }
}

fn seconds_to_ms(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::AudioBackend;
    use std::sync::{Arc, Mutex};

    /// Backend double that records every command it receives.
    #[derive(Debug, Clone, Default)]
    pub struct FakeBackend {
        pub calls: Arc<Mutex<Vec<String>>>,
        pub fail_load: bool,
    }

    impl FakeBackend {
        pub fn failing_load() -> Self {
            Self {
                fail_load: true,
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }
    }

    impl AudioBackend for FakeBackend {
        async fn load(&self, uri: &str) -> anyhow::Result<()> {
            self.record(format!("load {uri}"));
            if self.fail_load {
                anyhow::bail!("cannot open {uri}");
            }
            Ok(())
        }

        async fn play(&self) -> anyhow::Result<()> {
            self.record("play");
            Ok(())
        }

        async fn pause(&self) -> anyhow::Result<()> {
            self.record("pause");
            Ok(())
        }

        async fn seek_to_zero(&self) -> anyhow::Result<()> {
            self.record("seek0");
            Ok(())
        }

        async fn unload(&self) -> anyhow::Result<()> {
            self.record("unload");
            Ok(())
        }
    }
}
