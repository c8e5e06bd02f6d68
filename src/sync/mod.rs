//! The tap-to-sync recorder.
//!
//! A [`SyncSession`] walks a queue of lyric lines while the transport plays.
//! Every mark pins the line under the cursor to the current playback
//! position. Once the last line is pinned the session can be published; a
//! failed publish keeps every pinned line so the user can retry.

use crate::app::events::PlayerEvent;
use crate::error::{Precondition, SyncError};
use crate::lyrics::{RawLyricLine, SyncedLyricLine};
use crate::player::{AudioBackend, Transport, TransportNotice, TransportState};
use crate::publish::{Artifact, Catalog, PublishResult, SongId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Not playing and lines remain.
    Idle,
    /// Playing; marks are accepted.
    Armed,
    /// Every line has a timestamp.
    Complete,
    Discarded,
}

/// What the session is syncing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongInfo {
    pub title: String,
    pub artist: String,
    pub audio: String,
    pub cover: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// A line was pinned and more remain.
    Marked { index: usize, timestamp_ms: u64 },
    /// The last line was pinned.
    Completed { timestamp_ms: u64 },
}

#[derive(Debug)]
pub struct SyncSession<B> {
    info: SongInfo,
    queue: Vec<RawLyricLine>,
    cursor: usize,
    lines: Vec<SyncedLyricLine>,
    transport: Transport<B>,
    discarded: bool,
    in_flight: Option<u64>,
    attempts: u64,
    published: Option<SongId>,
}

impl<B: AudioBackend> SyncSession<B> {
    /// Load the audio and build an idle session over `queue`.
    pub async fn start(
        info: SongInfo,
        queue: Vec<RawLyricLine>,
        backend: B,
    ) -> Result<Self, SyncError> {
        let mut transport = Transport::new(backend);
        transport.load(&info.audio).await?;
        tracing::info!(title = %info.title, lines = queue.len(), "sync session started");
        Ok(Self {
            info,
            queue,
            cursor: 0,
            lines: Vec::new(),
            transport,
            discarded: false,
            in_flight: None,
            attempts: 0,
            published: None,
        })
    }

    pub fn state(&self) -> SyncState {
        if self.discarded {
            SyncState::Discarded
        } else if !self.queue.is_empty() && self.cursor == self.queue.len() {
            SyncState::Complete
        } else if self.transport.state().is_playing && self.cursor < self.queue.len() {
            SyncState::Armed
        } else {
            SyncState::Idle
        }
    }

    pub fn info(&self) -> &SongInfo {
        &self.info
    }

    pub fn queue(&self) -> &[RawLyricLine] {
        &self.queue
    }

    /// Index of the next line to be marked.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn lines(&self) -> &[SyncedLyricLine] {
        &self.lines
    }

    pub fn transport_state(&self) -> TransportState {
        self.transport.state()
    }

    pub fn is_publishing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn published(&self) -> Option<&SongId> {
        self.published.as_ref()
    }

    /// Reject anything that would change a session that is finished or frozen.
    fn ensure_editable(&self) -> Result<(), Precondition> {
        if self.discarded {
            Err(Precondition::Discarded)
        } else if self.published.is_some() {
            Err(Precondition::AlreadyPublished)
        } else if self.in_flight.is_some() {
            Err(Precondition::PublishInFlight)
        } else {
            Ok(())
        }
    }

    pub async fn play(&mut self) -> Result<(), SyncError> {
        self.ensure_editable()?;
        self.transport.play().await
    }

    pub async fn pause(&mut self) -> Result<(), SyncError> {
        if self.discarded {
            return Err(Precondition::Discarded.into());
        }
        if self.transport.is_released() {
            return Ok(());
        }
        self.transport.pause().await
    }

    pub async fn toggle(&mut self) -> Result<(), SyncError> {
        if self.transport.state().is_playing {
            self.pause().await
        } else {
            self.play().await
        }
    }

    /// Stop at 0:00 and start the pass over: every mark is dropped.
    pub async fn rewind(&mut self) -> Result<(), SyncError> {
        self.ensure_editable()?;
        self.transport.stop().await?;
        if !self.lines.is_empty() {
            tracing::info!(dropped = self.lines.len(), "sync rewound");
        }
        self.cursor = 0;
        self.lines.clear();
        Ok(())
    }

    /// Pin the line under the cursor to the current position.
    pub fn mark(&mut self) -> Result<MarkOutcome, SyncError> {
        if self.discarded {
            return Err(Precondition::Discarded.into());
        }
        if self.cursor >= self.queue.len() {
            return Err(Precondition::NoRemainingLines.into());
        }
        let transport = self.transport.state();
        if !transport.is_playing {
            return Err(Precondition::NotPlaying.into());
        }

        // A backend that jumps back between two taps must not reorder lines.
        let floor = self.lines.last().map_or(0, |l| l.timestamp_ms);
        let timestamp_ms = transport.position_ms.max(floor);

        let index = self.cursor;
        self.lines
            .push(SyncedLyricLine::new(timestamp_ms, &self.queue[index]));
        self.cursor += 1;
        tracing::debug!(index, timestamp_ms, "line marked");

        if self.cursor == self.queue.len() {
            tracing::info!(lines = self.lines.len(), "sync complete");
            Ok(MarkOutcome::Completed { timestamp_ms })
        } else {
            Ok(MarkOutcome::Marked { index, timestamp_ms })
        }
    }

    /// Feed a backend event through the transport.
    pub fn on_player_event(&mut self, ev: &PlayerEvent) -> Option<TransportNotice> {
        if self.discarded {
            return None;
        }
        self.transport.apply(ev)
    }

    /// Abandon the session. Stops and releases the audio.
    pub async fn discard(&mut self) {
        if self.discarded {
            return;
        }
        self.discarded = true;
        if !self.transport.is_released()
            && let Err(e) = self.transport.stop().await
        {
            tracing::debug!("stop on discard: {e}");
        }
        self.transport.release().await;
        tracing::info!(marked = self.lines.len(), "sync session discarded");
    }

    /// Freeze the session and hand out the artifact to submit.
    ///
    /// The returned attempt number must be passed back to
    /// [`finish_publish`](Self::finish_publish).
    pub fn begin_publish(&mut self) -> Result<(u64, Artifact), SyncError> {
        self.ensure_editable()?;
        if self.state() != SyncState::Complete {
            return Err(Precondition::NotComplete.into());
        }

        self.attempts += 1;
        self.in_flight = Some(self.attempts);
        let artifact = Artifact {
            title: self.info.title.clone(),
            artist: self.info.artist.clone(),
            audio: self.info.audio.clone(),
            cover: self.info.cover.clone(),
            lyrics: self.lines.clone(),
        };
        tracing::info!(attempt = self.attempts, "publish started");
        Ok((self.attempts, artifact))
    }

    /// Apply a catalog outcome. Returns `None` when the outcome no longer
    /// belongs to this session (discarded, or a superseded attempt).
    pub async fn finish_publish(
        &mut self,
        attempt: u64,
        outcome: Result<SongId, String>,
    ) -> Option<PublishResult> {
        if self.discarded || self.in_flight != Some(attempt) {
            tracing::debug!(attempt, "ignoring stale publish outcome");
            return None;
        }
        self.in_flight = None;
        self.transport.release().await;

        match outcome {
            Ok(id) => {
                tracing::info!(%id, "song published");
                self.published = Some(id.clone());
                Some(PublishResult::Published(id))
            }
            Err(reason) => {
                tracing::warn!(attempt, "publish failed: {reason}");
                Some(PublishResult::Failed(reason))
            }
        }
    }
}

/// Send one artifact to the catalog, flattening the error for
/// [`SyncSession::finish_publish`].
pub async fn submit_artifact<C: Catalog>(
    catalog: &C,
    artifact: Artifact,
) -> Result<SongId, String> {
    catalog.submit(artifact).await.map_err(|e| format!("{e:#}"))
}

/// Submit a complete session and wait for the catalog.
///
/// The sync screen runs the same steps with the submit spawned, so the event
/// loop never blocks on the network.
#[cfg(test)]
pub async fn publish<B: AudioBackend, C: Catalog>(
    session: &mut SyncSession<B>,
    catalog: &C,
) -> Result<PublishResult, SyncError> {
    let (attempt, artifact) = session.begin_publish()?;
    let outcome = submit_artifact(catalog, artifact).await;
    session
        .finish_publish(attempt, outcome)
        .await
        .ok_or(SyncError::Precondition(Precondition::Discarded))
}
