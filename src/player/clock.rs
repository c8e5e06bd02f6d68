//! Silent transport: a wall clock that behaves like a player with no sound.
//!
//! Useful for syncing against audio played elsewhere, or on machines without
//! mpv. Position is pushed every `tick` while running.

use crate::app::events::{Event, PlayerEvent};
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::{sync::mpsc, task::JoinHandle};

#[derive(Debug)]
pub struct ClockBackend {
    event_tx: mpsc::Sender<Event>,
    tick: Duration,
    inner: Mutex<ClockInner>,
}

#[derive(Debug, Default)]
struct ClockInner {
    /// Time accumulated before the current run.
    base: Duration,
    running_since: Option<Instant>,
    ticker: Option<JoinHandle<()>>,
}

impl ClockInner {
    fn position(&self) -> Duration {
        self.base + self.running_since.map(|s| s.elapsed()).unwrap_or_default()
    }

    fn halt(&mut self) {
        if let Some(t) = self.ticker.take() {
            t.abort();
        }
        self.base = self.position();
        self.running_since = None;
    }
}

impl ClockBackend {
    pub fn new(event_tx: mpsc::Sender<Event>, tick: Duration) -> Self {
        Self {
            event_tx,
            tick: tick.max(Duration::from_millis(1)),
            inner: Mutex::new(ClockInner::default()),
        }
    }

    pub async fn load(&self, uri: &str) -> anyhow::Result<()> {
        // Remote references cannot be checked without playing them.
        if !uri.contains("://") && !Path::new(uri).exists() {
            anyhow::bail!("no such file: {uri}");
        }
        let mut inner = self.lock()?;
        inner.halt();
        inner.base = Duration::ZERO;
        Ok(())
    }

    pub async fn play(&self) -> anyhow::Result<()> {
        let start = {
            let mut inner = self.lock()?;
            if inner.running_since.is_some() {
                return Ok(());
            }
            let now = Instant::now();
            inner.running_since = Some(now);

            let base = inner.base;
            let tx = self.event_tx.clone();
            let mut interval = tokio::time::interval(self.tick);
            inner.ticker = Some(tokio::spawn(async move {
                loop {
                    interval.tick().await;
                    let seconds = (base + now.elapsed()).as_secs_f64();
                    if tx
                        .send(Event::Player(PlayerEvent::Position { seconds }))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
            }));
            inner.base
        };
        tracing::debug!(from_ms = start.as_millis() as u64, "clock started");
        self.emit(PlayerEvent::Started).await;
        Ok(())
    }

    pub async fn pause(&self) -> anyhow::Result<()> {
        let position = {
            let mut inner = self.lock()?;
            inner.halt();
            inner.base
        };
        self.emit(PlayerEvent::Paused).await;
        self.emit(PlayerEvent::Position {
            seconds: position.as_secs_f64(),
        })
        .await;
        Ok(())
    }

    pub async fn seek_to_zero(&self) -> anyhow::Result<()> {
        {
            let mut inner = self.lock()?;
            inner.halt();
            inner.base = Duration::ZERO;
        }
        self.emit(PlayerEvent::Paused).await;
        self.emit(PlayerEvent::Position { seconds: 0.0 }).await;
        Ok(())
    }

    pub async fn unload(&self) -> anyhow::Result<()> {
        let mut inner = self.lock()?;
        inner.halt();
        inner.base = Duration::ZERO;
        Ok(())
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, ClockInner>> {
        self.inner
            .lock()
            .map_err(|_| anyhow::anyhow!("clock state poisoned"))
    }

    async fn emit(&self, ev: PlayerEvent) {
        let _ = self.event_tx.send(Event::Player(ev)).await;
    }
}

impl Drop for ClockBackend {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.halt();
        }
    }
}
