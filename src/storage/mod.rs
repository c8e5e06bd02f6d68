pub mod media;

use crate::lyrics::SyncedLyricLine;
use crate::publish::{Artifact, Catalog, SongId};
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};

/// Review state of a catalog song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SongStatus {
    PendingReview,
    Approved,
    Rejected,
}

impl SongStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SongStatus::PendingReview => "pending_review",
            SongStatus::Approved => "approved",
            SongStatus::Rejected => "rejected",
        }
    }

    fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "pending_review" => Ok(SongStatus::PendingReview),
            "approved" => Ok(SongStatus::Approved),
            "rejected" => Ok(SongStatus::Rejected),
            other => anyhow::bail!("unknown song status {other:?}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredSong {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub audio: String,
    pub cover: Option<String>,
    pub lyrics: Vec<SyncedLyricLine>,
    pub status: SongStatus,
    pub created_at: i64,
    pub reviewed_at: Option<i64>,
}

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let conn = Connection::open(path).with_context(|| format!("open {}", path.display()))?;
        let s = Self { conn };
        s.init_schema()?;
        Ok(s)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let s = Self {
            conn: Connection::open_in_memory().context("open in-memory db")?,
        };
        s.init_schema()?;
        Ok(s)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                r#"
CREATE TABLE IF NOT EXISTS songs (
  id TEXT PRIMARY KEY,
  title TEXT NOT NULL,
  artist TEXT NOT NULL,
  audio TEXT NOT NULL,
  cover TEXT,
  lyrics_json TEXT NOT NULL,
  status TEXT NOT NULL DEFAULT 'pending_review',
  created_at INTEGER NOT NULL,
  reviewed_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_songs_status ON songs(status, created_at DESC);
"#,
            )
            .context("init schema")?;
        Ok(())
    }

    /// Insert a new song awaiting review.
    pub fn insert_song(&self, id: &str, artifact: &Artifact, now_unix: i64) -> anyhow::Result<()> {
        let lyrics_json = serde_json::to_string(&artifact.lyrics).context("encode lyrics")?;
        self.conn
            .execute(
                r#"
INSERT INTO songs(id, title, artist, audio, cover, lyrics_json, status, created_at)
VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#,
                params![
                    id,
                    artifact.title,
                    artifact.artist,
                    artifact.audio,
                    artifact.cover,
                    lyrics_json,
                    SongStatus::PendingReview.as_str(),
                    now_unix
                ],
            )
            .context("insert song")?;
        Ok(())
    }

    pub fn get_song(&self, id: &str) -> anyhow::Result<Option<StoredSong>> {
        let row = self
            .conn
            .query_row(
                r#"
SELECT id, title, artist, audio, cover, lyrics_json, status, created_at, reviewed_at
FROM songs WHERE id=?1
"#,
                params![id],
                raw_song,
            )
            .optional()
            .context("query song")?;
        row.map(RawSong::decode).transpose()
    }

    /// Songs with the given status, newest first.
    pub fn list_songs(&self, status: SongStatus, limit: usize) -> anyhow::Result<Vec<StoredSong>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
SELECT id, title, artist, audio, cover, lyrics_json, status, created_at, reviewed_at
FROM songs
WHERE status=?1
ORDER BY created_at DESC, id
LIMIT ?2
"#,
            )
            .context("prepare list songs")?;

        let rows = stmt
            .query_map(params![status.as_str(), limit as i64], raw_song)
            .context("query songs")?;

        let mut songs = Vec::new();
        for row in rows {
            songs.push(row.context("read song row")?.decode()?);
        }
        Ok(songs)
    }

    /// Move a pending song to `status`. Returns false if no pending song has that id.
    pub fn review(&self, id: &str, status: SongStatus, now_unix: i64) -> anyhow::Result<bool> {
        let changed = self
            .conn
            .execute(
                "UPDATE songs SET status=?2, reviewed_at=?3 WHERE id=?1 AND status=?4",
                params![id, status.as_str(), now_unix, SongStatus::PendingReview.as_str()],
            )
            .context("review song")?;
        Ok(changed == 1)
    }
}

struct RawSong {
    id: String,
    title: String,
    artist: String,
    audio: String,
    cover: Option<String>,
    lyrics_json: String,
    status: String,
    created_at: i64,
    reviewed_at: Option<i64>,
}

fn raw_song(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSong> {
    Ok(RawSong {
        id: row.get(0)?,
        title: row.get(1)?,
        artist: row.get(2)?,
        audio: row.get(3)?,
        cover: row.get(4)?,
        lyrics_json: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
        reviewed_at: row.get(8)?,
    })
}

impl RawSong {
    fn decode(self) -> anyhow::Result<StoredSong> {
        let lyrics = serde_json::from_str(&self.lyrics_json)
            .with_context(|| format!("decode lyrics of {}", self.id))?;
        Ok(StoredSong {
            status: SongStatus::parse(&self.status)?,
            id: self.id,
            title: self.title,
            artist: self.artist,
            audio: self.audio,
            cover: self.cover,
            lyrics,
            created_at: self.created_at,
            reviewed_at: self.reviewed_at,
        })
    }
}

pub fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

/// rusqlite-backed catalog living in the data dir.
///
/// Connections are opened per operation on the blocking pool, so the handle
/// is cheap to clone into spawned tasks.
#[derive(Debug, Clone)]
pub struct LocalCatalog {
    db_path: PathBuf,
    media_dir: PathBuf,
}

impl LocalCatalog {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            db_path: data_dir.join("catalog.sqlite3"),
            media_dir: data_dir.join("media"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn open(&self) -> anyhow::Result<Storage> {
        Storage::open(&self.db_path)
    }

    /// Stash media and insert the song. Blocking.
    pub fn submit_blocking(&self, mut artifact: Artifact) -> anyhow::Result<SongId> {
        artifact.audio = media::stash(&self.media_dir, &artifact.audio).context("stash audio")?;
        if let Some(cover) = artifact.cover.take() {
            artifact.cover = Some(media::stash(&self.media_dir, &cover).context("stash cover")?);
        }

        let now = time::OffsetDateTime::now_utc();
        let id = song_id(&artifact, now.unix_timestamp_nanos());
        self.open()?.insert_song(&id, &artifact, now.unix_timestamp())?;
        tracing::info!(%id, title = %artifact.title, lines = artifact.lyrics.len(), "song queued for review");
        Ok(SongId(id))
    }
}

impl Catalog for LocalCatalog {
    async fn submit(&self, artifact: Artifact) -> anyhow::Result<SongId> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.submit_blocking(artifact))
            .await
            .context("catalog task panicked")?
    }
}

fn song_id(artifact: &Artifact, nonce: i128) -> String {
    let mut hasher = Sha1::new();
    for part in [&artifact.title, &artifact.artist, &artifact.audio] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update(nonce.to_le_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("s_{}", &digest[..12])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::SingerPart;

    fn artifact(title: &str) -> Artifact {
        Artifact {
            title: title.into(),
            artist: "Duo".into(),
            audio: "https://cdn.example.com/a.mp3".into(),
            cover: None,
            lyrics: vec![
                SyncedLyricLine { timestamp_ms: 1000, text: "Hello".into(), singer: SingerPart::A },
                SyncedLyricLine { timestamp_ms: 3500, text: "World".into(), singer: SingerPart::B },
            ],
        }
    }

    #[test]
    fn test_insert_and_get() {
        let s = Storage::open_in_memory().unwrap();
        s.insert_song("s_1", &artifact("One"), 100).unwrap();

        let song = s.get_song("s_1").unwrap().unwrap();
        assert_eq!(song.title, "One");
        assert_eq!(song.status, SongStatus::PendingReview);
        assert_eq!(song.lyrics, artifact("One").lyrics);
        assert!(s.get_song("s_2").unwrap().is_none());
    }

    #[test]
    fn test_review_workflow() {
        let s = Storage::open_in_memory().unwrap();
        s.insert_song("s_1", &artifact("One"), 100).unwrap();
        s.insert_song("s_2", &artifact("Two"), 200).unwrap();
        s.insert_song("s_3", &artifact("Three"), 300).unwrap();

        let pending = s.list_songs(SongStatus::PendingReview, 10).unwrap();
        let ids: Vec<_> = pending.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["s_3", "s_2", "s_1"]);

        assert!(s.review("s_2", SongStatus::Approved, 400).unwrap());
        assert!(s.review("s_3", SongStatus::Rejected, 400).unwrap());
        // Only pending songs can be reviewed.
        assert!(!s.review("s_2", SongStatus::Rejected, 500).unwrap());
        assert!(!s.review("missing", SongStatus::Approved, 500).unwrap());

        let approved = s.list_songs(SongStatus::Approved, 10).unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, "s_2");
        assert_eq!(approved[0].reviewed_at, Some(400));
        assert_eq!(s.list_songs(SongStatus::PendingReview, 10).unwrap().len(), 1);
    }

    #[test]
    fn test_song_id_shape() {
        let a = song_id(&artifact("One"), 1);
        let b = song_id(&artifact("One"), 2);
        assert!(a.starts_with("s_"));
        assert_eq!(a.len(), 14);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_local_catalog_submit() {
        let dir = std::env::temp_dir().join(format!("singsync-catalog-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let catalog = LocalCatalog::new(&dir);

        let id = catalog.submit(artifact("Duet")).await.unwrap();
        let song = catalog.open().unwrap().get_song(&id.0).unwrap().unwrap();
        assert_eq!(song.title, "Duet");
        assert_eq!(song.audio, "https://cdn.example.com/a.mp3");
        assert_eq!(song.status, SongStatus::PendingReview);
    }

    #[tokio::test]
    async fn test_local_catalog_missing_media_fails() {
        let dir = std::env::temp_dir().join(format!("singsync-catalog-bad-{}", std::process::id()));
        let catalog = LocalCatalog::new(&dir);
        let mut a = artifact("Broken");
        a.audio = dir.join("gone.mp3").display().to_string();
        assert!(catalog.submit(a).await.is_err());
    }
}
