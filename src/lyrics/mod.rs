//! Lyrics handling for the sync studio
//!
//! This module provides:
//! - the segmenter that turns pasted text into a queue of lines
//! - LRC parsing/writing for import and export
//! - an LRCLIB client to look up plain lyrics by title and artist

pub mod lrclib;
pub mod parser;
pub mod segment;

use serde::{Deserialize, Serialize};

pub use lrclib::LrclibClient;
pub use segment::segment;

/// Which voice sings a line in a duet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SingerPart {
    A,
    B,
    #[default]
    Both,
}

impl SingerPart {
    pub fn label(self) -> &'static str {
        match self {
            SingerPart::A => "A",
            SingerPart::B => "B",
            SingerPart::Both => "Both",
        }
    }

    /// Canonical marker written in front of a line, `None` for the default part.
    pub fn marker(self) -> Option<&'static str> {
        match self {
            SingerPart::A => Some("[A]"),
            SingerPart::B => Some("[B]"),
            SingerPart::Both => None,
        }
    }
}

/// One non-blank input line, marker included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLyricLine {
    raw: String,
    singer: SingerPart,
    text_start: usize,
}

impl RawLyricLine {
    pub fn new(raw: &str) -> Self {
        let (singer, text) = segment::parse_marker(raw);
        Self {
            raw: raw.to_string(),
            singer,
            text_start: raw.len() - text.len(),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Text with the marker stripped.
    pub fn text(&self) -> &str {
        &self.raw[self.text_start..]
    }

    pub fn singer(&self) -> SingerPart {
        self.singer
    }
}

/// A line pinned to the moment it starts in the audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncedLyricLine {
    #[serde(rename = "time")]
    pub timestamp_ms: u64,
    pub text: String,
    pub singer: SingerPart,
}

impl SyncedLyricLine {
    pub fn new(timestamp_ms: u64, line: &RawLyricLine) -> Self {
        Self {
            timestamp_ms,
            text: line.text().to_string(),
            singer: line.singer(),
        }
    }
}

/// Format milliseconds the way the sync screen shows them: `m:ss.d`.
pub fn format_clock(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!("{}:{:02}.{}", total_secs / 60, total_secs % 60, (ms % 1000) / 100)
}

/// Get plain lyrics for a song, preferring the unsynced text since the
/// studio re-times every line anyway.
pub async fn fetch_plain_lyrics(
    client: &LrclibClient,
    title: &str,
    artist: &str,
) -> anyhow::Result<Option<String>> {
    let Some(lyrics) = client.get_lyrics(title, artist).await? else {
        return Ok(None);
    };
    tracing::info!(
        id = lyrics.id,
        track = %lyrics.track_name,
        artist = %lyrics.artist_name,
        "lrclib match"
    );

    if let Some(plain) = lyrics.plain_lyrics.filter(|p| !p.trim().is_empty()) {
        return Ok(Some(plain));
    }
    // Fall back to stripping timestamps off the synced variant.
    if let Some(synced) = lyrics.synced_lyrics.filter(|s| !s.trim().is_empty()) {
        let text = parser::parse_lrc(&synced)
            .lines
            .into_iter()
            .map(|l| l.text)
            .collect::<Vec<_>>()
            .join("\n");
        return Ok(Some(text));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_line_keeps_marker() {
        let line = RawLyricLine::new("B:  Dance with me");
        assert_eq!(line.raw(), "B:  Dance with me");
        assert_eq!(line.text(), "Dance with me");
        assert_eq!(line.singer(), SingerPart::B);
    }

    #[test]
    fn test_synced_line_json_shape() {
        let line = SyncedLyricLine::new(1500, &RawLyricLine::new("[A] Hi"));
        let v = serde_json::to_value(&line).unwrap();
        assert_eq!(v, serde_json::json!({"time": 1500, "text": "Hi", "singer": "A"}));
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "0:00.0");
        assert_eq!(format_clock(3_599), "0:03.5");
        assert_eq!(format_clock(61_250), "1:01.2");
    }
}
