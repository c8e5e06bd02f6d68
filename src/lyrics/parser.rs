//! LRC format parser and writer
//!
//! Reads and writes synchronized lyrics in LRC format, with an optional singer
//! marker after the timestamp:
//! [ti:Song]
//! [ar:Artist]
//! [00:12.34][A] Hello world
//! [00:15.00]B: Another line

use super::segment::parse_marker;
use super::SyncedLyricLine;

/// Lyrics read from an LRC file
#[derive(Debug, Clone, Default)]
pub struct ParsedLrc {
    /// `[ti:...]` tag, if present
    pub title: Option<String>,
    /// `[ar:...]` tag, if present
    pub artist: Option<String>,
    /// Timed lines, sorted by timestamp
    pub lines: Vec<SyncedLyricLine>,
    /// Non-blank lines that carried no timestamp and were skipped
    pub untimed: usize,
}

/// Parse LRC formatted lyrics
pub fn parse_lrc(content: &str) -> ParsedLrc {
    let mut parsed = ParsedLrc::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some((tag, value)) = parse_metadata(line) {
            match tag.as_str() {
                "ti" => parsed.title = Some(value),
                "ar" => parsed.artist = Some(value),
                _ => {}
            }
            continue;
        }

        match parse_timed_line(line) {
            Some(lines) => parsed.lines.extend(lines),
            None => parsed.untimed += 1,
        }
    }

    // Stable sort keeps file order for equal timestamps.
    parsed.lines.sort_by_key(|l| l.timestamp_ms);
    parsed
}

/// Write lines back out as LRC, markers included.
pub fn to_lrc(title: &str, artist: &str, lines: &[SyncedLyricLine]) -> String {
    let mut out = format!("[ti:{title}]\n[ar:{artist}]\n");
    for l in lines {
        out.push_str(&format_timestamp(l.timestamp_ms));
        if let Some(marker) = l.singer.marker() {
            out.push_str(marker);
            out.push(' ');
        }
        out.push_str(&l.text);
        out.push('\n');
    }
    out
}

/// Parse metadata tag like [ti:Title]
fn parse_metadata(line: &str) -> Option<(String, String)> {
    if !line.starts_with('[') || !line.contains(':') {
        return None;
    }

    let end = line.find(']')?;
    let tag_content = &line[1..end];

    // Check if it looks like a metadata tag (not a timestamp)
    let colon_pos = tag_content.find(':')?;
    let tag = &tag_content[..colon_pos];

    // Metadata tags are typically 2-3 chars
    if !tag.is_empty() && tag.len() <= 3 && tag.chars().all(|c| c.is_ascii_alphabetic()) {
        let value = tag_content[colon_pos + 1..].trim().to_string();
        return Some((tag.to_string(), value));
    }

    None
}

/// Parse a timed line like [00:12.34]Lyrics or [00:12.34][00:15.00]Lyrics
fn parse_timed_line(line: &str) -> Option<Vec<SyncedLyricLine>> {
    let mut timestamps = Vec::new();
    let mut pos = 0;

    // Extract all timestamps at the beginning
    while pos < line.len() && line[pos..].starts_with('[') {
        let Some(end) = line[pos..].find(']') else {
            break;
        };
        match parse_timestamp(&line[pos + 1..pos + end]) {
            Some(ms) => {
                timestamps.push(ms);
                pos += end + 1;
            }
            None => break,
        }
    }

    if timestamps.is_empty() {
        return None;
    }

    let (singer, text) = parse_marker(line[pos..].trim());
    let text = text.to_string();

    // Create a line for each timestamp
    let lines = timestamps
        .into_iter()
        .map(|ts| SyncedLyricLine {
            timestamp_ms: ts,
            text: text.clone(),
            singer,
        })
        .collect();

    Some(lines)
}

/// Parse timestamp string like "00:12.34" or "00:12:34" to milliseconds
fn parse_timestamp(s: &str) -> Option<u64> {
    // Format: mm:ss.xx or mm:ss:xx or mm:ss
    let parts: Vec<&str> = s.split([':', '.']).collect();

    match parts.len() {
        2 => {
            // mm:ss
            let min: u64 = parts[0].parse().ok()?;
            let sec: u64 = parts[1].parse().ok()?;
            Some(min * 60 * 1000 + sec * 1000)
        }
        3 => {
            // mm:ss.xx or mm:ss:xx
            let min: u64 = parts[0].parse().ok()?;
            let sec: u64 = parts[1].parse().ok()?;
            let ms_str = parts[2];
            // Handle both "34" (centiseconds) and "340" (milliseconds)
            let ms: u64 = match ms_str.len() {
                1 => ms_str.parse::<u64>().ok()? * 100,
                2 => ms_str.parse::<u64>().ok()? * 10,
                3 => ms_str.parse().ok()?,
                _ => return None,
            };
            Some(min * 60 * 1000 + sec * 1000 + ms)
        }
        _ => None,
    }
}

fn format_timestamp(ms: u64) -> String {
    let min = ms / 60_000;
    let sec = (ms % 60_000) / 1000;
    let centis = (ms % 1000) / 10;
    format!("[{min:02}:{sec:02}.{centis:02}]")
}
