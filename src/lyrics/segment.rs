//! Splits pasted lyrics into the queue of lines to be tapped.
//!
//! A line may start with a singer marker:
//! [A] First voice
//! B: Second voice
//! Ambos: Everyone

use super::{RawLyricLine, SingerPart};

/// Recognised singer prefixes, tested in this order. First match wins.
pub const MARKERS: &[(&str, SingerPart)] = &[
    ("[A]", SingerPart::A),
    ("A:", SingerPart::A),
    ("[B]", SingerPart::B),
    ("B:", SingerPart::B),
    ("[Both]", SingerPart::Both),
    ("Ambos:", SingerPart::Both),
];

/// Split raw lyric text into ordered, non-blank lines.
pub fn segment(raw: &str) -> Vec<RawLyricLine> {
    raw.lines()
        .filter(|l| !l.trim().is_empty())
        .map(RawLyricLine::new)
        .collect()
}

/// Detect a leading singer marker.
///
/// Returns the singer and the text with the marker (plus one run of following
/// whitespace) removed. Unmarked text is attributed to both singers.
pub fn parse_marker(line: &str) -> (SingerPart, &str) {
    for (prefix, singer) in MARKERS {
        if let Some(rest) = line.strip_prefix(prefix) {
            return (*singer, rest.trim_start());
        }
    }
    (SingerPart::Both, line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario() {
        let lines = segment("[A] Hello\n\nB: World\nAmbos: Together");
        assert_eq!(lines.len(), 3);

        let parsed: Vec<_> = lines.iter().map(|l| (l.text(), l.singer())).collect();
        assert_eq!(
            parsed,
            vec![
                ("Hello", SingerPart::A),
                ("World", SingerPart::B),
                ("Together", SingerPart::Both),
            ]
        );
    }

    #[test]
    fn test_blank_lines_dropped() {
        let lines = segment("\n   \n\t\none\r\n \r\ntwo\n\n");
        let raw: Vec<_> = lines.iter().map(|l| l.raw()).collect();
        assert_eq!(raw, vec!["one", "two"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(segment("").is_empty());
        assert!(segment("  \n\n").is_empty());
    }

    #[test]
    fn test_every_marker() {
        for (prefix, singer) in MARKERS {
            let line = format!("{prefix}   la la");
            let (got, text) = parse_marker(&line);
            assert_eq!(got, *singer, "{prefix}");
            assert_eq!(text, "la la");
            assert!(!text.contains(prefix));
        }
    }

    #[test]
    fn test_marker_without_space() {
        assert_eq!(parse_marker("A:hola"), (SingerPart::A, "hola"));
        assert_eq!(parse_marker("[B]hey"), (SingerPart::B, "hey"));
    }

    #[test]
    fn test_unmarked_and_case_sensitive() {
        assert_eq!(parse_marker("Hello there"), (SingerPart::Both, "Hello there"));
        assert_eq!(parse_marker("a: lower"), (SingerPart::Both, "a: lower"));
        assert_eq!(parse_marker("[both] x"), (SingerPart::Both, "[both] x"));
        // Marker only counts at the start.
        assert_eq!(parse_marker("Say A: now"), (SingerPart::Both, "Say A: now"));
    }

    #[test]
    fn test_order_preserved() {
        let lines = segment("3\n1\n2");
        let raw: Vec<_> = lines.iter().map(|l| l.raw()).collect();
        assert_eq!(raw, vec!["3", "1", "2"]);
    }
}
