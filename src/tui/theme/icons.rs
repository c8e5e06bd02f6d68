//! Nerd Font icons for TUI display
//! Requires a Nerd Font to be installed (https://www.nerdfonts.com)

/// Icon set using Nerd Font glyphs
#[derive(Debug, Clone)]
pub struct Icons {
    // Transport
    pub play: &'static str,
    pub pause: &'static str,

    // Status
    pub success: &'static str,
    pub error: &'static str,
    pub info: &'static str,
    pub upload: &'static str,

    // Screen
    pub music: &'static str,
    pub lyrics: &'static str,
    pub help: &'static str,

    // Lyric list
    pub selected: &'static str,
    pub marked: &'static str,

    // Progress bar
    pub progress_full: &'static str,
    pub progress_empty: &'static str,
    pub progress_head: &'static str,

    pub bullet: &'static str,
}

impl Icons {
    /// Nerd Font icon set
    pub const fn nerd() -> Self {
        Self {
            play: "\u{f04b}",     // nf-fa-play
            pause: "\u{f04c}",    // nf-fa-pause

            success: "\u{f00c}",  // nf-fa-check
            error: "\u{f00d}",    // nf-fa-times
            info: "\u{f05a}",     // nf-fa-info_circle
            upload: "\u{f093}",   // nf-fa-upload

            music: "\u{f001}",    // nf-fa-music
            lyrics: "\u{f15c}",   // nf-fa-file_text_o
            help: "\u{f059}",     // nf-fa-question_circle

            selected: "\u{f054}", // nf-fa-chevron_right
            marked: "\u{f00c}",   // nf-fa-check

            progress_full: "━",
            progress_empty: "─",
            progress_head: "●",

            bullet: "•",
        }
    }
}

impl Default for Icons {
    fn default() -> Self {
        Self::nerd()
    }
}

/// Loading spinner frames
pub struct LoadingSpinner;

impl LoadingSpinner {
    /// Braille-based smooth spinner
    pub const BRAILLE: [&'static str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

    pub fn frame(tick: u64) -> &'static str {
        let idx = (tick / 4) as usize % Self::BRAILLE.len();
        Self::BRAILLE[idx]
    }
}
