//! Theme configuration - Monochrome grayscale

pub mod borders;
pub mod icons;
pub mod palette;

use crate::app::state::ToastKind;
use ratatui::style::Color;

pub use borders::BorderStyle;
pub use icons::{Icons, LoadingSpinner};
pub use palette::Palette;

/// Active theme configuration
#[derive(Debug, Clone)]
pub struct Theme {
    pub palette: Palette,
    pub icons: Icons,
}

impl Theme {
    pub fn new() -> Self {
        Self {
            palette: Palette::MONO,
            icons: Icons::nerd(),
        }
    }

    pub fn border_set(&self) -> ratatui::symbols::border::Set<'static> {
        BorderStyle::to_border_set()
    }

    /// Icon and color a toast is drawn with.
    pub fn toast(&self, kind: ToastKind) -> (&'static str, Color) {
        match kind {
            ToastKind::Success => (self.icons.success, self.palette.playing),
            ToastKind::Hint => (self.icons.info, self.palette.accent_alt),
            ToastKind::Error => (self.icons.error, self.palette.error),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the theme (always Mono)
pub fn get_theme() -> Theme {
    Theme::new()
}
