#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Discard the session (unless published) and leave.
    Quit,
    TogglePlay,
    Mark,
    /// Back to 0:00, drop every mark.
    Rewind,
    /// Publish, or retry a failed publish.
    Publish,
    ToggleHelp,
    Resize,
}
