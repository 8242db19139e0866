use thiserror::Error;

/// Snapshot of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParryWindowState {
    pub is_open: bool,
    /// Clock time (ms) at which an unanswered window counts as missed
    pub deadline_ms: Option<u64>,
}

/// Exactly one of `ParrySuccess` / `WindowMissed` follows every
/// `WindowOpened`, unless the window is reset first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParryEvent {
    WindowOpened,
    ParrySuccess,
    WindowMissed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParryError {
    #[error("a parry window is already open until {deadline_ms} ms")]
    AlreadyOpen { deadline_ms: u64 },
}
