//! Single-slot transient warning with auto-dismiss.

use std::time::{Duration, Instant};

/// How long a notification stays up without interaction.
pub const AUTO_HIDE: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    /// Auto-hide window elapsed
    Timeout,
    /// Explicit close (Esc, click on the box)
    CloseAction,
    /// Incidental interaction elsewhere on screen. Never closes.
    Clickaway,
}

#[derive(Debug, Clone, Default)]
pub struct Notification {
    message: String,
    open: bool,
    shown_at: Option<Instant>,
}

impl Notification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `message`, replacing whatever is up and restarting the window.
    pub fn show(&mut self, message: impl Into<String>, now: Instant) {
        self.message = message.into();
        self.open = true;
        self.shown_at = Some(now);
    }

    /// Returns true if the notification went from open to closed.
    pub fn close(&mut self, reason: DismissReason) -> bool {
        if reason == DismissReason::Clickaway || !self.open {
            return false;
        }
        self.open = false;
        true
    }

    /// Close once the auto-hide window has elapsed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.shown_at {
            Some(shown_at) if self.open && now.saturating_duration_since(shown_at) >= AUTO_HIDE => {
                self.close(DismissReason::Timeout)
            }
            _ => false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
