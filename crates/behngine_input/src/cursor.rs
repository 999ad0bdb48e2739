use std::time::{Duration, Instant};

/// Cursor lock flag with a debounce so a held toggle key does not flicker.
#[derive(Debug, Clone)]
pub struct CursorLock {
    locked: bool,
    debounce: Duration,
    last_toggle: Option<Instant>,
}

impl Default for CursorLock {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CursorLock {
    pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

    pub fn new(locked: bool) -> Self {
        Self {
            locked,
            debounce: Self::DEFAULT_DEBOUNCE,
            last_toggle: None,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Flips the lock unless the previous flip is more recent than the debounce.
    /// Returns the new state when it changed.
    pub fn toggle(&mut self, now: Instant) -> Option<bool> {
        if let Some(last) = self.last_toggle {
            if now.saturating_duration_since(last) < self.debounce {
                return None;
            }
        }

        self.locked = !self.locked;
        self.last_toggle = Some(now);
        log::debug!("cursor lock -> {}", self.locked);
        Some(self.locked)
    }
}
