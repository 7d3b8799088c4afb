use std::time::Duration;
use std::time::Instant;

use parking_lot::Mutex;

/// Sticky cooldown flag armed after an explicit rate-limit rejection.
///
/// Once armed, all attempts are expected to fail fast until the deadline
/// passes. Reading an expired cooldown clears it in the same critical
/// section, so stale state self-heals without an external sweeper and two
/// concurrent readers never race on who clears it.
///
/// This type is safe to share across tasks.
#[derive(Debug, Default)]
pub struct Cooldown {
    reset_at: Mutex<Option<Instant>>,
}

impl Cooldown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the cooldown to expire `retry_after` from now.
    pub fn set(&self, retry_after: Duration) {
        *self.reset_at.lock() = Some(Instant::now() + retry_after);
    }

    /// Report the remaining cooldown, or clear it when expired.
    ///
    /// Returns `Some(remaining)` while the cooldown is armed and in the
    /// future and `None` otherwise. An expired cooldown is reset to
    /// inactive before returning.
    pub fn get_or_reset(&self) -> Option<Duration> {
        let mut reset_at = self.reset_at.lock();
        let deadline = (*reset_at)?;
        match deadline.checked_duration_since(Instant::now()) {
            Some(remaining) if !remaining.is_zero() => Some(remaining),
            _ => {
                *reset_at = None;
                None
            }
        }
    }
}
