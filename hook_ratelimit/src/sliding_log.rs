use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::round::round_up;

/// Sliding log rate limiter enforcing at most `capacity` events per `period`.
///
/// Keeps a ring of the `capacity` most recent admission timestamps. The slot
/// under the cursor always holds the event that happened `capacity`
/// admissions ago, so a new event may only be admitted once that timestamp
/// has aged out of the trailing window.
///
/// Waits are rounded up to the next regular admission tick
/// (`period / capacity`) so that queued waiters are released one tick apart
/// instead of bursting out together when the window frees up.
///
/// This type is safe to share across tasks.
#[derive(Debug)]
pub struct SlidingLog {
    capacity: u32,
    name: &'static str,
    period: Duration,

    slots: Mutex<Slots>,
}

#[derive(Debug)]
struct Slots {
    /// `None` marks a slot that has never been used, so the first
    /// `capacity` admissions go through without waiting.
    entries: Vec<Option<Instant>>,
    cursor: usize,
}

impl SlidingLog {
    /// Create a new sliding log limiter.
    ///
    /// # Panics
    /// Panics if `capacity` is zero or `period` is zero.
    pub fn new(capacity: u32, period: Duration, name: &'static str) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        assert!(!period.is_zero(), "period must be greater than 0");

        Self {
            capacity,
            name,
            period,
            slots: Mutex::new(Slots { entries: vec![None; capacity as usize], cursor: 0 }),
        }
    }

    /// Register a new event, sleeping first if the window is exhausted.
    ///
    /// The admit-and-record step is a single critical section: a waiter
    /// holds the lock through its sleep and records its own timestamp
    /// before the next waiter gets to compute its wait. Without this two
    /// concurrent callers could both claim the same freed slot and break
    /// the window invariant.
    pub async fn wait(&self) {
        let mut slots = self.slots.lock().await;
        if let Some(oldest) = slots.entries[slots.cursor] {
            let next = oldest + self.period;
            let now = Instant::now();
            if now < next {
                let retry_after = round_up(next - now, self.period / self.capacity);
                tracing::info!(name = self.name, ?retry_after, "Rate limit exhausted. Waiting for reset");
                tokio::time::sleep(retry_after).await;
            }
        }
        let cursor = slots.cursor;
        slots.entries[cursor] = Some(Instant::now());
        slots.cursor = (cursor + 1) % self.capacity as usize;
    }

    /// Maximum number of events per period.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Length of the trailing window.
    pub fn period(&self) -> Duration {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_capacity_calls_do_not_wait() {
        let limiter = SlidingLog::new(10, Duration::from_millis(100), "test");
        let start = Instant::now();

        for _ in 0..10 {
            limiter.wait().await;
        }

        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_call_waits_one_period() {
        let limiter = SlidingLog::new(10, Duration::from_millis(100), "test");
        let start = Instant::now();

        for _ in 0..10 {
            limiter.wait().await;
        }
        limiter.wait().await;

        assert_eq!(Instant::now() - start, Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waiters_serialize() {
        let limiter = Arc::new(SlidingLog::new(10, Duration::from_millis(100), "test"));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..11 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.wait().await;
                Instant::now()
            }));
        }

        let mut finished = Vec::new();
        for handle in handles {
            finished.push(handle.await.unwrap());
        }
        finished.sort();

        assert_eq!(finished[9], start);
        assert_eq!(finished[10] - start, Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slot_frees_up_after_period() {
        let limiter = SlidingLog::new(2, Duration::from_millis(50), "test");

        limiter.wait().await;
        limiter.wait().await;
        tokio::time::sleep(Duration::from_millis(60)).await;

        let start = Instant::now();
        limiter.wait().await;
        assert_eq!(Instant::now(), start);
    }

    #[test]
    #[should_panic(expected = "capacity must be greater than 0")]
    fn test_zero_capacity_panics() {
        SlidingLog::new(0, Duration::from_secs(1), "test");
    }

    #[test]
    #[should_panic(expected = "period must be greater than 0")]
    fn test_zero_period_panics() {
        SlidingLog::new(1, Duration::ZERO, "test");
    }
}
