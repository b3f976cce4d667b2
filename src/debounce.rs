//! Trailing-edge debouncer
//!
//! Holds the most recent value pushed into it and releases it once no
//! newer value has arrived for the configured quiet period. Values pushed
//! during a burst replace each other; only the last one is released.
//!
//! The debouncer owns no thread. The event loop drives it by calling
//! [`Debouncer::poll`] on every tick. Dropping it, or calling
//! [`Debouncer::cancel`], discards whatever is pending.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Record a new value observed at `now`, replacing any pending one
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Release the pending value if it has been quiet long enough
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if now.saturating_duration_since(*at) >= self.quiet => {
                self.pending.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }

    /// Drop the pending value without releasing it
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(500);

    #[test]
    fn test_only_last_value_of_burst_is_released() {
        let t0 = Instant::now();
        let mut debouncer = Debouncer::new(QUIET);

        debouncer.push((0, 10), t0);
        debouncer.push((1, 11), t0 + Duration::from_millis(100));
        debouncer.push((2, 12), t0 + Duration::from_millis(200));

        assert_eq!(debouncer.poll(t0 + Duration::from_millis(600)), None);
        assert_eq!(debouncer.poll(t0 + Duration::from_millis(700)), Some((2, 12)));
        assert_eq!(debouncer.poll(t0 + Duration::from_millis(2_000)), None);
    }

    #[test]
    fn test_cancel_discards_pending() {
        let t0 = Instant::now();
        let mut debouncer = Debouncer::new(QUIET);
        debouncer.push("window", t0);
        assert!(debouncer.is_pending());

        debouncer.cancel();
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(t0 + Duration::from_secs(5)), None);
    }

    #[test]
    fn test_separate_bursts_release_separately() {
        let t0 = Instant::now();
        let mut debouncer = Debouncer::new(QUIET);

        debouncer.push(1, t0);
        assert_eq!(debouncer.poll(t0 + QUIET), Some(1));

        debouncer.push(2, t0 + Duration::from_secs(2));
        assert_eq!(debouncer.poll(t0 + Duration::from_secs(2) + QUIET), Some(2));
    }
}
