//! Blocking delays: the fixed inter-item pause and retry backoff both go
//! through [`Sleeper`] so the loop can run without real waiting under test.

use std::time::Duration;

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Fixed pause between consecutive items, applied regardless of outcome.
#[derive(Debug, Clone)]
pub struct RateLimiter<S> {
    delay: Duration,
    sleeper: S,
}

impl<S: Sleeper> RateLimiter<S> {
    pub fn new(delay: Duration, sleeper: S) -> Self {
        Self { delay, sleeper }
    }

    /// Waits after item `index` (zero based) unless it was the last of `total`.
    pub fn after_item(&self, index: usize, total: usize) {
        if index + 1 < total {
            self.sleeper.sleep(self.delay);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSleeper;
    use super::*;

    #[test]
    fn test_no_pause_after_last_item() {
        let sleeper = RecordingSleeper::default();
        let limiter = RateLimiter::new(Duration::from_millis(1500), &sleeper);

        for idx in 0..3 {
            limiter.after_item(idx, 3);
        }

        assert_eq!(
            *sleeper.slept.borrow(),
            vec![Duration::from_millis(1500), Duration::from_millis(1500)]
        );
    }

    #[test]
    fn test_single_item_never_pauses() {
        let sleeper = RecordingSleeper::default();
        RateLimiter::new(Duration::from_secs(1), &sleeper).after_item(0, 1);
        assert!(sleeper.slept.borrow().is_empty());
    }
}
