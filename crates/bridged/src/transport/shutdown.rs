//! Cooperative stop signal shared by the accept loop and its connections.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Slice used when sleeping so a stop request is noticed promptly.
const SLEEP_SLICE: Duration = Duration::from_millis(25);

/// Clonable flag raised once to ask background work to wind down.
///
/// Nothing is interrupted forcibly; holders check the flag at points where
/// stopping leaves no half-finished work behind.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    raised: Arc<AtomicBool>,
}

impl ShutdownToken {
    /// Creates a token that has not been raised.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the signal. Raising it again has no further effect.
    pub fn trigger(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    /// Returns true once [`ShutdownToken::trigger`] has been called on any clone.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Sleeps for `duration`, returning early when the signal is raised.
    ///
    /// Returns true when the sleep was cut short.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_triggered() {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            thread::sleep(remaining.min(SLEEP_SLICE));
        }
    }
}
