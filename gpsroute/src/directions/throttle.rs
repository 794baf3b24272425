//! Minimum spacing between consecutive requests.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::trace;

/// Enforces a minimum interval between request start times.
///
/// Each caller reserves the next free slot under the lock and then sleeps
/// until it, so concurrent callers are spaced out rather than released
/// together.
#[derive(Debug)]
pub struct RequestThrottle {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RequestThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    /// A throttle that never waits.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Reserves a slot and returns how long to wait for it.
    fn reserve(&self) -> Duration {
        let now = Instant::now();
        let mut next_slot = self.next_slot.lock();
        let slot = match *next_slot {
            Some(slot) if slot > now => slot,
            _ => now,
        };
        *next_slot = Some(slot + self.min_interval);
        slot - now
    }

    /// Waits until the next request may start.
    pub async fn until_ready(&self) {
        if self.min_interval.is_zero() {
            return;
        }
        let wait = self.reserve();
        if !wait.is_zero() {
            trace!(wait_ms = wait.as_millis() as u64, "throttling request");
            tokio::time::sleep(wait).await;
        }
    }

    /// Forgets the previous request so the next one starts immediately.
    pub fn reset(&self) {
        *self.next_slot.lock() = None;
    }
}
