//! Fixed-window request throttle.
//!
//! A single counter resets once the window elapses. Bursts across a window
//! boundary are possible; that is the documented trade-off of a fixed window
//! over a sliding one and is preserved here for behavioral parity.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config;

#[derive(Debug)]
struct RateWindow {
    window_start: Instant,
    count: u32,
}

pub struct RateLimiter {
    window: Mutex<RateWindow>,
    max_per_window: u32,
    window_len: Duration,
}

impl RateLimiter {
    pub fn new(max_per_window: u32, window_len: Duration) -> Self {
        Self {
            window: Mutex::new(RateWindow {
                window_start: Instant::now(),
                count: 0,
            }),
            max_per_window,
            window_len,
        }
    }

    /// Admit or refuse one request. At the cap, admission is refused without
    /// mutating further state; the count is never truncated.
    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    fn allow_at(&self, now: Instant) -> bool {
        let mut window = self.window.lock().unwrap();

        if now.duration_since(window.window_start) >= self.window_len {
            window.count = 0;
            window.window_start = now;
        }

        if window.count >= self.max_per_window {
            debug!(count = window.count, "rate limit window exhausted");
            return false;
        }

        window.count += 1;
        true
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(config::MAX_REQUESTS_PER_MINUTE, config::RATE_WINDOW)
    }
}
