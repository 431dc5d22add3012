//! Outbound-call throttle for the upstream market-data/broker API.
//!
//! Two independent sliding counters: a per-minute cap and a per-second cap.
//! `limit()` delays the caller until both windows have room — it never
//! rejects. Callers compose cancellation at the call site by abandoning the
//! wait.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Window {
    opened: Instant,
    count: u32,
}

impl Window {
    fn new(now: Instant) -> Self {
        Self {
            opened: now,
            count: 0,
        }
    }
}

#[derive(Debug)]
struct Counters {
    minute: Window,
    second: Window,
}

/// Dual-window rate limiter. Safe to share across callers; counter access
/// is serialized, waiting happens outside the lock.
#[derive(Debug)]
pub struct RateLimiter {
    counters: Mutex<Counters>,
    minute_cap: u32,
    second_cap: u32,
    minute_len: Duration,
    second_len: Duration,
    margin: Duration,
}

impl RateLimiter {
    pub const DEFAULT_PER_MINUTE: u32 = 200;
    pub const DEFAULT_PER_SECOND: u32 = 10;

    /// Safety margin added to every computed wait so a retry lands on the
    /// far side of the window boundary.
    const MARGIN: Duration = Duration::from_millis(50);

    /// Limiter with the upstream API's published caps: 200/minute, 10/second.
    pub fn new() -> Self {
        Self::with_caps(Self::DEFAULT_PER_MINUTE, Self::DEFAULT_PER_SECOND)
    }

    pub fn with_caps(per_minute: u32, per_second: u32) -> Self {
        Self::with_windows(
            per_minute,
            Duration::from_secs(60),
            per_second,
            Duration::from_secs(1),
        )
    }

    /// Fully custom caps and window lengths (primarily for tests).
    pub fn with_windows(
        minute_cap: u32,
        minute_len: Duration,
        second_cap: u32,
        second_len: Duration,
    ) -> Self {
        let now = Instant::now();
        Self {
            counters: Mutex::new(Counters {
                minute: Window::new(now),
                second: Window::new(now),
            }),
            minute_cap,
            second_cap,
            minute_len,
            second_len,
            margin: Self::MARGIN,
        }
    }

    /// Block until the call fits both windows, then record it.
    pub fn limit(&self) {
        loop {
            match self.reserve(Instant::now()) {
                None => return,
                Some(wait) => std::thread::sleep(wait),
            }
        }
    }

    /// Try to record a call at `now`. On success both counters are bumped;
    /// otherwise the caller gets the time to wait before retrying. The
    /// minute window is checked first, then the second window.
    fn reserve(&self, now: Instant) -> Option<Duration> {
        let mut counters = self.counters.lock().unwrap();
        if now.duration_since(counters.minute.opened) >= self.minute_len {
            counters.minute = Window::new(now);
        }
        if now.duration_since(counters.second.opened) >= self.second_len {
            counters.second = Window::new(now);
        }

        if counters.minute.count >= self.minute_cap {
            let elapsed = now.duration_since(counters.minute.opened);
            return Some(self.minute_len - elapsed + self.margin);
        }
        if counters.second.count >= self.second_cap {
            let elapsed = now.duration_since(counters.second.opened);
            return Some(self.second_len - elapsed + self.margin);
        }

        counters.minute.count += 1;
        counters.second.count += 1;
        None
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
