//! Per-client request counter.
//!
//! Reset-window algorithm: each client gets `max_requests` per `window`.
//! The first request after the window has elapsed starts a fresh window,
//! so up to twice the limit can pass across a window boundary.

use dashmap::DashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_MAX_REQUESTS: u64 = 60;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

struct RateWindow {
    count: u64,
    window_start: Instant,
}

pub struct RateLimiter {
    clients: DashMap<String, RateWindow>,
    max_requests: u64,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u64, window: Duration) -> Self {
        Self {
            clients: DashMap::new(),
            max_requests,
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_limited(&self, client_key: &str) -> bool {
        self.is_limited_at(client_key, Instant::now())
    }

    /// Count one request from `client_key` at `now`; `true` means reject.
    pub fn is_limited_at(&self, client_key: &str, now: Instant) -> bool {
        let mut entry = self
            .clients
            .entry(client_key.to_string())
            .or_insert_with(|| RateWindow {
                count: 0,
                window_start: now,
            });

        if entry.count == 0 || now.saturating_duration_since(entry.window_start) > self.window {
            entry.count = 1;
            entry.window_start = now;
            return false;
        }

        entry.count += 1;
        entry.count > self.max_requests
    }

    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// Drop clients whose window has expired. Returns how many were removed.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.clients.len();
        self.clients
            .retain(|_, w| now.saturating_duration_since(w.window_start) <= self.window);
        before.saturating_sub(self.clients.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}
