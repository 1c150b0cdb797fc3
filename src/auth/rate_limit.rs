//! Per-client rate limiting for the login/register endpoints
//!
//! Fixed-length counting window keyed by client IP. The window does not
//! slide: once a client hits the ceiling the limiter keeps rejecting,
//! without touching the entry, until the window fully elapses; the next
//! allowed request then starts a fresh window.

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::info;

/// Per-client counter state
#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    /// Window start, epoch millis
    window_start: i64,
}

/// Fixed-window request limiter.
///
/// The map entry update is atomic per key (DashMap locks the shard for
/// the duration of the entry operation), so concurrent requests for the
/// same client can never push the count past the ceiling. Stale entries
/// are overwritten lazily on the next request; no sweeper task.
pub struct RateLimiter {
    entries: DashMap<String, RateLimitEntry>,
    window_millis: i64,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(window_secs: u64, max_requests: u32) -> Self {
        Self {
            entries: DashMap::new(),
            window_millis: (window_secs as i64) * 1000,
            max_requests,
        }
    }

    /// Record a request from `client_ip` and decide whether to admit it.
    /// Returns `true` when the request is allowed.
    pub fn check(&self, client_ip: &str) -> bool {
        let allowed = self.check_at(client_ip, Utc::now().timestamp_millis());
        if !allowed {
            info!("Rate limit exceeded for IP: {}", client_ip);
        }
        allowed
    }

    /// Clock-injected variant of [`check`](Self::check)
    fn check_at(&self, client_ip: &str, now_millis: i64) -> bool {
        match self.entries.entry(client_ip.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(RateLimitEntry {
                    count: 1,
                    window_start: now_millis,
                });
                true
            }
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if now_millis - entry.window_start >= self.window_millis {
                    // window elapsed: start over regardless of prior count
                    entry.count = 1;
                    entry.window_start = now_millis;
                    true
                } else if entry.count < self.max_requests {
                    entry.count += 1;
                    true
                } else {
                    // at ceiling: reject with no state change, so the
                    // client stays blocked until the window elapses
                    false
                }
            }
        }
    }
}
