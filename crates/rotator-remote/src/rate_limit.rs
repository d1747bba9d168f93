//! Per-endpoint rate-limit tracking
//!
//! The tracker remembers the last window reported by each endpoint. The gate
//! combines the tracker with the configured policy and the event sink, and
//! is the only place the client blocks.

use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::header::HeaderMap;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::config::RateLimitPolicy;
use crate::events::{ClientEvent, EventSink};
use rotator_core::RotatorError;

pub const HEADER_REMAINING: &str = "x-rate-limit-remaining";
pub const HEADER_RESET: &str = "x-rate-limit-reset";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    remaining: u32,
    reset_at: DateTime<Utc>,
}

/// Rate-limit windows keyed by endpoint
#[derive(Debug, Default)]
pub struct RateLimitTracker {
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the window reported alongside a response.
    ///
    /// Responses without both headers leave the tracked window untouched.
    pub fn record(&self, endpoint: &str, remaining: Option<u32>, reset_at: Option<DateTime<Utc>>) {
        if let (Some(remaining), Some(reset_at)) = (remaining, reset_at) {
            self.with_windows(|windows| {
                windows.insert(endpoint.to_string(), Window { remaining, reset_at });
            });
        }
    }

    /// Mark an endpoint as exhausted until `reset_at`
    pub fn exhaust(&self, endpoint: &str, reset_at: DateTime<Utc>) {
        self.record(endpoint, Some(0), Some(reset_at));
    }

    pub fn clear(&self, endpoint: &str) {
        self.with_windows(|windows| {
            windows.remove(endpoint);
        });
    }

    /// When the next request to `endpoint` may be issued, if it must wait
    pub fn resume_at(&self, endpoint: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.with_windows(|windows| {
            windows
                .get(endpoint)
                .filter(|w| w.remaining == 0 && w.reset_at > now)
                .map(|w| w.reset_at)
        })
    }

    pub fn remaining(&self, endpoint: &str) -> Option<u32> {
        self.with_windows(|windows| windows.get(endpoint).map(|w| w.remaining))
    }

    fn with_windows<T>(&self, f: impl FnOnce(&mut HashMap<String, Window>) -> T) -> T {
        let mut guard = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

/// Read `x-rate-limit-remaining` and `x-rate-limit-reset` from a response
pub fn parse_headers(headers: &HeaderMap) -> (Option<u32>, Option<DateTime<Utc>>) {
    let text = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let remaining = text(HEADER_REMAINING).and_then(|v| v.trim().parse().ok());
    let reset_at = text(HEADER_RESET)
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

    (remaining, reset_at)
}

/// Applies the rate-limit policy around requests
pub struct RateLimitGate {
    policy: RateLimitPolicy,
    fallback_wait: Duration,
    tracker: RateLimitTracker,
    events: Option<EventSink>,
}

impl RateLimitGate {
    pub fn new(policy: RateLimitPolicy, fallback_wait_secs: u64) -> Self {
        Self {
            policy,
            fallback_wait: Duration::seconds(fallback_wait_secs as i64),
            tracker: RateLimitTracker::new(),
            events: None,
        }
    }

    pub fn with_event_sink(mut self, sink: EventSink) -> Self {
        self.events = Some(sink);
        self
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    pub fn tracker(&self) -> &RateLimitTracker {
        &self.tracker
    }

    /// Called before a request. Blocks if the endpoint's window is spent.
    ///
    /// Under `FailFast` a spent window is reported as `RateLimited` instead.
    pub fn before_request(&self, endpoint: &str) -> Result<(), RotatorError> {
        let Some(resume_at) = self.tracker.resume_at(endpoint, Utc::now()) else {
            return Ok(());
        };

        match self.policy {
            RateLimitPolicy::FailFast => Err(RotatorError::RateLimited {
                endpoint: endpoint.to_string(),
            }),
            RateLimitPolicy::TrackAndAwait => {
                self.await_until(endpoint, resume_at);
                Ok(())
            }
        }
    }

    /// Called when the service refused a request for rate-limit reasons.
    ///
    /// Returns `Ok(())` once the caller may reissue the request.
    pub fn on_limited(
        &self,
        endpoint: &str,
        reset_at: Option<DateTime<Utc>>,
    ) -> Result<(), RotatorError> {
        let resume_at = self.resume_after_limit(reset_at, Utc::now());
        self.tracker.exhaust(endpoint, resume_at);

        match self.policy {
            RateLimitPolicy::FailFast => Err(RotatorError::RateLimited {
                endpoint: endpoint.to_string(),
            }),
            RateLimitPolicy::TrackAndAwait => {
                self.await_until(endpoint, resume_at);
                Ok(())
            }
        }
    }

    /// A reset that is missing or already behind `now` falls back to
    /// `now + fallback_wait`, so a stale header never means an immediate retry.
    pub fn resume_after_limit(
        &self,
        reset_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> DateTime<Utc> {
        match reset_at {
            Some(reset_at) if reset_at > now => reset_at,
            _ => now + self.fallback_wait,
        }
    }

    /// Block the calling thread until `resume_at`, emitting events around
    /// the wait.
    pub fn await_until(&self, endpoint: &str, resume_at: DateTime<Utc>) {
        self.emit(&ClientEvent::AwaitingRateLimit {
            endpoint: endpoint.to_string(),
            resume_at,
        });
        tracing::warn!(
            endpoint = endpoint,
            resume_at = %resume_at,
            "Rate limit reached, waiting for window reset"
        );

        let wait = (resume_at - Utc::now()).to_std().unwrap_or_default();
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }

        self.tracker.clear(endpoint);
        self.emit(&ClientEvent::RateLimitCleared {
            endpoint: endpoint.to_string(),
        });
        tracing::info!(endpoint = endpoint, "Rate limit window reset");
    }

    fn emit(&self, event: &ClientEvent) {
        if let Some(sink) = &self.events {
            sink(event);
        }
    }
}
