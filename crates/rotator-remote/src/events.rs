//! Observability events emitted by the client
//!
//! The sink is owned by one client instance; there is no global registry.

use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A request to `endpoint` is blocked until `resume_at`
    AwaitingRateLimit {
        endpoint: String,
        resume_at: DateTime<Utc>,
    },
    /// The wait for `endpoint` finished; the request is being issued
    RateLimitCleared { endpoint: String },
}

/// Callback receiving client events
pub type EventSink = Arc<dyn Fn(&ClientEvent) + Send + Sync>;
