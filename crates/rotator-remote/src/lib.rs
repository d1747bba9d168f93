//! Rotator Remote - HTTP client for the remote collections API
//!
//! Provides:
//! - `HttpCollectionClient`, the production `CollectionService`
//! - Wire format parsing for collection pages, write acks and error bodies
//! - Rate-limit tracking with an explicit wait policy and an event callback
//! - Request signing through the `SessionAuth` seam

pub mod auth;
pub mod client;
pub mod config;
pub mod events;
pub mod rate_limit;
pub mod wire;

pub use auth::{BearerSession, SessionAuth};
pub use client::HttpCollectionClient;
pub use config::{ClientConfig, RateLimitPolicy, DEFAULT_BASE_URL};
pub use events::{ClientEvent, EventSink};
pub use rate_limit::{RateLimitGate, RateLimitTracker};
