//! Core types shared across the rotator crates
//!
//! This crate provides foundational types used by the error and logging
//! facilities as well as the remote client:
//!
//! - **Correlation**: `RequestId` tagging one engine invocation
//! - **Sensitive data**: `Sensitive<T>` marker for automatic redaction
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::RequestId;
pub use sensitive::Sensitive;
