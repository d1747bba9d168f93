//! Rotator Core - domain model and contracts for collection rotation
//!
//! This crate provides:
//! - Collection, post and page models (`CollectionId`, `PostId`, `Entry`, `Page`)
//! - The `CollectionService` trait every remote backend implements
//! - Write acknowledgements that must be inspected (`RemoteAck`)
//! - The error facility (`RotatorError`, `ExError`, `ExErrorKind`)
//! - The structured logging facility
//! - An in-memory `CollectionService` for tests

pub mod errors;
pub mod logging_facility;
pub mod memory;
pub mod model;
pub mod service;

// Macros refer to schema constants through this path so dependents do not
// need rotator-core-types in their own manifest.
pub use rotator_core_types as core_types;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, Result, RotatorError};
pub use memory::{InMemoryCollections, RemoteCall};
pub use model::{
    AckOutcome, CollectionId, Entry, Page, PostId, PostRecord, RemoteAck, TruncationCursor,
};
pub use service::CollectionService;
