//! Rotator Store - Durable archive files
//!
//! Provides:
//! - Archive load, merge (dedup by post id, first occurrence wins) and save
//! - Atomic file replacement so a failed write never truncates an archive
//! - Default archive naming per collection

pub mod archive;
pub mod errors;

// Re-export key types
pub use archive::{dedup_records, merge_records, ArchiveStore};
pub use errors::Result;
