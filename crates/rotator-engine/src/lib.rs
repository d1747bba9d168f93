//! Rotator Engine - Collection queue orchestration
//!
//! Coordinates the remote collection service and the archive store:
//! pagination, rotation, shuffle, bulk relocation and archiving.
//!
//! ## Logging Ownership
//!
//! The engine owns lifecycle logging for its operations (`log_op_start!`,
//! `log_op_end!`, `log_op_error!`). Per-post events use `tracing` directly.

pub mod commands;

pub use commands::engine_command::{apply_engine_command, EngineCommand, EngineCommandResult};
