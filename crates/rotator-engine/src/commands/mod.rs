pub mod archive;
pub mod engine_command;
pub mod fetch;
pub mod relocate;
pub mod rotate;
pub mod shuffle;
