pub mod archive;
pub mod relocate;
pub mod rotate;
pub mod runtime;
pub mod shuffle;
