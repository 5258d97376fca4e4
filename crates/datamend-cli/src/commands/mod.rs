//! CLI command implementations.

pub mod ask;
pub mod detect;
pub mod serve;
pub mod treat;
