//! API request handlers.

mod chat;
mod data;
mod download;
mod intervals;
mod treatment;

pub use chat::*;
pub use data::*;
pub use download::*;
pub use intervals::*;
pub use treatment::*;
