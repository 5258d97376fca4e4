//! HTTP API over a single session-scoped dataset store.

pub mod app;
pub mod error;
pub mod handlers;
pub mod state;
