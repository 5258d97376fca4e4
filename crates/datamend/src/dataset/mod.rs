//! Typed datasets and the session store that owns them.

mod store;
mod table;
mod value;

pub use store::{DatasetStore, UploadSummary};
pub use table::Dataset;
pub use value::Value;
