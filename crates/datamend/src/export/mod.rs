//! Dataset download formats.

mod writer;

pub use writer::{ExportFormat, ExportService, ExportedFile};
