//! Datamend: gap detection and treatment for uploaded tabular time series.
//!
//! Datamend loads a delimited file into a typed, timestamp-ordered dataset,
//! finds the regions where data is missing, and repairs them on request.
//!
//! # Core Principles
//!
//! - **Interval-based**: Missing time ticks and runs of missing cells are
//!   reported as half-open `[start, end)` intervals with stable ids
//! - **Optimistic**: Every interval carries the dataset generation it was
//!   detected against; treatments against an older generation are rejected
//! - **Atomic**: A treatment either applies to every selected interval or
//!   leaves the dataset unchanged
//!
//! # Example
//!
//! ```no_run
//! use datamend::{DatasetStore, SelectionRequest, IntervalRef};
//!
//! let mut store = DatasetStore::new();
//! store.load_file("sensor.csv").unwrap();
//!
//! let run = store.detect_value_gaps("temp").unwrap();
//! let request = SelectionRequest {
//!     columns: vec!["temp".into()],
//!     intervals: run.intervals.iter().map(|i| IntervalRef::Id(i.id.clone())).collect(),
//!     method: "forward_fill".into(),
//!     generation: Some(run.generation),
//! };
//! let report = store.apply_request(&request).unwrap();
//! println!("{}", report.message());
//! ```

pub mod config;
pub mod dataset;
pub mod detection;
pub mod error;
pub mod export;
pub mod inference;
pub mod input;
pub mod prompt;
pub mod schema;
pub mod treatment;

pub use config::{DatamendConfig, DetectionConfig, OutlierConfig};
pub use dataset::{Dataset, DatasetStore, UploadSummary, Value};
pub use detection::{DetectionRun, Interval, IntervalDetector, IntervalKind, IntervalRef};
pub use error::{DatamendError, Result};
pub use export::{ExportFormat, ExportService, ExportedFile};
pub use input::{DataTable, Parser, ParserConfig, SourceMetadata};
pub use prompt::{PromptDispatcher, PromptResponse};
pub use schema::{ColumnSchema, ColumnType, TableSchema};
pub use treatment::{Selection, SelectionRequest, TreatmentEngine, TreatmentMethod, TreatmentReport};
