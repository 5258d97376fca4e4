//! Imputation and row deletion over selected intervals.

mod engine;
mod method;
mod selection;

pub use engine::{DEFAULT_MAX_INSERTED_ROWS, TreatmentEngine, TreatmentReport};
pub use method::TreatmentMethod;
pub use selection::{Selection, SelectionRequest};
