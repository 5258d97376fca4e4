//! Gap detection over the active dataset.

mod detector;
mod interval;
mod registry;

pub use detector::{DEFAULT_GAP_TOLERANCE, DetectionRun, IntervalDetector};
pub use interval::{Interval, IntervalBound, IntervalKind};
pub use registry::{BoundRef, IntervalRef, IntervalRegistry};
