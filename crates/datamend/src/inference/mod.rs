//! Type inference, timestamp handling and descriptive statistics.

mod statistical;
mod temporal;

pub use statistical::{
    TypeInference, compute_numeric_stats, infer_column_type, mean, median, parse_number, quantile,
};
pub use temporal::{
    detect_format, format_period, known_format, looks_like_date, mode_period_ms, parse_any,
};
