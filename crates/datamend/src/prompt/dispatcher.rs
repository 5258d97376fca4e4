//! Executes classified prompts against a dataset.

use serde_json::{Value as Json, json};
use tracing::debug;

use super::intent::{Intent, OutlierMethod, VariabilityView, classify};
use super::plot::{self, Series};
use super::response::{ImagePayload, PromptResponse};
use crate::config::OutlierConfig;
use crate::dataset::Dataset;
use crate::detection::{IntervalBound, IntervalDetector};
use crate::error::{DatamendError, Result};
use crate::schema::NumericStatistics;

/// Read-only analysis over the active dataset.
#[derive(Debug, Clone, Default)]
pub struct PromptDispatcher {
    outliers: OutlierConfig,
    detector: IntervalDetector,
}

impl PromptDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(outliers: OutlierConfig, detector: IntervalDetector) -> Self {
        Self { outliers, detector }
    }

    /// Classify `prompt` and run it. Never mutates `dataset`.
    pub fn dispatch(&self, dataset: &Dataset, prompt: &str) -> Result<PromptResponse> {
        let intent = classify(prompt)?;
        debug!(?intent, "dispatching prompt");

        match intent {
            Intent::Summarize => Ok(self.summarize(dataset)),
            Intent::Variability { column, view } => self.variability(dataset, &column, view),
            Intent::MissingValues { column, plot } => self.missing_values(dataset, &column, plot),
            Intent::Outliers { column, method } => self.outliers(dataset, &column, method),
        }
    }

    fn summarize(&self, dataset: &Dataset) -> PromptResponse {
        let schema = dataset.schema();
        let mut lines = vec![format!(
            "Dataset: {} rows x {} columns (generation {})",
            dataset.row_count(),
            dataset.column_count(),
            dataset.generation()
        )];

        if let Some(ts) = schema.timestamp() {
            let period = ts
                .expected_period_ms
                .map(crate::inference::format_period)
                .unwrap_or_else(|| "unknown".to_string());
            lines.push(format!("Timestamp column: {} (period {})", ts.name, period));
        }

        let mut numeric = 0;
        for column in &schema.columns {
            let Some(stats) = &column.statistics else {
                continue;
            };
            numeric += 1;
            lines.push(format!(
                "{}: count {}, mean {}, std {}, min {}, max {}, missing {}",
                column.name,
                stats.count,
                fmt_num(stats.mean),
                fmt_num(stats.std),
                fmt_num(stats.min),
                fmt_num(stats.max),
                column.missing_count
            ));
        }
        if numeric == 0 {
            lines.push("No numeric columns to summarize.".to_string());
        }

        PromptResponse::Text(lines.join("\n"))
    }

    fn variability(
        &self,
        dataset: &Dataset,
        column: &str,
        view: VariabilityView,
    ) -> Result<PromptResponse> {
        let (series, stats) = numeric_series(dataset, column)?;
        let Some(stats) = stats else {
            return Ok(PromptResponse::Text(format!(
                "Column '{}' has no values to analyze.",
                series.column
            )));
        };

        let meta = json!({
            "column": series.column,
            "count": stats.count,
            "mean": stats.mean,
            "std": stats.std,
            "min": stats.min,
            "max": stats.max,
        });

        Ok(match view {
            VariabilityView::Series => {
                PromptResponse::Plot(plot::series_figure(&series, stats.mean, stats.std, meta))
            }
            VariabilityView::Distribution => {
                PromptResponse::Plot(plot::histogram_figure(&series, meta))
            }
            VariabilityView::Image => {
                let points: Vec<(f64, f64)> = series
                    .points()
                    .map(|(row, v)| {
                        let x = dataset
                            .row_timestamp(row)
                            .map_or(row as f64, |ts| ts.and_utc().timestamp_millis() as f64);
                        (x, v)
                    })
                    .collect();
                let title = format!("Variability of {}", series.column);
                PromptResponse::Image(ImagePayload::svg(plot::svg_line_chart(&title, &points)))
            }
        })
    }

    fn missing_values(&self, dataset: &Dataset, column: &str, plot: bool) -> Result<PromptResponse> {
        let index = dataset.resolve_column(column)?;
        let name = dataset.schema().columns[index].name.clone();
        let run = self
            .detector
            .detect_value_gaps(dataset, &name, dataset.generation())?;
        let missing: usize = run.intervals.iter().map(|i| i.missing_count).sum();

        if plot {
            let series = series_for(dataset, index);
            let spans: Vec<(Json, Json)> = run
                .intervals
                .iter()
                .filter_map(|interval| match (interval.start, interval.end) {
                    (IntervalBound::Row(start), IntervalBound::Row(end)) if end > start => {
                        Some((series.x[start].clone(), series.x[end - 1].clone()))
                    }
                    _ => None,
                })
                .collect();
            let meta = json!({
                "column": name,
                "generation": run.generation,
                "missing_count": missing,
                "intervals": run.intervals,
            });
            return Ok(PromptResponse::Plot(plot::gap_figure(&series, &spans, meta)));
        }

        if run.intervals.is_empty() {
            return Ok(PromptResponse::Text(format!(
                "Column '{}' has no missing values.",
                name
            )));
        }

        let mut lines = vec![format!(
            "Column '{}' has {} missing value(s) in {} interval(s):",
            name,
            missing,
            run.intervals.len()
        )];
        for interval in &run.intervals {
            let mut line = format!("  rows [{}, {})", interval.start, interval.end);
            if let (Some(first), Some(last)) = (interval.first_missing_at, interval.last_missing_at) {
                line.push_str(&format!(
                    ", {} to {}",
                    first.format("%Y-%m-%d %H:%M:%S"),
                    last.format("%Y-%m-%d %H:%M:%S")
                ));
            }
            lines.push(line);
        }
        Ok(PromptResponse::Text(lines.join("\n")))
    }

    fn outliers(
        &self,
        dataset: &Dataset,
        column: &str,
        method: OutlierMethod,
    ) -> Result<PromptResponse> {
        let (series, stats) = numeric_series(dataset, column)?;
        let Some(stats) = stats else {
            return Ok(PromptResponse::Text(format!(
                "Column '{}' has no values to analyze.",
                series.column
            )));
        };

        let flagged = flag_outliers(&series, &stats, method, &self.outliers);
        let (threshold, bounds) = match method {
            OutlierMethod::ZScore => (self.outliers.zscore_threshold, None),
            OutlierMethod::Iqr => (
                self.outliers.iqr_multiplier,
                Some(stats.iqr_bounds(self.outliers.iqr_multiplier)),
            ),
        };

        let meta = json!({
            "column": series.column,
            "method": method,
            "threshold": threshold,
            "bounds": bounds,
            "flagged_rows": flagged,
            "flagged_count": flagged.len(),
        });

        Ok(PromptResponse::Plot(plot::outlier_figure(&series, &flagged, meta)))
    }
}

/// Row positions flagged as outliers. z-scores use the sample standard
/// deviation; IQR bounds use linear-interpolated quartiles.
pub fn flag_outliers(
    series: &Series,
    stats: &NumericStatistics,
    method: OutlierMethod,
    config: &OutlierConfig,
) -> Vec<usize> {
    series
        .points()
        .filter(|&(_, value)| match method {
            OutlierMethod::ZScore => stats.z_score(value).abs() > config.zscore_threshold,
            OutlierMethod::Iqr => stats.is_outlier_iqr(value, config.iqr_multiplier),
        })
        .map(|(row, _)| row)
        .collect()
}

fn numeric_series(
    dataset: &Dataset,
    column: &str,
) -> Result<(Series, Option<NumericStatistics>)> {
    let index = dataset.resolve_column(column)?;
    let schema = &dataset.schema().columns[index];
    if !schema.inferred_type.is_numeric() {
        return Err(DatamendError::NonNumericColumn(schema.name.clone()));
    }
    Ok((series_for(dataset, index), schema.statistics.clone()))
}

fn series_for(dataset: &Dataset, index: usize) -> Series {
    let schema = dataset.schema();
    let timestamp = schema.timestamp();

    let x = (0..dataset.row_count())
        .map(|row| match timestamp {
            Some(_) => dataset
                .row_timestamp(row)
                .map_or(Json::Null, |t| json!(t.format("%Y-%m-%d %H:%M:%S").to_string())),
            None => json!(row),
        })
        .collect();

    Series {
        column: schema.columns[index].name.clone(),
        x_title: timestamp.map_or_else(|| "row".to_string(), |ts| ts.name.clone()),
        x,
        y: dataset.column(index).map(|v| v.as_f64()).collect(),
    }
}

/// Up to four decimals, trailing zeros trimmed.
fn fmt_num(value: f64) -> String {
    let text = format!("{:.4}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" { "0".to_string() } else { text.to_string() }
}
