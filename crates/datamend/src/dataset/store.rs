//! The session-scoped dataset store.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::table::Dataset;
use crate::config::DatamendConfig;
use crate::detection::{DetectionRun, IntervalDetector, IntervalRegistry};
use crate::error::{DatamendError, Result};
use crate::export::{ExportFormat, ExportService, ExportedFile};
use crate::input::{Parser, SourceMetadata};
use crate::prompt::{PromptDispatcher, PromptResponse};
use crate::treatment::{Selection, SelectionRequest, TreatmentEngine, TreatmentReport};

/// What an upload produced.
#[derive(Debug, Clone, Serialize)]
pub struct UploadSummary {
    pub file: String,
    pub columns: Vec<String>,
    pub rows: usize,
    pub timestamp_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_period_ms: Option<i64>,
    pub hash: String,
}

#[derive(Debug, Clone)]
struct ActiveDataset {
    dataset: Dataset,
    source: SourceMetadata,
    registry: IntervalRegistry,
}

/// Holds at most one active dataset and routes every operation through it.
///
/// Uploads replace the active dataset only when the new file parses. Detector
/// output is kept per generation so treatment requests can refer to
/// intervals by id or by bounds.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    config: DatamendConfig,
    parser: Parser,
    detector: IntervalDetector,
    engine: TreatmentEngine,
    dispatcher: PromptDispatcher,
    exporter: ExportService,
    active: Option<ActiveDataset>,
    uploads: u64,
}

impl Default for DatasetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::with_config(DatamendConfig::default())
    }

    pub fn with_config(config: DatamendConfig) -> Self {
        let detector = IntervalDetector::with_tolerance(config.detection.gap_tolerance);
        Self {
            parser: Parser::with_config(config.parser.clone()),
            dispatcher: PromptDispatcher::with_config(config.outliers.clone(), detector.clone()),
            detector,
            engine: TreatmentEngine::with_max_inserted_rows(config.detection.max_inserted_rows),
            exporter: ExportService::new(),
            active: None,
            uploads: 0,
            config,
        }
    }

    pub fn config(&self) -> &DatamendConfig {
        &self.config
    }

    // =========================================================================
    // Upload
    // =========================================================================

    /// Parse `bytes` and make the result the active dataset.
    ///
    /// On failure the previously active dataset is left untouched.
    pub fn upload(&mut self, name: &str, bytes: &[u8]) -> Result<UploadSummary> {
        let (table, source) = self.parser.parse_bytes(name, bytes)?;
        let mut dataset = Dataset::from_table(table, self.config.timestamp_column.as_deref())?;

        self.uploads += 1;
        dataset.set_epoch(self.uploads);

        let timestamp = dataset.schema().timestamp();
        let summary = UploadSummary {
            file: source.file.clone(),
            columns: dataset.column_names(),
            rows: dataset.row_count(),
            timestamp_column: timestamp.map(|c| c.name.clone()),
            expected_period_ms: timestamp.and_then(|c| c.expected_period_ms),
            hash: source.hash.clone(),
        };

        info!(
            file = %summary.file,
            rows = summary.rows,
            columns = summary.columns.len(),
            timestamp_column = summary.timestamp_column.as_deref(),
            hash = %summary.hash,
            "dataset uploaded"
        );

        self.active = Some(ActiveDataset {
            dataset,
            source,
            registry: IntervalRegistry::new(),
        });

        Ok(summary)
    }

    /// Read a file from disk and upload it.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<UploadSummary> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| DatamendError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.upload(&name, &bytes)
    }

    /// Drop the active dataset.
    pub fn clear(&mut self) {
        if self.active.take().is_some() {
            info!("dataset cleared");
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn is_loaded(&self) -> bool {
        self.active.is_some()
    }

    fn active(&self) -> Result<&ActiveDataset> {
        self.active.as_ref().ok_or(DatamendError::NoActiveDataset)
    }

    fn active_mut(&mut self) -> Result<&mut ActiveDataset> {
        self.active.as_mut().ok_or(DatamendError::NoActiveDataset)
    }

    pub fn current(&self) -> Result<&Dataset> {
        Ok(&self.active()?.dataset)
    }

    pub fn source(&self) -> Result<&SourceMetadata> {
        Ok(&self.active()?.source)
    }

    pub fn columns(&self) -> Result<Vec<String>> {
        Ok(self.current()?.column_names())
    }

    pub fn generation(&self) -> Result<u64> {
        Ok(self.current()?.generation())
    }

    // =========================================================================
    // Detection
    // =========================================================================

    /// Detect missing time ticks and record them as the latest datetime output.
    pub fn detect_datetime_gaps(&mut self) -> Result<DetectionRun> {
        let detector = self.detector.clone();
        let active = self.active_mut()?;
        let run = detector.detect_datetime_gaps(&active.dataset, active.dataset.generation())?;
        active.registry.record(&run);

        debug!(
            generation = run.generation,
            intervals = run.intervals.len(),
            "recorded datetime gaps"
        );
        Ok(run)
    }

    /// Detect missing-value runs in `column` and record them.
    pub fn detect_value_gaps(&mut self, column: &str) -> Result<DetectionRun> {
        let detector = self.detector.clone();
        let active = self.active_mut()?;
        let index = active.dataset.resolve_column(column)?;
        let name = active.dataset.schema().columns[index].name.clone();

        let run = detector.detect_value_gaps(&active.dataset, &name, active.dataset.generation())?;
        active.registry.record(&run);

        debug!(
            column = %name,
            generation = run.generation,
            intervals = run.intervals.len(),
            "recorded value gaps"
        );
        Ok(run)
    }

    // =========================================================================
    // Treatment
    // =========================================================================

    /// Resolve a wire request against the latest detector output.
    pub fn resolve(&self, request: &SelectionRequest) -> Result<Selection> {
        let active = self.active()?;
        request.resolve(&active.dataset, &active.registry)
    }

    /// Apply a resolved selection. Detector output from before the apply is
    /// discarded once the dataset advances.
    pub fn apply(&mut self, selection: &Selection) -> Result<TreatmentReport> {
        let engine = self.engine.clone();
        let active = self.active_mut()?;

        match engine.apply(&mut active.dataset, selection) {
            Ok(report) => {
                active.registry.clear();
                Ok(report)
            }
            Err(e) => {
                warn!(kind = e.kind(), "rejected treatment: {}", e);
                Err(e)
            }
        }
    }

    /// Resolve and apply a wire request.
    pub fn apply_request(&mut self, request: &SelectionRequest) -> Result<TreatmentReport> {
        let selection = self.resolve(request).inspect_err(|e| {
            warn!(kind = e.kind(), "rejected selection: {}", e);
        })?;
        self.apply(&selection)
    }

    /// Like [`apply_request`](Self::apply_request), but only value-gap
    /// intervals are accepted.
    pub fn apply_value_gap_request(&mut self, request: &SelectionRequest) -> Result<TreatmentReport> {
        let selection = self.resolve(request)?;
        if let Some(interval) = selection.intervals.iter().find(|i| i.is_datetime_gap()) {
            let err = DatamendError::InvalidInterval(format!(
                "{} is not a value gap; use apply_treatment for datetime gaps",
                interval
            ));
            warn!(kind = err.kind(), "rejected selection: {}", err);
            return Err(err);
        }
        self.apply(&selection)
    }

    // =========================================================================
    // Export and prompts
    // =========================================================================

    /// Serialize the current dataset. Without an explicit format the
    /// configured default is used, then the upload's own format.
    pub fn export(&self, format: Option<ExportFormat>) -> Result<ExportedFile> {
        let active = self.active()?;
        let format = format
            .or(self.config.export_format)
            .unwrap_or_else(|| ExportFormat::for_source(&active.source));
        self.exporter.export(&active.dataset, &active.source, format)
    }

    pub fn dispatch(&self, prompt: &str) -> Result<PromptResponse> {
        let active = self.active()?;
        self.dispatcher.dispatch(&active.dataset, prompt)
    }
}
