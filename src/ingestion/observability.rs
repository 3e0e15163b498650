use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::IngestionError;

use super::row::RowFailure;
use super::unified::WorkbookFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal, e.g. a dropped row).
    Warning,
    /// Error-level event (the upload was rejected).
    Error,
    /// Critical error (I/O or persistence failures).
    Critical,
}

/// Context about an ingestion attempt.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// Original name of the uploaded file.
    pub filename: String,
    /// Workbook format, when the file name maps to one.
    pub format: Option<WorkbookFormat>,
}

/// Row counts reported on successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    /// Non-blank data rows read from the sheet.
    pub rows_read: usize,
    /// Documents persisted.
    pub rows_persisted: usize,
    /// Rows dropped because they could not be mapped.
    pub rows_dropped: usize,
}

/// Observer interface for ingestion outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IngestionObserver: Send + Sync {
    /// Called when a batch was persisted.
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// Called when a data row was dropped. Never fatal for the batch.
    fn on_row_dropped(&self, _ctx: &IngestionContext, _failure: &RowFailure) {}

    /// Called when ingestion fails.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    /// Called when an ingestion failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_row_dropped(&self, ctx: &IngestionContext, failure: &RowFailure) {
        for o in &self.observers {
            o.on_row_dropped(ctx, failure);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Reports ingestion events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        info!(
            filename = %ctx.filename,
            format = ?ctx.format,
            rows_read = stats.rows_read,
            rows_persisted = stats.rows_persisted,
            rows_dropped = stats.rows_dropped,
            "fiscal documents ingested"
        );
    }

    fn on_row_dropped(&self, ctx: &IngestionContext, failure: &RowFailure) {
        warn!(filename = %ctx.filename, row = failure.row, column = failure.column, "row dropped: {}", failure.message);
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        warn!(filename = %ctx.filename, format = ?ctx.format, ?severity, "ingestion failed: {error}");
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        error!(filename = %ctx.filename, format = ?ctx.format, ?severity, "ALERT ingestion failed: {error}");
    }
}
