//! Ingestion orchestrator.
//!
//! Most callers should use [`ingest_upload`], which runs the whole pipeline for one uploaded
//! file:
//!
//! 1. reject empty, oversized or non-Excel uploads before opening anything;
//! 2. open the workbook (format chosen by file extension) and read its first sheet;
//! 3. check the header row against the column contract (fatal on mismatch);
//! 4. map every non-blank data row, dropping the rows that cannot be mapped;
//! 5. bulk-save the accepted documents in one [`DocumentStore::save_all`] call.
//!
//! When an [`IngestionObserver`] is configured, dropped rows, success and failure are reported
//! to it.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{IngestionError, IngestionResult};
use crate::store::{DocumentStore, StoreError};
use crate::types::StoredDocument;

use super::coerce::DateFormats;
use super::excel::{open_workbook, read_first_sheet};
use super::header::validate_header;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::row::{RowFailure, map_rows};

/// Default upload limit: 512 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 512 * 1024 * 1024;

/// Supported workbook formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookFormat {
    /// Office Open XML workbook (`.xlsx`).
    Xlsx,
    /// Legacy binary workbook (`.xls`).
    Xls,
}

impl WorkbookFormat {
    /// Parse a workbook format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            _ => None,
        }
    }

    /// Infer the format from a file name such as `report.xlsx`.
    ///
    /// Matching ignores case, so `REPORT.XLSX` is accepted even though an exact-suffix check on
    /// `.xlsx` would reject it.
    pub fn from_filename(filename: &str) -> Option<Self> {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Options controlling ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// Date patterns used to read text date cells.
    pub date_formats: DateFormats,
    /// Largest accepted upload, in bytes.
    pub max_file_size: u64,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("date_formats", &self.date_formats)
            .field("max_file_size", &self.max_file_size)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            date_formats: DateFormats::default(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Result of a successful ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionReport {
    /// Persisted documents, with their assigned identities, in sheet order.
    pub documents: Vec<StoredDocument>,
    /// Rows that were dropped; they are not part of `documents`.
    pub dropped: Vec<RowFailure>,
}

/// Ingest an uploaded workbook held in memory.
///
/// Empty uploads, uploads larger than [`IngestionOptions::max_file_size`] and file names that are
/// not `.xlsx`/`.xls` are rejected before the workbook is opened.
///
/// # Examples
///
/// ```no_run
/// use fiscal_ingest::ingestion::{ingest_upload, IngestionOptions};
/// use fiscal_ingest::store::InMemoryDocumentStore;
///
/// # fn main() -> Result<(), fiscal_ingest::IngestionError> {
/// let bytes = std::fs::read("documentos.xlsx")?;
/// let store = InMemoryDocumentStore::new();
/// let report = ingest_upload("documentos.xlsx", &bytes, &store, &IngestionOptions::default())?;
/// println!("saved={} dropped={}", report.documents.len(), report.dropped.len());
/// # Ok(())
/// # }
/// ```
pub fn ingest_upload(
    filename: &str,
    bytes: &[u8],
    store: &dyn DocumentStore,
    options: &IngestionOptions,
) -> IngestionResult<IngestionReport> {
    observed(filename, options, |ctx| {
        check_upload(bytes.len() as u64, options)?;
        let format = require_format(ctx)?;
        run_pipeline(Cursor::new(bytes), format, ctx, store, options)
    })
}

/// Ingest a workbook from any seekable stream, using `filename` to pick the format.
///
/// The stream is consumed and dropped before this function returns, on every path.
pub fn ingest_reader<RS>(
    reader: RS,
    filename: &str,
    store: &dyn DocumentStore,
    options: &IngestionOptions,
) -> IngestionResult<IngestionReport>
where
    RS: Read + Seek,
{
    observed(filename, options, |ctx| {
        let format = require_format(ctx)?;
        run_pipeline(reader, format, ctx, store, options)
    })
}

/// Ingest a workbook file from disk.
///
/// The extension is checked before the file is opened.
pub fn ingest_from_path(
    path: impl AsRef<Path>,
    store: &dyn DocumentStore,
    options: &IngestionOptions,
) -> IngestionResult<IngestionReport> {
    let path = path.as_ref();
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    observed(&filename, options, |ctx| {
        let format = require_format(ctx)?;
        let file = File::open(path)?;
        check_upload(file.metadata()?.len(), options)?;
        run_pipeline(BufReader::new(file), format, ctx, store, options)
    })
}

/// Every previously ingested document.
pub fn list_documents(store: &dyn DocumentStore) -> Result<Vec<StoredDocument>, StoreError> {
    store.find_all()
}

/// One previously ingested document by identity.
pub fn get_document(store: &dyn DocumentStore, id: u64) -> Result<Option<StoredDocument>, StoreError> {
    store.find_by_id(id)
}

fn check_upload(size: u64, options: &IngestionOptions) -> IngestionResult<()> {
    if size == 0 {
        return Err(IngestionError::EmptyFile);
    }
    if size > options.max_file_size {
        return Err(IngestionError::FileTooLarge {
            size,
            limit: options.max_file_size,
        });
    }
    Ok(())
}

fn require_format(ctx: &IngestionContext) -> IngestionResult<WorkbookFormat> {
    ctx.format.ok_or_else(|| IngestionError::UnsupportedFormat {
        filename: ctx.filename.clone(),
    })
}

fn run_pipeline<RS>(
    reader: RS,
    format: WorkbookFormat,
    ctx: &IngestionContext,
    store: &dyn DocumentStore,
    options: &IngestionOptions,
) -> IngestionResult<IngestionReport>
where
    RS: Read + Seek,
{
    let sheet = {
        let mut workbook = open_workbook(reader, format)?;
        read_first_sheet(&mut workbook)?
    };
    debug!(filename = %ctx.filename, sheet = %sheet.name, rows = sheet.rows.len(), "workbook read");

    validate_header(&sheet.header).map_err(IngestionError::HeaderMismatch)?;

    let outcome = map_rows(sheet.rows, &options.date_formats);
    if let Some(obs) = options.observer.as_ref() {
        for failure in &outcome.dropped {
            obs.on_row_dropped(ctx, failure);
        }
    }

    let rows_read = outcome.documents.len() + outcome.dropped.len();
    let documents = store.save_all(outcome.documents)?;
    info!(
        filename = %ctx.filename,
        rows_read,
        persisted = documents.len(),
        dropped = outcome.dropped.len(),
        "fiscal document batch saved"
    );

    Ok(IngestionReport {
        documents,
        dropped: outcome.dropped,
    })
}

/// Run `f` and report its outcome to the configured observer.
fn observed<F>(filename: &str, options: &IngestionOptions, f: F) -> IngestionResult<IngestionReport>
where
    F: FnOnce(&IngestionContext) -> IngestionResult<IngestionReport>,
{
    let ctx = IngestionContext {
        filename: filename.to_string(),
        format: WorkbookFormat::from_filename(filename),
    };

    let result = f(&ctx);

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(report) => obs.on_success(
                &ctx,
                IngestionStats {
                    rows_read: report.documents.len() + report.dropped.len(),
                    rows_persisted: report.documents.len(),
                    rows_dropped: report.dropped.len(),
                },
            ),
            Err(e) => {
                let sev = severity_for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

fn severity_for_error(e: &IngestionError) -> IngestionSeverity {
    match e {
        IngestionError::Io(_) | IngestionError::Persistence(_) => IngestionSeverity::Critical,
        IngestionError::Excel(calamine::Error::Io(_)) => IngestionSeverity::Critical,
        IngestionError::Excel(_)
        | IngestionError::UnsupportedFormat { .. }
        | IngestionError::EmptyFile
        | IngestionError::FileTooLarge { .. }
        | IngestionError::MissingHeader
        | IngestionError::HeaderMismatch(_) => IngestionSeverity::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryDocumentStore;

    #[test]
    fn format_is_sniffed_from_the_extension() {
        assert_eq!(WorkbookFormat::from_filename("a.xlsx"), Some(WorkbookFormat::Xlsx));
        assert_eq!(WorkbookFormat::from_filename("A.XLS"), Some(WorkbookFormat::Xls));
        assert_eq!(WorkbookFormat::from_filename("report.csv"), None);
        assert_eq!(WorkbookFormat::from_filename("xlsx"), None);
    }

    #[test]
    fn csv_upload_is_rejected_before_reading() {
        let store = InMemoryDocumentStore::new();
        let err = ingest_upload("report.csv", b"a,b,c", &store, &IngestionOptions::default()).unwrap_err();
        assert!(matches!(err, IngestionError::UnsupportedFormat { ref filename } if filename == "report.csv"));
        assert!(err.is_client_error());
        assert!(store.is_empty());
    }

    #[test]
    fn empty_upload_is_rejected() {
        let store = InMemoryDocumentStore::new();
        let err = ingest_upload("a.xlsx", b"", &store, &IngestionOptions::default()).unwrap_err();
        assert!(matches!(err, IngestionError::EmptyFile));
    }

    #[test]
    fn oversized_upload_is_rejected_with_size_in_message() {
        let store = InMemoryDocumentStore::new();
        let opts = IngestionOptions {
            max_file_size: 4,
            ..Default::default()
        };
        let err = ingest_upload("a.xlsx", b"12345", &store, &opts).unwrap_err();
        assert!(matches!(err, IngestionError::FileTooLarge { size: 5, limit: 4 }));
        assert!(err.to_string().contains("Current size: 0.00 MB"));
    }

    #[test]
    fn garbage_with_excel_name_fails_inside_the_reader() {
        let store = InMemoryDocumentStore::new();
        let err = ingest_upload("a.xlsx", b"definitely not a zip", &store, &IngestionOptions::default())
            .unwrap_err();
        assert!(matches!(err, IngestionError::Excel(_)));
        assert!(!err.is_client_error());
        assert!(store.is_empty());
    }

    #[test]
    fn severity_classification() {
        assert_eq!(severity_for_error(&IngestionError::EmptyFile), IngestionSeverity::Error);
        assert_eq!(
            severity_for_error(&IngestionError::Persistence(StoreError::Unavailable("down".into()))),
            IngestionSeverity::Critical
        );
    }
}
