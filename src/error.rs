use thiserror::Error;

use crate::ingestion::header::HeaderReport;
use crate::store::StoreError;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned by ingestion functions.
///
/// Every variant is fatal for the whole upload: nothing is persisted when one of these is
/// returned. Per-row data defects are reported as [`crate::ingestion::RowFailure`] instead and
/// never abort a batch.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The workbook could not be opened or its first sheet could not be read.
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// The file name does not end in `.xlsx` or `.xls`.
    #[error("unsupported file format for '{filename}': the file must be an Excel workbook (.xlsx or .xls)")]
    UnsupportedFormat { filename: String },

    /// The upload carried no bytes.
    #[error("the uploaded file is empty")]
    EmptyFile,

    /// The upload exceeds the configured maximum size.
    #[error(
        "the file exceeds the maximum allowed size of {:.0}MB. Current size: {:.2} MB",
        mib(.limit),
        mib(.size)
    )]
    FileTooLarge { size: u64, limit: u64 },

    /// The first sheet has no header row at all.
    #[error("the workbook has no header row in its first sheet")]
    MissingHeader,

    /// The header row does not match the fixed column contract.
    #[error("{0}")]
    HeaderMismatch(HeaderReport),

    /// The bulk save failed; nothing from the batch was stored.
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

fn mib(bytes: &u64) -> f64 {
    *bytes as f64 / (1024.0 * 1024.0)
}

impl IngestionError {
    /// Whether the failure was caused by the uploaded input rather than by the server.
    ///
    /// Rejected input and contract violations are client errors; workbook, I/O and persistence
    /// failures are not.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IngestionError::UnsupportedFormat { .. }
                | IngestionError::EmptyFile
                | IngestionError::FileTooLarge { .. }
                | IngestionError::MissingHeader
                | IngestionError::HeaderMismatch(_)
        )
    }
}
