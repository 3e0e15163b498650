//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`ingest_upload`] (from [`unified`]) which:
//!
//! - selects the workbook reader by file extension (`.xlsx` / `.xls`)
//! - validates the header row against [`header::EXPECTED_COLUMNS`]
//! - maps data rows into [`crate::types::FiscalDocument`]s, dropping rows that cannot be mapped
//! - bulk-saves the batch through a [`crate::store::DocumentStore`]
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]
//!
//! The building blocks are public too:
//! - [`cell`]: tagged cell values
//! - [`coerce`]: text/decimal/date coercers
//! - [`header`]: column-contract validation
//! - [`row`]: row mapping
//! - [`excel`]: workbook access

pub mod cell;
pub mod coerce;
pub mod excel;
pub mod header;
pub mod observability;
pub mod row;
pub mod unified;

pub use cell::CellValue;
pub use coerce::DateFormats;
pub use header::{EXPECTED_COLUMNS, HeaderReport};
pub use observability::{
    CompositeObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats, TracingObserver,
};
pub use row::{RowFailure, SheetRow};
pub use unified::{
    DEFAULT_MAX_FILE_SIZE, IngestionOptions, IngestionReport, WorkbookFormat, get_document, ingest_from_path,
    ingest_reader, ingest_upload, list_documents,
};
