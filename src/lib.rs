//! `fiscal-ingest` reads fiscal-document spreadsheets (`.xlsx` / `.xls`) exported by
//! e-invoicing and accounting systems, validates them against a fixed column contract, and
//! bulk-saves one [`types::FiscalDocument`] per data row.
//!
//! The primary entrypoint is [`ingestion::ingest_upload`], which takes the uploaded bytes, the
//! original file name and a [`store::DocumentStore`].
//!
//! ## Pipeline
//!
//! - **Format**: chosen from the file extension; anything but `.xlsx`/`.xls` is rejected before
//!   the stream is opened. Only the first sheet is read.
//! - **Header contract**: row 1 must hold the 32 names of [`ingestion::EXPECTED_COLUMNS`] in
//!   order (case-insensitive). Any deviation fails the whole upload with a diagnostic listing
//!   every missing and mismatched column.
//! - **Rows**: each cell is coerced by column semantics. Amounts accept `1.234.567,89`,
//!   `1234,56` and `1234.56`; dates accept `30-10-2025` first and then a list of fallback
//!   patterns ([`ingestion::DateFormats`]). A value that cannot be read is stored as absent.
//!   A row holding a spreadsheet error value (`#REF!`, ...) is dropped, and the batch goes on.
//! - **Persistence**: accepted rows are saved in a single all-or-nothing call.
//!
//! ## Quick example
//!
//! ```no_run
//! use fiscal_ingest::ingestion::{ingest_upload, IngestionOptions};
//! use fiscal_ingest::store::{DocumentStore, InMemoryDocumentStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("documentos.xlsx")?;
//! let store = InMemoryDocumentStore::new();
//!
//! let report = ingest_upload("documentos.xlsx", &bytes, &store, &IngestionOptions::default())?;
//! for row in &report.dropped {
//!     eprintln!("skipped {row}");
//! }
//! println!("stored={}", store.find_all()?.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: coercers, header validation, row mapping and the orchestrator
//! - [`types`]: the fiscal-document record
//! - [`store`]: persistence sink
//! - [`error`]: error types used across ingestion
//! - `http` (feature `server`): upload/list/get HTTP routes

pub mod error;
#[cfg(feature = "server")]
pub mod http;
pub mod ingestion;
pub mod store;
pub mod types;

pub use error::{IngestionError, IngestionResult};
