//! Persistence sink for ingested documents.
//!
//! [`DocumentStore`] is the seam toward whatever database backs the service. A batch is saved
//! all-or-nothing and identities are assigned at save time.

use std::sync::Mutex;

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;
use tracing::warn;

use crate::types::{FiscalDocument, StoredDocument};

/// Monetary columns hold at most 19 digits, 2 of them decimals.
const AMOUNT_SCALE: u32 = 2;
const AMOUNT_MAX_INTEGER_DIGITS: u32 = 17;
const LONG_TEXT_LIMIT: usize = 500;
const TEXT_LIMIT: usize = 255;
const LONG_TEXT_FIELDS: [&str; 3] = ["cufeCude", "issuerName", "receiverName"];

/// Failure of the persistence layer. Nothing from the batch is stored when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing storage could not be reached or used.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A document violates a column constraint.
    #[error("constraint violation: {0}")]
    Constraint(String),
}

/// Bulk-save capability plus the pass-through reads of the document listing.
pub trait DocumentStore: Send + Sync {
    /// Save every document in one operation, returning them with their assigned identities in
    /// input order.
    fn save_all(&self, documents: Vec<FiscalDocument>) -> Result<Vec<StoredDocument>, StoreError>;

    /// Every stored document, in identity order.
    fn find_all(&self) -> Result<Vec<StoredDocument>, StoreError>;

    /// The document with identity `id`, if any.
    fn find_by_id(&self, id: u64) -> Result<Option<StoredDocument>, StoreError>;
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    documents: Vec<StoredDocument>,
}

/// Process-local [`DocumentStore`] enforcing the fiscal-document column contract.
///
/// Amounts are rounded to 2 decimals (half away from zero) on save, as a `NUMERIC(19, 2)`
/// column would.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    inner: Mutex<Inner>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    ///
    /// A poisoned store reports 0 (and logs it); the fallible reads return
    /// [`StoreError::Unavailable`] instead.
    pub fn len(&self) -> usize {
        match self.lock() {
            Ok(inner) => inner.documents.len(),
            Err(err) => {
                warn!("{err}");
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("document store lock poisoned".to_string()))
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn save_all(&self, documents: Vec<FiscalDocument>) -> Result<Vec<StoredDocument>, StoreError> {
        let documents = documents
            .into_iter()
            .enumerate()
            .map(|(idx, doc)| conform(doc).map_err(|msg| StoreError::Constraint(format!("document {}: {msg}", idx + 1))))
            .collect::<Result<Vec<_>, _>>()?;

        let mut inner = self.lock()?;
        let mut saved = Vec::with_capacity(documents.len());
        for document in documents {
            inner.next_id += 1;
            saved.push(StoredDocument {
                id: inner.next_id,
                document,
            });
        }
        inner.documents.extend(saved.iter().cloned());
        Ok(saved)
    }

    fn find_all(&self) -> Result<Vec<StoredDocument>, StoreError> {
        Ok(self.lock()?.documents.clone())
    }

    fn find_by_id(&self, id: u64) -> Result<Option<StoredDocument>, StoreError> {
        Ok(self.lock()?.documents.iter().find(|d| d.id == id).cloned())
    }
}

/// Apply the column contract to one document: round amounts, check lengths and magnitudes.
fn conform(mut doc: FiscalDocument) -> Result<FiscalDocument, String> {
    for (name, value) in doc.text_fields() {
        let limit = if LONG_TEXT_FIELDS.contains(&name) {
            LONG_TEXT_LIMIT
        } else {
            TEXT_LIMIT
        };
        if let Some(v) = value {
            let len = v.chars().count();
            if len > limit {
                return Err(format!("{name} is {len} characters long (limit {limit})"));
            }
        }
    }

    let max_amount = Decimal::from(10u64.pow(AMOUNT_MAX_INTEGER_DIGITS));
    for amount in doc.amounts_mut().into_iter().flatten() {
        let rounded = amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
        if rounded.abs() >= max_amount {
            return Err(format!(
                "amount {rounded} exceeds {AMOUNT_MAX_INTEGER_DIGITS} integer digits"
            ));
        }
        *amount = rounded;
    }
    Ok(doc)
}
