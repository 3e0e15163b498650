//! Core data model types for ingestion.
//!
//! A spreadsheet row becomes a [`FiscalDocument`] value with no identity; the persistence sink
//! turns it into a [`StoredDocument`] carrying the identity assigned at save time.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A tax-relevant accounting document (invoice, credit note, ...) read from one spreadsheet row.
///
/// Every field is optional: a blank cell or a value that could not be coerced is stored as
/// `None`, which is distinct from a zero amount.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiscalDocument {
    pub document_type: Option<String>,
    /// CUFE/CUDE: unique e-invoicing identifier code.
    pub cufe_cude: Option<String>,
    pub folio: Option<String>,
    pub prefix: Option<String>,
    pub currency: Option<String>,
    pub payment_form: Option<String>,
    pub payment_method: Option<String>,

    pub issue_date: Option<NaiveDate>,
    /// Date part only; any time of day in the source cell is discarded.
    pub reception_date: Option<NaiveDate>,

    pub issuer_nit: Option<String>,
    pub issuer_name: Option<String>,
    pub receiver_nit: Option<String>,
    pub receiver_name: Option<String>,

    pub iva: Option<Decimal>,
    pub ica: Option<Decimal>,
    pub ic: Option<Decimal>,
    pub inc: Option<Decimal>,
    pub timbre: Option<Decimal>,
    pub inc_bags: Option<Decimal>,
    pub in_carbon: Option<Decimal>,
    pub in_fuels: Option<Decimal>,
    pub ic_data: Option<Decimal>,
    pub icl: Option<Decimal>,
    pub inpp: Option<Decimal>,
    pub ibua: Option<Decimal>,
    pub icui: Option<Decimal>,
    pub rete_iva: Option<Decimal>,
    pub rete_rent: Option<Decimal>,
    pub rete_ica: Option<Decimal>,
    pub total: Option<Decimal>,

    pub status: Option<String>,
    pub group_info: Option<String>,
}

impl FiscalDocument {
    /// Mutable references to every monetary field, in column order.
    pub(crate) fn amounts_mut(&mut self) -> [&mut Option<Decimal>; 17] {
        [
            &mut self.iva,
            &mut self.ica,
            &mut self.ic,
            &mut self.inc,
            &mut self.timbre,
            &mut self.inc_bags,
            &mut self.in_carbon,
            &mut self.in_fuels,
            &mut self.ic_data,
            &mut self.icl,
            &mut self.inpp,
            &mut self.ibua,
            &mut self.icui,
            &mut self.rete_iva,
            &mut self.rete_rent,
            &mut self.rete_ica,
            &mut self.total,
        ]
    }

    /// Every free-text field paired with its JSON name, in column order.
    pub(crate) fn text_fields(&self) -> [(&'static str, Option<&str>); 13] {
        [
            ("documentType", self.document_type.as_deref()),
            ("cufeCude", self.cufe_cude.as_deref()),
            ("folio", self.folio.as_deref()),
            ("prefix", self.prefix.as_deref()),
            ("currency", self.currency.as_deref()),
            ("paymentForm", self.payment_form.as_deref()),
            ("paymentMethod", self.payment_method.as_deref()),
            ("issuerNit", self.issuer_nit.as_deref()),
            ("issuerName", self.issuer_name.as_deref()),
            ("receiverNit", self.receiver_nit.as_deref()),
            ("receiverName", self.receiver_name.as_deref()),
            ("status", self.status.as_deref()),
            ("groupInfo", self.group_info.as_deref()),
        ]
    }
}

/// A [`FiscalDocument`] after persistence, carrying its assigned identity.
///
/// Serializes as a flat JSON object: `{"id": 1, "documentType": ..., ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: u64,
    #[serde(flatten)]
    pub document: FiscalDocument,
}
