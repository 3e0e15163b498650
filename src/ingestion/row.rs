//! Row mapping: one data row into one [`FiscalDocument`].
//!
//! Columns are read by position, following [`super::header::EXPECTED_COLUMNS`]. A row either
//! maps completely or is dropped with a [`RowFailure`]; it is never half-filled.

use std::fmt;

use tracing::debug;

use crate::types::FiscalDocument;

use super::cell::CellValue;
use super::coerce::{CellError, CoerceResult, DateFormats, as_decimal, as_issue_date, as_reception_date, as_text};
use super::header::EXPECTED_COLUMNS;

/// One data row of the first sheet, with cells in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    /// 1-based row number as shown by spreadsheet applications (the header is row 1).
    pub number: usize,
    pub cells: Vec<CellValue>,
}

impl SheetRow {
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(CellValue::is_blank)
    }
}

/// Why a data row was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    /// 1-based row number.
    pub row: usize,
    /// Name of the column that made the row unusable.
    pub column: &'static str,
    pub message: String,
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} column '{}': {}", self.row, self.column, self.message)
    }
}

/// Result of mapping every data row: accepted documents plus the rows that were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowOutcome {
    pub documents: Vec<FiscalDocument>,
    pub dropped: Vec<RowFailure>,
}

/// Map one data row into a [`FiscalDocument`].
pub fn map_row(row: &SheetRow, formats: &DateFormats) -> Result<FiscalDocument, RowFailure> {
    let reader = RowReader { row, formats };

    Ok(FiscalDocument {
        document_type: reader.text(0)?,
        cufe_cude: reader.text(1)?,
        folio: reader.text(2)?,
        prefix: reader.text(3)?,
        currency: reader.text(4)?,
        payment_form: reader.text(5)?,
        payment_method: reader.text(6)?,
        issue_date: reader.field(7, as_issue_date)?,
        reception_date: reader.field(8, as_reception_date)?,
        issuer_nit: reader.text(9)?,
        issuer_name: reader.text(10)?,
        receiver_nit: reader.text(11)?,
        receiver_name: reader.text(12)?,
        iva: reader.decimal(13)?,
        ica: reader.decimal(14)?,
        ic: reader.decimal(15)?,
        inc: reader.decimal(16)?,
        timbre: reader.decimal(17)?,
        inc_bags: reader.decimal(18)?,
        in_carbon: reader.decimal(19)?,
        in_fuels: reader.decimal(20)?,
        ic_data: reader.decimal(21)?,
        icl: reader.decimal(22)?,
        inpp: reader.decimal(23)?,
        ibua: reader.decimal(24)?,
        icui: reader.decimal(25)?,
        rete_iva: reader.decimal(26)?,
        rete_rent: reader.decimal(27)?,
        rete_ica: reader.decimal(28)?,
        total: reader.decimal(29)?,
        status: reader.text(30)?,
        group_info: reader.text(31)?,
    })
}

/// Map every row, skipping blank ones and collecting failures instead of stopping.
pub fn map_rows<I>(rows: I, formats: &DateFormats) -> RowOutcome
where
    I: IntoIterator<Item = SheetRow>,
{
    rows.into_iter()
        .filter(|row| !row.is_blank())
        .fold(RowOutcome::default(), |mut acc, row| {
            match map_row(&row, formats) {
                Ok(doc) => acc.documents.push(doc),
                Err(failure) => {
                    debug!(row = failure.row, column = failure.column, "dropping row: {}", failure.message);
                    acc.dropped.push(failure);
                }
            }
            acc
        })
}

struct RowReader<'a> {
    row: &'a SheetRow,
    formats: &'a DateFormats,
}

impl RowReader<'_> {
    fn field<T, F>(&self, idx: usize, coerce: F) -> Result<Option<T>, RowFailure>
    where
        F: Fn(&CellValue, &DateFormats) -> CoerceResult<T>,
    {
        let cell = self.row.cells.get(idx).unwrap_or(&CellValue::Blank);
        coerce(cell, self.formats).map_err(|CellError(value)| RowFailure {
            row: self.row.number,
            column: EXPECTED_COLUMNS[idx],
            message: format!("cell holds spreadsheet error value {value}"),
        })
    }

    fn text(&self, idx: usize) -> Result<Option<String>, RowFailure> {
        self.field(idx, |c, _| as_text(c))
    }

    fn decimal(&self, idx: usize) -> Result<Option<rust_decimal::Decimal>, RowFailure> {
        self.field(idx, |c, _| as_decimal(c))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;

    fn sample_cells() -> Vec<CellValue> {
        let mut cells = vec![
            CellValue::Text("Factura electrónica".to_string()),
            CellValue::Text("cufe-abc-123".to_string()),
            CellValue::Number(1001.0),
            CellValue::Text("FE".to_string()),
            CellValue::Text("COP".to_string()),
            CellValue::Text("Contado".to_string()),
            CellValue::Text("Transferencia".to_string()),
            CellValue::Text("30-10-2025".to_string()),
            CellValue::Text("31-10-2025 08:15:00".to_string()),
            CellValue::Number(900123456.0),
            CellValue::Text("Proveedor SAS".to_string()),
            CellValue::Text("800987654".to_string()),
            CellValue::Text("Cliente Ltda".to_string()),
            CellValue::Text("19.000,00".to_string()),
        ];
        // ICA .. Rete ICA left blank
        cells.extend(std::iter::repeat_n(CellValue::Blank, 15));
        cells.push(CellValue::Number(119000.0));
        cells.push(CellValue::Text("Aceptado".to_string()));
        cells.push(CellValue::Text("Compras".to_string()));
        cells
    }

    fn row(number: usize, cells: Vec<CellValue>) -> SheetRow {
        SheetRow { number, cells }
    }

    #[test]
    fn maps_every_column_by_position() {
        let doc = map_row(&row(2, sample_cells()), &DateFormats::default()).unwrap();
        assert_eq!(doc.document_type.as_deref(), Some("Factura electrónica"));
        assert_eq!(doc.folio.as_deref(), Some("1001"));
        assert_eq!(doc.issue_date, NaiveDate::from_ymd_opt(2025, 10, 30));
        assert_eq!(doc.reception_date, NaiveDate::from_ymd_opt(2025, 10, 31));
        assert_eq!(doc.issuer_nit.as_deref(), Some("900123456"));
        assert_eq!(doc.iva, Some(Decimal::from_str("19000").unwrap()));
        assert_eq!(doc.ica, None);
        assert_eq!(doc.total, Some(Decimal::from(119000)));
        assert_eq!(doc.status.as_deref(), Some("Aceptado"));
        assert_eq!(doc.group_info.as_deref(), Some("Compras"));
    }

    #[test]
    fn short_rows_read_missing_cells_as_absent() {
        let doc = map_row(&row(3, sample_cells()[..5].to_vec()), &DateFormats::default()).unwrap();
        assert_eq!(doc.currency.as_deref(), Some("COP"));
        assert_eq!(doc.total, None);
        assert_eq!(doc.group_info, None);
    }

    #[test]
    fn unparseable_date_keeps_the_row() {
        let mut cells = sample_cells();
        cells[7] = CellValue::Text("not-a-date".to_string());
        let doc = map_row(&row(2, cells), &DateFormats::default()).unwrap();
        assert_eq!(doc.issue_date, None);
        assert!(doc.cufe_cude.is_some());
    }

    #[test]
    fn error_cell_drops_the_row() {
        let mut cells = sample_cells();
        cells[8] = CellValue::Error("#VALUE!".to_string());
        let failure = map_row(&row(6, cells), &DateFormats::default()).unwrap_err();
        assert_eq!(failure.row, 6);
        assert_eq!(failure.column, "Fecha Recepción");
        assert!(failure.message.contains("#VALUE!"));
    }

    #[test]
    fn one_corrupted_row_does_not_abort_the_batch() {
        let rows: Vec<SheetRow> = (0..10)
            .map(|i| {
                let mut cells = sample_cells();
                if i == 4 {
                    cells[7] = CellValue::Error("#REF!".to_string());
                }
                row(i + 2, cells)
            })
            .collect();

        let outcome = map_rows(rows, &DateFormats::default());
        assert_eq!(outcome.documents.len(), 9);
        assert_eq!(outcome.dropped.len(), 1);
        assert_eq!(outcome.dropped[0].row, 6);
    }

    #[test]
    fn blank_rows_are_skipped_silently() {
        let rows = vec![
            row(2, sample_cells()),
            row(3, vec![CellValue::Blank; 32]),
            row(4, vec![CellValue::Text("  ".to_string())]),
            row(5, Vec::new()),
            row(6, sample_cells()),
        ];
        let outcome = map_rows(rows, &DateFormats::default());
        assert_eq!(outcome.documents.len(), 2);
        assert!(outcome.dropped.is_empty());
    }
}
