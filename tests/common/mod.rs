//! Runtime `.xlsx` fixtures for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use fiscal_ingest::ingestion::EXPECTED_COLUMNS;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet};

pub fn tmp_file(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("fiscal-ingest-{name}-{nanos}.xlsx"))
}

pub fn write_header(ws: &mut Worksheet) {
    for (col, name) in EXPECTED_COLUMNS.iter().enumerate() {
        ws.write_string(0, col as u16, *name).unwrap();
    }
}

/// One data row in the usual export layout: text dates, Latin-American amounts.
pub fn write_document(ws: &mut Worksheet, row: u32, folio: &str) {
    ws.write_string(row, 0, "Factura electrónica").unwrap();
    ws.write_string(row, 1, format!("cufe-{folio}")).unwrap();
    ws.write_string(row, 2, folio).unwrap();
    ws.write_string(row, 3, "FE").unwrap();
    ws.write_string(row, 4, "COP").unwrap();
    ws.write_string(row, 5, "Contado").unwrap();
    ws.write_string(row, 6, "Transferencia").unwrap();
    ws.write_string(row, 7, "30-10-2025").unwrap();
    ws.write_string(row, 8, "30-10-2025 14:30:45").unwrap();
    ws.write_number(row, 9, 900123456).unwrap();
    ws.write_string(row, 10, "Proveedor SAS").unwrap();
    ws.write_string(row, 11, "800987654").unwrap();
    ws.write_string(row, 12, "Cliente Ltda").unwrap();
    ws.write_string(row, 13, "1.234.567,89").unwrap();
    ws.write_string(row, 14, "1234,56").unwrap();
    ws.write_number(row, 15, 1900.5).unwrap();
    ws.write_string(row, 29, "7.469.135,34").unwrap();
    ws.write_string(row, 30, "Aceptado").unwrap();
    ws.write_string(row, 31, "Compras").unwrap();
}

/// A workbook with the contract header and `rows` data rows (folios `F1`, `F2`, ...).
pub fn documents_workbook(rows: u32) -> Workbook {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name("Documentos").unwrap();
    write_header(ws);
    for r in 1..=rows {
        write_document(ws, r, &format!("F{r}"));
    }
    wb
}

pub fn to_bytes(mut wb: Workbook) -> Vec<u8> {
    wb.save_to_buffer().unwrap()
}

/// Native date cell with a date number format.
pub fn write_native_date(ws: &mut Worksheet, row: u32, col: u16, y: u16, m: u8, d: u8) {
    let date = ExcelDateTime::from_ymd(y, m, d).unwrap();
    let format = Format::new().set_num_format("dd/mm/yyyy");
    ws.write_datetime_with_format(row, col, &date, &format).unwrap();
}
