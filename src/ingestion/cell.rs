//! Tagged spreadsheet cell values.
//!
//! Each cell is classified once, when the sheet grid is read, so the coercers in
//! [`super::coerce`] only ever pattern-match on [`CellValue`].

use calamine::Data;
use chrono::{NaiveDate, NaiveDateTime};

/// One spreadsheet cell, decided once from the workbook's value and formula grids.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty or absent cell.
    Blank,
    /// Text cell (untrimmed, as stored).
    Text(String),
    /// Plain numeric cell.
    Number(f64),
    /// Boolean cell.
    Bool(bool),
    /// Numeric cell carrying a date/time number format, or an ISO 8601 date cell.
    ///
    /// `serial` is the raw 1900-system number behind a formatted numeric cell; ISO cells have none.
    Date { value: NaiveDateTime, serial: Option<f64> },
    /// Formula whose stored result is numeric.
    FormulaNumber { source: String, value: f64 },
    /// Formula whose stored result is anything but a number (text, bool, error, nothing).
    FormulaText { source: String, value: String },
    /// Error value such as `#DIV/0!` or `#REF!`.
    Error(String),
}

impl CellValue {
    /// Classify a calamine cell, taking the formula source text when the cell has one.
    ///
    /// For formula cells `data` is the result cached in the workbook at last save.
    pub fn from_calamine(data: &Data, formula: Option<&str>) -> Self {
        match formula.map(str::trim).filter(|f| !f.is_empty()) {
            Some(source) => classify_formula(source, data),
            None => classify_plain(data),
        }
    }

    /// `true` for [`CellValue::Blank`] and for text cells containing only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Blank => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

fn classify_plain(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Blank,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => CellValue::Date {
                value,
                serial: Some(dt.as_f64()),
            },
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(|value| CellValue::Date { value, serial: None })
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(format!("{e}")),
    }
}

fn classify_formula(source: &str, cached: &Data) -> CellValue {
    let source = source.to_string();
    match cached {
        Data::Int(i) => CellValue::FormulaNumber {
            source,
            value: *i as f64,
        },
        Data::Float(f) => CellValue::FormulaNumber { source, value: *f },
        Data::DateTime(dt) => CellValue::FormulaNumber {
            source,
            value: dt.as_f64(),
        },
        Data::Empty => CellValue::FormulaText {
            source,
            value: String::new(),
        },
        Data::Error(e) => CellValue::FormulaText {
            source,
            value: format!("{e}"),
        },
        other => CellValue::FormulaText {
            source,
            value: other.to_string(),
        },
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
