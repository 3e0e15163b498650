//! Cell value coercers.
//!
//! Convert one [`CellValue`] into text, a decimal amount or a calendar date. Source files come
//! from many different accounting systems, so the coercers are tolerant: a value that cannot be
//! interpreted becomes `Ok(None)` (and is logged). Only an explicit spreadsheet error value
//! (`#REF!`, `#DIV/0!`, ...) is reported as a [`CellError`], which makes the whole row unusable.

use std::str::FromStr;

use chrono::{Days, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::warn;

use super::cell::CellValue;

/// A cell that cannot be coerced at all because it holds a spreadsheet error value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cell holds spreadsheet error value {0}")]
pub struct CellError(pub String);

/// Outcome of a coercion: `Ok(None)` means the value is absent.
pub type CoerceResult<T> = Result<Option<T>, CellError>;

/// Ordered chrono patterns used to read date cells stored as text.
///
/// The primary patterns are tried first, then `fallbacks` in order. Pass a custom value through
/// [`super::IngestionOptions`] to support another locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormats {
    /// Pattern for issue dates, e.g. `30-10-2025`.
    pub issue: String,
    /// Pattern for reception timestamps, e.g. `30-10-2025 14:30:45`.
    pub reception: String,
    /// Secondary date-only patterns, tried in order after the primary ones.
    pub fallbacks: Vec<String>,
}

impl Default for DateFormats {
    fn default() -> Self {
        Self {
            issue: "%d-%m-%Y".to_string(),
            reception: "%d-%m-%Y %H:%M:%S".to_string(),
            fallbacks: vec![
                "%Y-%m-%d".to_string(),
                "%d/%m/%Y".to_string(),
                "%m/%d/%Y".to_string(),
                "%Y/%m/%d".to_string(),
            ],
        }
    }
}

impl DateFormats {
    /// Parse an issue date: the `issue` pattern, then each fallback.
    pub fn parse_issue(&self, raw: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(raw, &self.issue)
            .ok()
            .or_else(|| self.parse_fallback(raw))
    }

    /// Parse a reception date: the `reception` timestamp pattern (time discarded), then the
    /// issue-date chain.
    pub fn parse_reception(&self, raw: &str) -> Option<NaiveDate> {
        NaiveDateTime::parse_from_str(raw, &self.reception)
            .map(|dt| dt.date())
            .ok()
            .or_else(|| self.parse_issue(raw))
    }

    fn parse_fallback(&self, raw: &str) -> Option<NaiveDate> {
        self.fallbacks
            .iter()
            .find_map(|pattern| NaiveDate::parse_from_str(raw, pattern).ok())
    }
}

/// Read a cell as free text.
///
/// Text is trimmed, integral numbers lose their fractional part, booleans become
/// `"true"`/`"false"` and formula cells yield their source text rather than their result.
pub fn as_text(cell: &CellValue) -> CoerceResult<String> {
    let text = match cell {
        CellValue::Blank => None,
        CellValue::Text(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        CellValue::Number(n) => Some(number_to_text(*n)),
        CellValue::Bool(b) => Some(b.to_string()),
        CellValue::Date { value, .. } => Some(datetime_to_text(value)),
        CellValue::FormulaNumber { source, .. } | CellValue::FormulaText { source, .. } => {
            Some(source.clone())
        }
        CellValue::Error(e) => return Err(CellError(e.clone())),
    };
    Ok(text)
}

/// Read a cell as a decimal amount.
///
/// Text goes through [`normalize_decimal_text`] first. Numeric cells convert directly, including
/// ones carrying a date number format (their raw serial is the amount). Formula cells use the
/// result cached in the workbook and are absent when that result is not a number; files saved by
/// writers that never recalculate cache `0`, so a formula amount of zero may be uncalculated.
pub fn as_decimal(cell: &CellValue) -> CoerceResult<Decimal> {
    let value = match cell {
        CellValue::Number(n) => decimal_from_f64(*n),
        CellValue::Date {
            serial: Some(serial), ..
        } => decimal_from_f64(*serial),
        CellValue::FormulaNumber { value, .. } => decimal_from_f64(*value),
        CellValue::Text(s) => parse_decimal_text(s),
        CellValue::Error(e) => return Err(CellError(e.clone())),
        CellValue::Blank
        | CellValue::Bool(_)
        | CellValue::Date { serial: None, .. }
        | CellValue::FormulaText { .. } => None,
    };
    Ok(value)
}

/// Read a cell as an issue date (see [`DateFormats::parse_issue`]).
///
/// Numeric cells are read as serial dates.
pub fn as_issue_date(cell: &CellValue, formats: &DateFormats) -> CoerceResult<NaiveDate> {
    as_date(cell, "issue date", |raw| formats.parse_issue(raw))
}

/// Read a cell as a reception date (see [`DateFormats::parse_reception`]).
///
/// Only the date component is kept.
pub fn as_reception_date(cell: &CellValue, formats: &DateFormats) -> CoerceResult<NaiveDate> {
    as_date(cell, "reception date", |raw| formats.parse_reception(raw))
}

fn as_date<F>(cell: &CellValue, label: &str, parse: F) -> CoerceResult<NaiveDate>
where
    F: Fn(&str) -> Option<NaiveDate>,
{
    let value = match cell {
        CellValue::Date { value, .. } => Some(value.date()),
        CellValue::Number(serial) => {
            let date = date_from_excel_serial(*serial);
            if date.is_none() {
                warn!(serial, "{label}: numeric value is not a valid serial date");
            }
            date
        }
        CellValue::Text(s) => {
            let raw = s.trim();
            if raw.is_empty() {
                None
            } else {
                let date = parse(raw);
                if date.is_none() {
                    warn!(raw, "{label}: could not parse date");
                }
                date
            }
        }
        CellValue::Error(e) => return Err(CellError(e.clone())),
        CellValue::Blank
        | CellValue::Bool(_)
        | CellValue::FormulaNumber { .. }
        | CellValue::FormulaText { .. } => None,
    };
    Ok(value)
}

/// Normalize a locale-formatted number into the `1234.56` form.
///
/// - whitespace is removed;
/// - with both `.` and `,` present, `.` is a thousands separator and `,` the decimal separator;
/// - with only `,` present, `,` is the decimal separator;
/// - with only `.` present around digits, every `.` but the last is dropped.
pub fn normalize_decimal_text(raw: &str) -> String {
    let s: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let has_dot = s.contains('.');
    let has_comma = s.contains(',');

    if has_dot && has_comma {
        return s.replace('.', "").replace(',', ".");
    }
    if has_comma {
        return s.replace(',', ".");
    }
    if has_digit_dot_digit(&s) && s.matches('.').count() > 1 {
        if let Some(last) = s.rfind('.') {
            return format!("{}{}", s[..last].replace('.', ""), &s[last..]);
        }
    }
    s
}

fn has_digit_dot_digit(s: &str) -> bool {
    s.as_bytes()
        .windows(3)
        .any(|w| w[0].is_ascii_digit() && w[1] == b'.' && w[2].is_ascii_digit())
}

fn parse_decimal_text(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = normalize_decimal_text(trimmed);
    let parsed = Decimal::from_str(&normalized).ok().or_else(|| {
        normalized
            .contains(['e', 'E'])
            .then(|| Decimal::from_scientific(&normalized).ok())
            .flatten()
    });
    if parsed.is_none() {
        warn!(raw = trimmed, normalized = %normalized, "could not parse decimal amount");
    }
    parsed
}

/// Decimal with the shortest representation that round-trips the float (`0.1` stays `0.1`).
fn decimal_from_f64(n: f64) -> Option<Decimal> {
    if !n.is_finite() {
        return None;
    }
    let parsed = Decimal::from_str(&n.to_string()).ok();
    if parsed.is_none() {
        warn!(value = n, "numeric cell out of decimal range");
    }
    parsed
}

fn number_to_text(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}

fn datetime_to_text(dt: &NaiveDateTime) -> String {
    if dt.time() == chrono::NaiveTime::MIN {
        dt.date().format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Convert a 1900-system serial date into a calendar date (time of day dropped).
///
/// Serials below 61 are shifted by a day to account for the fictitious 1900-02-29.
pub fn date_from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let whole = serial.floor() as u64;
    let epoch = if whole < 61 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    epoch.checked_add_days(Days::new(whole))
}
