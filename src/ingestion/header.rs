//! Header contract validation.
//!
//! The first row of the sheet must carry exactly [`EXPECTED_COLUMNS`], in order. Names are
//! compared case-insensitively after trimming. The check is all-or-nothing and runs before any
//! data row is read.

use std::fmt;

use super::cell::CellValue;

/// The fixed, ordered column contract of a fiscal-document spreadsheet.
pub const EXPECTED_COLUMNS: [&str; 32] = [
    "Tipo de Documento",
    "CUFE/CUDE",
    "Folio",
    "Prefijo",
    "Divisa",
    "Forma de Pago",
    "Medio de Pago",
    "Fecha Emisión",
    "Fecha Recepción",
    "NIT Emisor",
    "Nombre Emisor",
    "NIT Receptor",
    "Nombre Receptor",
    "IVA",
    "ICA",
    "IC",
    "INC",
    "Timbre",
    "INC Bolsas",
    "IN Carbono",
    "IN Combustibles",
    "IC Datos",
    "ICL",
    "INPP",
    "IBUA",
    "ICUI",
    "Rete IVA",
    "Rete Renta",
    "Rete ICA",
    "Total",
    "Estado",
    "Grupo",
];

/// A contract column that is blank or absent in the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingColumn {
    /// 1-based column position.
    pub position: usize,
    pub expected: &'static str,
}

/// A contract column whose header cell holds a different name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchedColumn {
    /// 1-based column position.
    pub position: usize,
    pub expected: &'static str,
    pub found: String,
}

/// Every deviation of a header row from [`EXPECTED_COLUMNS`].
///
/// `Display` renders the full human-readable diagnostic, including the expected contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderReport {
    pub missing: Vec<MissingColumn>,
    pub mismatched: Vec<MismatchedColumn>,
}

impl HeaderReport {
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty() && self.mismatched.is_empty()
    }
}

impl fmt::Display for HeaderReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "the Excel file does not have the expected structure. Errors found:")?;
        writeln!(f)?;

        if !self.mismatched.is_empty() {
            writeln!(f, "Columns with incorrect names:")?;
            for c in &self.mismatched {
                writeln!(
                    f,
                    "  - Column {}: expected '{}' but found '{}'",
                    c.position, c.expected, c.found
                )?;
            }
            writeln!(f)?;
        }

        if !self.missing.is_empty() {
            writeln!(f, "Missing or empty columns:")?;
            for c in &self.missing {
                writeln!(f, "  - Column {}: '{}'", c.position, c.expected)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Expected columns in order:")?;
        for (i, name) in EXPECTED_COLUMNS.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, name)?;
        }
        Ok(())
    }
}

/// Compare a header row against [`EXPECTED_COLUMNS`].
///
/// Cells beyond the contract are ignored. Returns the full report on any deviation.
pub fn validate_header(header: &[CellValue]) -> Result<(), HeaderReport> {
    let mut report = HeaderReport::default();

    for (idx, expected) in EXPECTED_COLUMNS.iter().copied().enumerate() {
        let actual = header.get(idx).map(header_text).unwrap_or_default();
        let position = idx + 1;

        if actual.is_empty() {
            report.missing.push(MissingColumn { position, expected });
        } else if actual.to_lowercase() != expected.to_lowercase() {
            report.mismatched.push(MismatchedColumn {
                position,
                expected,
                found: actual,
            });
        }
    }

    if report.is_ok() { Ok(()) } else { Err(report) }
}

fn header_text(cell: &CellValue) -> String {
    match super::coerce::as_text(cell) {
        Ok(text) => text.unwrap_or_default(),
        Err(err) => err.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract_header() -> Vec<CellValue> {
        EXPECTED_COLUMNS
            .iter()
            .map(|name| CellValue::Text(name.to_string()))
            .collect()
    }

    #[test]
    fn exact_contract_passes() {
        assert!(validate_header(&contract_header()).is_ok());
    }

    #[test]
    fn comparison_ignores_case_and_padding() {
        let mut header = contract_header();
        header[7] = CellValue::Text("  FECHA EMISIÓN ".to_string());
        header[0] = CellValue::Text("tipo de documento".to_string());
        assert!(validate_header(&header).is_ok());
    }

    #[test]
    fn extra_trailing_columns_are_ignored() {
        let mut header = contract_header();
        header.push(CellValue::Text("Notas".to_string()));
        assert!(validate_header(&header).is_ok());
    }

    #[test]
    fn missing_and_mismatched_are_both_reported() {
        let mut header = contract_header();
        header[4] = CellValue::Blank;
        header[11] = CellValue::Text("Receptor NIT".to_string());

        let report = validate_header(&header).unwrap_err();
        assert_eq!(
            report.missing,
            vec![MissingColumn {
                position: 5,
                expected: "Divisa"
            }]
        );
        assert_eq!(
            report.mismatched,
            vec![MismatchedColumn {
                position: 12,
                expected: "NIT Receptor",
                found: "Receptor NIT".to_string()
            }]
        );

        let msg = report.to_string();
        assert!(msg.contains("Column 5: 'Divisa'"));
        assert!(msg.contains("Column 12: expected 'NIT Receptor' but found 'Receptor NIT'"));
        assert!(msg.contains("32. Grupo"));
    }

    #[test]
    fn short_header_reports_every_absent_column() {
        let header = contract_header()[..30].to_vec();
        let report = validate_header(&header).unwrap_err();
        let positions: Vec<usize> = report.missing.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![31, 32]);
        assert!(report.mismatched.is_empty());
    }
}
