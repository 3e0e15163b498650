//! Workbook access: open an `.xlsx`/`.xls` stream and read its first sheet as tagged cells.

use std::io::{Read, Seek};

use calamine::{Data, Range, Reader, Sheets, Xls, Xlsx};
use tracing::{debug, warn};

use crate::error::{IngestionError, IngestionResult};

use super::cell::CellValue;
use super::header::EXPECTED_COLUMNS;
use super::row::SheetRow;
use super::unified::WorkbookFormat;

/// The first sheet of a workbook, split into its header row and its data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct FirstSheet {
    pub name: String,
    pub header: Vec<CellValue>,
    pub rows: Vec<SheetRow>,
}

/// Open a workbook of the given format from a seekable stream.
///
/// The format comes from the file name; the content is not sniffed, so a mislabeled file fails
/// inside the format-specific reader.
pub fn open_workbook<RS>(reader: RS, format: WorkbookFormat) -> IngestionResult<Sheets<RS>>
where
    RS: Read + Seek,
{
    let sheets = match format {
        WorkbookFormat::Xlsx => Sheets::Xlsx(Xlsx::new(reader).map_err(calamine::Error::from)?),
        WorkbookFormat::Xls => Sheets::Xls(Xls::new(reader).map_err(calamine::Error::from)?),
    };
    Ok(sheets)
}

/// Read the first sheet of `workbook`; every other sheet is ignored.
///
/// Only the first [`EXPECTED_COLUMNS`]`.len()` columns are read. Rows are returned in sheet
/// order, blank ones included.
pub fn read_first_sheet<RS>(workbook: &mut Sheets<RS>) -> IngestionResult<FirstSheet>
where
    RS: Read + Seek,
{
    let name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(IngestionError::MissingHeader)?;

    let values = workbook.worksheet_range(&name)?;
    let formulas = match workbook.worksheet_formula(&name) {
        Ok(range) => Some(range),
        Err(err) => {
            warn!(sheet = %name, error = %err, "formula text unavailable, using stored results only");
            None
        }
    };

    let last_row = match values.end() {
        Some((row, _)) => row,
        None => return Err(IngestionError::MissingHeader),
    };
    debug!(sheet = %name, last_row, "reading first sheet");

    let grid = Grid {
        values: &values,
        formulas: formulas.as_ref(),
    };
    let header = grid.row(0);
    if header.iter().all(CellValue::is_blank) {
        return Err(IngestionError::MissingHeader);
    }

    let rows = (1..=last_row)
        .map(|r| SheetRow {
            number: r as usize + 1,
            cells: grid.row(r),
        })
        .collect();

    Ok(FirstSheet { name, header, rows })
}

struct Grid<'a> {
    values: &'a Range<Data>,
    formulas: Option<&'a Range<String>>,
}

impl Grid<'_> {
    /// Cells of absolute row `r`, addressed by absolute column so both ranges line up even when
    /// they start at different offsets.
    fn row(&self, r: u32) -> Vec<CellValue> {
        (0..EXPECTED_COLUMNS.len() as u32)
            .map(|c| {
                let data = self.values.get_value((r, c)).unwrap_or(&Data::Empty);
                let formula = self
                    .formulas
                    .and_then(|f| f.get_value((r, c)))
                    .map(String::as_str);
                CellValue::from_calamine(data, formula)
            })
            .collect()
    }
}
