//! Reading two-column workbooks back with calamine.

use calamine::{open_workbook, Data, Reader, Xlsx, XlsxError};
use deck_core::{Error, Result};
use std::path::Path;

/// Read the first sheet of an .xlsx file as rows of its first two columns.
///
/// Rows run from the first used row to the last; gaps come back as blank rows.
pub fn read_rows(path: &Path) -> Result<Vec<[String; 2]>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e: XlsxError| Error::Workbook(format!("Failed to open {}: {}", path.display(), e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Error::Workbook(format!("{} has no sheets", path.display())))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| Error::Workbook(format!("Failed to read sheet '{}': {}", sheet_name, e)))?;

    let (Some(start), Some(end)) = (range.start(), range.end()) else {
        return Ok(Vec::new());
    };

    let rows = (start.0..=end.0)
        .map(|row| {
            [0u32, 1].map(|col| {
                range
                    .get_value((row, col))
                    .map(cell_to_string)
                    .unwrap_or_default()
            })
        })
        .collect();

    Ok(rows)
}

/// Convert a calamine cell to a string
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            // Format floats nicely (remove unnecessary decimals)
            if f.fract() == 0.0 {
                format!("{:.0}", f)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERROR: {:?}", e),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}
