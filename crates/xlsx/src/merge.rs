//! Merging two flashcard workbooks into one sheet.

use crate::reader::read_rows;
use crate::workbook::Workbook;
use crate::writer::write_xlsx;
use deck_core::{Error, Result};
use std::path::Path;

/// Sheet name of merged workbooks.
pub const MERGED_SHEET_NAME: &str = "Merged Data";

/// Append the rows of `second` (minus its header) to all rows of `first`
/// and write the result to `dest`.
///
/// Both inputs must exist; otherwise nothing is written.
pub fn merge_workbooks(first: &Path, second: &Path, dest: &Path) -> Result<Workbook> {
    for path in [first, second] {
        if !path.exists() {
            log::error!("File not found at {}", path.display());
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
    }

    let mut rows = read_rows(first)?;
    rows.extend(read_rows(second)?.into_iter().skip(1));

    let merged = Workbook::from_rows(MERGED_SHEET_NAME, rows);
    write_xlsx(&merged, dest)?;

    log::info!(
        "Successfully merged {} and {} into {}",
        file_name(first),
        file_name(second),
        file_name(dest)
    );

    Ok(merged)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
