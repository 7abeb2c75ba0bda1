//! Flashcard spreadsheet assembly.
//!
//! Builds two-column term/definition workbooks, writes them as .xlsx
//! packages, reads them back and merges two of them into one sheet.

pub mod merge;
pub mod reader;
pub mod workbook;
pub mod writer;

pub use merge::merge_workbooks;
pub use reader::read_rows;
pub use workbook::{Row, RowKind, Workbook};
pub use writer::write_xlsx;
