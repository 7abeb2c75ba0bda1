//! Error types for flashcard extraction and assembly.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while extracting, restructuring or writing flashcards.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read or write a file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The input type is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// A required input file does not exist.
    #[error("File not found at {}", .0.display())]
    FileNotFound(PathBuf),

    /// ZIP archive error (PPTX extraction, XLSX packaging).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error.
    #[error("XML error: {0}")]
    XmlError(String),

    /// JSON artifact could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Spreadsheet could not be built or read.
    #[error("Workbook error: {0}")]
    Workbook(String),

    /// The restructuring service client could not be set up.
    #[error("Restructuring service error: {0}")]
    Service(String),
}
