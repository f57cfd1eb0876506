// src/utils/error.rs
use thiserror::Error;

// Errors from the bulletin archive (download + listing fallback)
#[derive(Error, Debug)]
pub enum BulletinError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode), // e.g., 404 Not Found for a holiday date

    #[error("Bulletin not found for {0}")]
    NotFound(String),

    #[error("Invalid bulletin date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
}

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("PDF parse error: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    // The only document-level failure; per-line and per-page anomalies are absorbed.
    #[error("No closing-price tables found in bulletin")]
    NoTablesFound,

    #[error("Invalid extraction config: {0}")]
    InvalidConfig(String),

    #[error("Token input could not be read: {0}")]
    TokenInput(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Bulletin retrieval failed: {0}")]
    Bulletin(#[from] BulletinError),

    #[error("PDF reading failed: {0}")]
    Pdf(#[from] PdfError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
