//! Error types for the PDF toolbox library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PDF toolbox library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {}", .0.display())]
    EmptyPdf(PathBuf),

    /// Requested page does not exist
    #[error("Page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: usize },

    /// Document is encrypted and no password was supplied
    #[error("PDF is encrypted and requires a password: {}", .0.display())]
    PasswordRequired(PathBuf),

    /// Supplied password did not authenticate
    #[error("Wrong password for {}", .0.display())]
    WrongPassword(PathBuf),

    /// Encryption setup failed
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// PDFium binding or rendering failure
    #[error("Render error: {0}")]
    Render(String),

    /// Embedded image uses an encoding we cannot decode
    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    /// Merge called with nothing to merge
    #[error("No input files provided")]
    NoInputs,

    /// Invalid glob pattern
    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(String),
}
