//! PDF Toolbox Library
//!
//! File-level batch operations on PDF documents and images.
//! This library provides functionality to:
//! - Inspect PDFs (encryption, metadata, page count, outline, text)
//! - Encrypt and decrypt with a password
//! - Extract, split and rotate page ranges
//! - Merge lists of PDFs or every PDF under a folder
//! - Render pages to JPEG and wrap images in PDFs
//! - Stamp an image watermark and extract embedded images
//!
//! Every operation takes file paths and writes its result to a new file,
//! usually named after the input with a suffix (see [`naming`]).
//!
//! # Example
//!
//! ```no_run
//! use pdf_toolbox::pdf::{merge_pdfs, MergeOptions};
//! use std::path::PathBuf;
//!
//! let options = MergeOptions {
//!     input_paths: vec![
//!         PathBuf::from("1. intro.pdf"),
//!         PathBuf::from("2. advanced.pdf"),
//!     ],
//!     output_path: PathBuf::from("merged.pdf"),
//! };
//!
//! merge_pdfs(&options).expect("Failed to merge PDFs");
//! ```

pub mod about;
pub mod date;
pub mod error;
pub mod layout;
pub mod naming;
pub mod pdf;
pub mod raster;

// Re-export commonly used items
pub use error::{Error, Result};
pub use raster::{image_to_pdf, pdf_to_images, render_page, Renderer};
