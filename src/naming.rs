//! Output file naming
//!
//! Every convenience operation writes next to its input, deriving the output
//! name from the input's stem plus a suffix. Existing files with the derived
//! name are overwritten.

use std::path::{Path, PathBuf};

/// Default output name used by the merge operations
pub const DEFAULT_MERGED_FILE: &str = "merged_file.pdf";

/// Replace the file name of `input` with `{stem}{suffix}.{extension}`
pub fn derive(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}{}.{}", stem, suffix, extension))
}

pub fn encrypted(input: &Path) -> PathBuf {
    derive(input, "_encrypted", "pdf")
}

pub fn uncrypted(input: &Path) -> PathBuf {
    derive(input, "_uncrypted", "pdf")
}

pub fn page_range(input: &Path, start: u32, stop: u32) -> PathBuf {
    derive(input, &format!("_from_{}_to_{}", start, stop), "pdf")
}

pub fn last_page(input: &Path) -> PathBuf {
    derive(input, "_last_page", "pdf")
}

/// `{stem}_{page}.pdf`, one per page when splitting
pub fn single_page(input: &Path, page: u32) -> PathBuf {
    derive(input, &format!("_{}", page), "pdf")
}

pub fn rotated(input: &Path, start: u32, stop: u32, rotation: i64) -> PathBuf {
    derive(input, &format!("_{}_{}_{}", start, stop, rotation), "pdf")
}

/// `{stem}_{page}.jpg` for rendered pages
pub fn rendered_page(input: &Path, page: u32) -> PathBuf {
    derive(input, &format!("_{}", page), "jpg")
}

/// Same stem, `.pdf` extension
pub fn image_document(input: &Path) -> PathBuf {
    derive(input, "", "pdf")
}

pub fn watermarked(input: &Path) -> PathBuf {
    derive(input, "_watermarked", "pdf")
}

/// `{xref}.png` inside `dir`
///
/// Images are named by object number only, so two documents sharing object
/// numbers will overwrite each other's output in the same directory.
pub fn extracted_image(dir: &Path, object_number: u32) -> PathBuf {
    dir.join(format!("{}.png", object_number))
}
