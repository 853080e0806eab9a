//! Page-range extraction, splitting and rotation
//!
//! All operations copy pages into a new document; the input file is never
//! modified. Page numbers are 1-indexed and inclusive.

use std::path::{Path, PathBuf};
use lopdf::Document;
use tracing::{info, instrument};
use crate::error::{Error, Result};
use crate::naming;
use super::document::open;
use super::merge::PageAssembler;

/// Rotation applied by [`rotate_range`] callers that do not pick one
pub const DEFAULT_ROTATION: i64 = 90;

/// Options for copying a page range into a new file
#[derive(Debug, Clone)]
pub struct PageRangeOptions {
    /// First page to copy (1-indexed)
    pub start: u32,
    /// Last page to copy (1-indexed, inclusive). A stop before start copies in reverse.
    pub stop: u32,
    /// Degrees added to each copied page's rotation
    pub rotation: i64,
    /// Output PDF file path
    pub output_path: PathBuf,
}

/// Page numbers from `start` to `stop` inclusive, descending if `stop < start`
pub fn page_sequence(start: u32, stop: u32) -> Vec<u32> {
    if start <= stop {
        (start..=stop).collect()
    } else {
        (stop..=start).rev().collect()
    }
}

/// Copy a page range of `doc` into a new file
fn write_pages(doc: Document, page_numbers: &[u32], rotation: i64, output: &Path) -> Result<()> {
    let mut assembler = PageAssembler::new();
    assembler.append(doc, page_numbers, rotation)?;

    let mut new_doc = assembler.finish();
    new_doc.save(output)?;

    info!(output = %output.display(), pages = page_numbers.len(), "Wrote PDF");
    Ok(())
}

/// Copy pages `start..=stop` of a PDF into `options.output_path`
#[instrument(skip_all, fields(path = %path.display(), start = options.start, stop = options.stop))]
pub fn copy_pages(path: &Path, options: &PageRangeOptions) -> Result<()> {
    let doc = open(path)?;
    let pages = page_sequence(options.start, options.stop);
    write_pages(doc, &pages, options.rotation, &options.output_path)
}

/// Extract pages `start..=stop` into `{stem}_from_{start}_to_{stop}.pdf`
pub fn extract_range(path: &Path, start: u32, stop: u32) -> Result<PathBuf> {
    let output_path = naming::page_range(path, start, stop);
    copy_pages(path, &PageRangeOptions {
        start,
        stop,
        rotation: 0,
        output_path: output_path.clone(),
    })?;
    Ok(output_path)
}

/// Extract the last page into `{stem}_last_page.pdf`
#[instrument(skip_all, fields(path = %path.display()))]
pub fn extract_last_page(path: &Path) -> Result<PathBuf> {
    let doc = open(path)?;
    let last = doc.get_pages().len() as u32;
    if last == 0 {
        return Err(Error::EmptyPdf(path.to_path_buf()));
    }

    let output_path = naming::last_page(path);
    write_pages(doc, &[last], 0, &output_path)?;
    Ok(output_path)
}

/// Write every page to its own file, `{stem}_1.pdf` … `{stem}_N.pdf`
#[instrument(skip_all, fields(path = %path.display()))]
pub fn split_into_single_pages(path: &Path) -> Result<Vec<PathBuf>> {
    let doc = open(path)?;
    let page_count = doc.get_pages().len() as u32;

    let mut outputs = Vec::with_capacity(page_count as usize);
    for page in 1..=page_count {
        let output_path = naming::single_page(path, page);
        write_pages(doc.clone(), &[page], 0, &output_path)?;
        outputs.push(output_path);
    }

    Ok(outputs)
}

/// Copy pages `start..=stop` rotated by `rotation` degrees into
/// `{stem}_{start}_{stop}_{rotation}.pdf`
///
/// The rotation is added to each page's existing rotation. Values that are
/// not multiples of 90 are written as given (modulo 360).
pub fn rotate_range(path: &Path, start: u32, stop: u32, rotation: i64) -> Result<PathBuf> {
    let output_path = naming::rotated(path, start, stop, rotation);
    copy_pages(path, &PageRangeOptions {
        start,
        stop,
        rotation,
        output_path: output_path.clone(),
    })?;
    Ok(output_path)
}
