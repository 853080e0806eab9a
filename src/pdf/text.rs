//! Plain-text extraction

use std::path::Path;
use lopdf::Document;
use tracing::debug;
use crate::error::Result;
use super::document::open;

/// Extract all text from a PDF file
///
/// Text is extracted page by page, tabs are replaced with spaces, and the
/// pages are joined with a single space. Page boundaries are therefore not
/// recoverable from the result.
pub fn extract_text(path: &Path) -> Result<String> {
    let doc = open(path)?;
    text_of(&doc)
}

pub(crate) fn text_of(doc: &Document) -> Result<String> {
    let mut pages = Vec::new();

    for page_number in doc.get_pages().keys() {
        let text = doc.extract_text(&[*page_number])?;
        pages.push(text.replace('\t', " "));
    }

    debug!(pages = pages.len(), "Text extracted");
    Ok(pages.join(" "))
}
