//! PDF metadata extraction

use std::path::Path;
use chrono::{DateTime, FixedOffset};
use lopdf::{Dictionary, Document, Object};
use crate::date::parse_pdf_date;
use crate::error::Result;
use super::document::{open, resolve, resolve_dict};

/// Count pages by reading the Count field from the Pages dictionary
///
/// Falls back to walking the page tree when the catalog is malformed or the
/// Count field is missing.
fn count_pages_from_catalog(doc: &Document) -> usize {
    let count = doc
        .catalog()
        .ok()
        .and_then(|catalog| catalog.get(b"Pages").ok())
        .and_then(|pages| resolve_dict(doc, pages))
        .and_then(|pages| pages.get(b"Count").ok())
        .and_then(|count| count.as_i64().ok());

    match count {
        Some(n) if n >= 0 => n as usize,
        _ => doc.get_pages().len(),
    }
}

/// PDF metadata
///
/// Mirrors the document information dictionary plus the file's version and
/// encryption scheme. All values are read-only snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfMetadata {
    /// File format and version, e.g. `PDF 1.7`
    pub format: String,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    /// Application that created the original document
    pub creator: Option<String>,
    /// Application that produced the PDF
    pub producer: Option<String>,
    /// Raw creation date string (`D:YYYYMMDDHHmmSS...`)
    pub creation_date: Option<String>,
    /// Raw modification date string
    pub modification_date: Option<String>,
    pub trapped: Option<String>,
    /// Encryption scheme description, `None` for unencrypted files
    pub encryption: Option<String>,
}

impl PdfMetadata {
    /// The metadata as `(key, value)` pairs, in a fixed key order
    ///
    /// Missing values are reported as empty strings.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let value = |v: &Option<String>| v.clone().unwrap_or_default();
        vec![
            ("format", self.format.clone()),
            ("title", value(&self.title)),
            ("author", value(&self.author)),
            ("subject", value(&self.subject)),
            ("keywords", value(&self.keywords)),
            ("creator", value(&self.creator)),
            ("producer", value(&self.producer)),
            ("creationDate", value(&self.creation_date)),
            ("modDate", value(&self.modification_date)),
            ("trapped", value(&self.trapped)),
            ("encryption", value(&self.encryption)),
        ]
    }

    /// Look up a single value by its key name
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Parsed creation date
    pub fn created(&self) -> Option<DateTime<FixedOffset>> {
        self.creation_date.as_deref().and_then(parse_pdf_date)
    }

    /// Parsed modification date
    pub fn modified(&self) -> Option<DateTime<FixedOffset>> {
        self.modification_date.as_deref().and_then(parse_pdf_date)
    }
}

/// Decode a PDF text string
///
/// Handles UTF-16BE (with BOM), UTF-8 (with BOM) and falls back to treating
/// the bytes as PDFDocEncoding, approximated by Latin-1.
pub(crate) fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(utf8).into_owned();
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Read an Info dictionary entry as text
fn info_value(doc: &Document, info: &Dictionary, key: &[u8]) -> Option<String> {
    let value = resolve(doc, info.get(key).ok()?)?;
    let text = match value {
        Object::String(bytes, _) => decode_text_string(bytes),
        Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
        Object::Boolean(b) => b.to_string(),
        _ => return None,
    };
    Some(text)
}

/// Describe the encryption dictionary, e.g. `Standard V5 R6 256-bit AES`
fn describe_encryption(doc: &Document) -> Option<String> {
    let encrypt = resolve_dict(doc, doc.trailer.get(b"Encrypt").ok()?)?;

    let filter = encrypt
        .get(b"Filter")
        .ok()
        .and_then(|f| f.as_name().ok())
        .map(|f| String::from_utf8_lossy(f).into_owned())
        .unwrap_or_else(|| "Standard".to_string());
    let version = encrypt.get(b"V").ok().and_then(|v| v.as_i64().ok()).unwrap_or(0);
    let revision = encrypt.get(b"R").ok().and_then(|r| r.as_i64().ok()).unwrap_or(0);

    let cipher = match version {
        1 => "40-bit RC4".to_string(),
        2 | 3 => {
            let bits = encrypt.get(b"Length").ok().and_then(|l| l.as_i64().ok()).unwrap_or(40);
            format!("{}-bit RC4", bits)
        }
        4 => "128-bit AES".to_string(),
        5 => "256-bit AES".to_string(),
        _ => "unknown".to_string(),
    };

    Some(format!("{} V{} R{} {}", filter, version, revision, cipher))
}

/// Extract metadata from a loaded document
pub(crate) fn metadata_of(doc: &Document) -> PdfMetadata {
    let mut metadata = PdfMetadata {
        format: format!("PDF {}", doc.version),
        encryption: describe_encryption(doc),
        ..Default::default()
    };

    // Try to extract fields from the Info dictionary
    let info = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|info| resolve_dict(doc, info));

    if let Some(info) = info {
        metadata.title = info_value(doc, info, b"Title");
        metadata.author = info_value(doc, info, b"Author");
        metadata.subject = info_value(doc, info, b"Subject");
        metadata.keywords = info_value(doc, info, b"Keywords");
        metadata.creator = info_value(doc, info, b"Creator");
        metadata.producer = info_value(doc, info, b"Producer");
        metadata.creation_date = info_value(doc, info, b"CreationDate");
        metadata.modification_date = info_value(doc, info, b"ModDate");
        metadata.trapped = info_value(doc, info, b"Trapped");
    }

    metadata
}

/// Extract metadata from a PDF file
pub fn metadata(path: &Path) -> Result<PdfMetadata> {
    let doc = open(path)?;
    Ok(metadata_of(&doc))
}

/// Count the number of pages in a PDF file
///
/// This is a quick operation that reads the Count field from the Pages dictionary.
/// Files locked by a user password fail with `PasswordRequired`.
pub fn page_count(path: &Path) -> Result<usize> {
    let doc = open(path)?;
    Ok(count_pages_from_catalog(&doc))
}
