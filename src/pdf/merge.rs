//! PDF merging and page assembly using lopdf
//!
//! [`PageAssembler`] copies selected pages out of loaded documents into one new
//! document. Merging appends every page of every input; the page-range
//! operations in [`super::pages`] append a subset of a single input.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use glob::glob;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info, instrument, warn};
use crate::error::{Error, Result};
use super::document::{materialize_inherited_attributes, open, page_rotation};

/// Options for merging PDFs
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Input PDF file paths in the order they should be merged
    pub input_paths: Vec<PathBuf>,
    /// Output PDF file path
    pub output_path: PathBuf,
}

/// Collects pages from several documents into a single new document
///
/// Based on the lopdf merge example:
/// https://github.com/J-F-Liu/lopdf/blob/main/examples/merge.rs
pub(crate) struct PageAssembler {
    /// Next free object number
    max_id: u32,
    /// Page object ids in output order
    page_ids: Vec<ObjectId>,
    /// All objects collected so far, already renumbered
    objects: BTreeMap<ObjectId, Object>,
}

impl PageAssembler {
    pub(crate) fn new() -> Self {
        Self {
            max_id: 1,
            page_ids: Vec::new(),
            objects: BTreeMap::new(),
        }
    }

    /// Number of pages appended so far
    pub(crate) fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Append the given 1-indexed pages of `doc`, in the order listed
    ///
    /// `rotation` is added to each copied page's existing /Rotate.
    pub(crate) fn append(&mut self, mut doc: Document, page_numbers: &[u32], rotation: i64) -> Result<()> {
        // Renumber objects in this document to avoid conflicts
        doc.renumber_objects_with(self.max_id);

        // Update max_id for next document
        self.max_id = doc.max_id + 1;

        let pages = doc.get_pages();
        let mut selected = Vec::with_capacity(page_numbers.len());
        for &number in page_numbers {
            let page_id = *pages.get(&number).ok_or(Error::PageOutOfRange {
                page: number,
                page_count: pages.len(),
            })?;
            selected.push(page_id);
        }

        for &page_id in &selected {
            // The page is about to lose its original parent
            materialize_inherited_attributes(&mut doc, page_id)?;

            if rotation != 0 {
                let new_rotation = (page_rotation(&doc, page_id) + rotation).rem_euclid(360);
                doc.get_dictionary_mut(page_id)?
                    .set("Rotate", Object::Integer(new_rotation));
            }
        }

        self.page_ids.extend(selected);

        // Collect all objects from this document; unused ones are pruned on finish
        self.objects.extend(doc.objects);

        Ok(())
    }

    /// Append every page of `doc`
    pub(crate) fn append_all(&mut self, doc: Document) -> Result<()> {
        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        self.append(doc, &page_numbers, 0)
    }

    /// Build the merged document with a fresh catalog and page tree
    pub(crate) fn finish(self) -> Document {
        let mut merged_doc = Document::with_version("1.5");

        // Add all collected objects FIRST
        merged_doc.objects.extend(self.objects);

        // new_object_id() must not collide with the objects just added
        merged_doc.max_id = self.max_id - 1;

        let pages_id = merged_doc.new_object_id();

        let kids: Vec<Object> = self.page_ids
            .iter()
            .map(|&id| Object::Reference(id))
            .collect();

        let mut pages_object = Dictionary::new();
        pages_object.set("Type", Object::Name(b"Pages".to_vec()));
        pages_object.set("Count", Object::Integer(self.page_ids.len() as i64));
        pages_object.set("Kids", Object::Array(kids));

        let catalog_id = merged_doc.new_object_id();
        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));

        merged_doc.objects.insert(catalog_id, Object::Dictionary(catalog));
        merged_doc.objects.insert(pages_id, Object::Dictionary(pages_object));
        merged_doc.trailer.set("Root", Object::Reference(catalog_id));

        // Update parent references for all pages
        for &page_id in &self.page_ids {
            if let Ok(Object::Dictionary(dict)) = merged_doc.get_object_mut(page_id) {
                dict.set("Parent", Object::Reference(pages_id));
            }
        }

        // Old catalogs, page trees and unselected pages are now unreachable
        let pruned = merged_doc.prune_objects();
        debug!(pages = self.page_ids.len(), pruned = pruned.len(), "Assembled document");

        merged_doc.compress();
        merged_doc
    }
}

/// Merge multiple PDF files into a single PDF
///
/// # Example
///
/// ```no_run
/// use pdf_toolbox::pdf::{MergeOptions, merge_pdfs};
/// use std::path::PathBuf;
///
/// let options = MergeOptions {
///     input_paths: vec![
///         PathBuf::from("1. first.pdf"),
///         PathBuf::from("2. second.pdf"),
///     ],
///     output_path: PathBuf::from("merged.pdf"),
/// };
///
/// merge_pdfs(&options).expect("Failed to merge");
/// ```
#[instrument(skip_all, fields(inputs = options.input_paths.len(), output = %options.output_path.display()))]
pub fn merge_pdfs(options: &MergeOptions) -> Result<()> {
    if options.input_paths.is_empty() {
        return Err(Error::NoInputs);
    }

    // Validate all input files exist before loading anything
    for path in &options.input_paths {
        if !path.exists() {
            return Err(Error::FileNotFound(path.clone()));
        }
    }

    let mut assembler = PageAssembler::new();
    for path in &options.input_paths {
        let doc = open(path)?;

        // Validate document has pages
        if doc.get_pages().is_empty() {
            return Err(Error::EmptyPdf(path.clone()));
        }

        assembler.append_all(doc)?;
    }

    let page_count = assembler.page_count();
    let mut merged_doc = assembler.finish();
    merged_doc.save(&options.output_path)?;

    info!(pages = page_count, "Wrote merged PDF");
    Ok(())
}

/// Merge a list of PDFs, in list order, into `output`
pub fn merge_list(paths: &[PathBuf], output: &Path) -> Result<()> {
    merge_pdfs(&MergeOptions {
        input_paths: paths.to_vec(),
        output_path: output.to_path_buf(),
    })
}

/// Merge every PDF found under `root` into `output`
pub fn merge_folder(root: &Path, output: &Path) -> Result<()> {
    let paths = collect_pdf_paths(root)?;
    merge_list(&paths, output)
}

/// Recursively collect every file under `root` whose name ends in `.pdf`
///
/// The match is case-sensitive. Order is the directory walk order.
pub fn collect_pdf_paths(root: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/**/*.pdf",
        glob::Pattern::escape(&root.to_string_lossy())
    );

    let entries = glob(&pattern).map_err(|e| Error::InvalidGlob(e.to_string()))?;

    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            Err(e) => warn!("Skipping unreadable path: {}", e),
        }
    }

    debug!(root = %root.display(), found = paths.len(), "Collected PDF paths");
    Ok(paths)
}
