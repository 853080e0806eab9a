//! Table of contents (document outline) extraction

use std::collections::{HashMap, HashSet};
use std::path::Path;
use lopdf::{Dictionary, Document, Object, ObjectId};
use crate::error::Result;
use super::document::{open, resolve, resolve_dict};
use super::metadata::decode_text_string;

/// Maximum depth followed in a name tree
const MAX_NAME_TREE_DEPTH: usize = 32;

/// One entry of the table of contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// Nesting level, starting at 1 for top-level entries
    pub level: usize,
    pub title: String,
    /// 1-indexed target page, or -1 when the destination cannot be resolved
    pub page: i64,
}

/// Read the table of contents of a PDF file
pub fn table_of_contents(path: &Path) -> Result<Vec<TocEntry>> {
    let doc = open(path)?;
    Ok(outline_of(&doc))
}

/// Walk the outline tree of a loaded document, in document order
pub(crate) fn outline_of(doc: &Document) -> Vec<TocEntry> {
    let mut entries = Vec::new();

    let first = doc
        .catalog()
        .ok()
        .and_then(|catalog| catalog.get(b"Outlines").ok())
        .and_then(|outlines| resolve_dict(doc, outlines))
        .and_then(|outlines| outlines.get(b"First").ok())
        .and_then(|first| first.as_reference().ok());

    let Some(first) = first else {
        return entries;
    };

    let page_numbers: HashMap<ObjectId, u32> = doc
        .get_pages()
        .into_iter()
        .map(|(number, id)| (id, number))
        .collect();

    let mut walker = OutlineWalker {
        doc,
        page_numbers,
        visited: HashSet::new(),
        entries: &mut entries,
    };
    walker.walk(first, 1);

    entries
}

struct OutlineWalker<'a> {
    doc: &'a Document,
    page_numbers: HashMap<ObjectId, u32>,
    visited: HashSet<ObjectId>,
    entries: &'a mut Vec<TocEntry>,
}

impl<'a> OutlineWalker<'a> {
    /// Visit an item, its children, then its following siblings
    fn walk(&mut self, first: ObjectId, level: usize) {
        let mut current = Some(first);

        while let Some(id) = current {
            // Malformed outlines can loop back on themselves
            if !self.visited.insert(id) {
                break;
            }
            let Ok(item) = self.doc.get_dictionary(id) else {
                break;
            };

            let title = item
                .get(b"Title")
                .ok()
                .and_then(|t| resolve(self.doc, t))
                .and_then(|t| t.as_str().ok())
                .map(decode_text_string)
                .unwrap_or_default();
            let page = self.destination_page(item).map(i64::from).unwrap_or(-1);

            self.entries.push(TocEntry { level, title, page });

            if let Ok(child) = item.get(b"First").and_then(Object::as_reference) {
                self.walk(child, level + 1);
            }

            current = item.get(b"Next").and_then(Object::as_reference).ok();
        }
    }

    /// Resolve the page an outline item points at, via /Dest or a GoTo action
    fn destination_page(&self, item: &Dictionary) -> Option<u32> {
        if let Ok(dest) = item.get(b"Dest") {
            return self.page_of_destination(dest, 0);
        }

        let action = resolve_dict(self.doc, item.get(b"A").ok()?)?;
        let kind = action.get(b"S").ok()?.as_name().ok()?;
        if kind != b"GoTo" {
            return None;
        }
        self.page_of_destination(action.get(b"D").ok()?, 0)
    }

    /// Explicit destination array, named destination, or a dictionary with /D
    fn page_of_destination(&self, dest: &Object, depth: usize) -> Option<u32> {
        if depth > MAX_NAME_TREE_DEPTH {
            return None;
        }

        match resolve(self.doc, dest)? {
            Object::Array(array) => match array.first()? {
                Object::Reference(page_id) => self.page_numbers.get(page_id).copied(),
                // Remote destinations use a 0-based page index
                Object::Integer(index) if *index >= 0 => Some(*index as u32 + 1),
                _ => None,
            },
            Object::Dictionary(dict) => self.page_of_destination(dict.get(b"D").ok()?, depth + 1),
            Object::Name(name) | Object::String(name, _) => {
                let target = self.named_destination(name)?;
                self.page_of_destination(target, depth + 1)
            }
            _ => None,
        }
    }

    /// Look a name up in the catalog's /Dests dictionary or the /Names /Dests tree
    fn named_destination(&self, name: &[u8]) -> Option<&'a Object> {
        let catalog = self.doc.catalog().ok()?;

        if let Some(dests) = catalog.get(b"Dests").ok().and_then(|d| resolve_dict(self.doc, d)) {
            if let Ok(target) = dests.get(name) {
                return Some(target);
            }
        }

        let tree = catalog
            .get(b"Names")
            .ok()
            .and_then(|names| resolve_dict(self.doc, names))
            .and_then(|names| names.get(b"Dests").ok())
            .and_then(|dests| resolve_dict(self.doc, dests))?;

        self.search_name_tree(tree, name, 0)
    }

    fn search_name_tree(&self, node: &'a Dictionary, name: &[u8], depth: usize) -> Option<&'a Object> {
        if depth > MAX_NAME_TREE_DEPTH {
            return None;
        }

        if let Some(names) = node.get(b"Names").ok().and_then(|n| resolve(self.doc, n)) {
            if let Ok(names) = names.as_array() {
                for pair in names.chunks(2) {
                    if let [key, value] = pair {
                        let key = resolve(self.doc, key).and_then(|k| k.as_str().ok());
                        if key == Some(name) {
                            return Some(value);
                        }
                    }
                }
            }
        }

        let kids = node.get(b"Kids").ok().and_then(|k| resolve(self.doc, k))?;
        for kid in kids.as_array().ok()? {
            if let Some(kid) = resolve_dict(self.doc, kid) {
                if let Some(found) = self.search_name_tree(kid, name, depth + 1) {
                    return Some(found);
                }
            }
        }

        None
    }
}
