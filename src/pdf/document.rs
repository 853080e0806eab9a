//! Scoped document loading and object-graph helpers shared by the PDF operations

use std::path::Path;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, instrument};
use crate::error::{Error, Result};

/// Page attributes that a page may inherit from its ancestors in the page tree
pub(crate) const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// US Letter, used when neither the page nor its ancestors define a MediaBox
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Load a PDF that is expected to be readable without a password
pub fn open(path: &Path) -> Result<Document> {
    open_with_password(path, None)
}

/// Load a PDF, authenticating with `password` if the document is encrypted
///
/// The returned document has all strings and streams decrypted. Documents whose
/// user password is empty are opened without one.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn open_with_password(path: &Path, password: Option<&str>) -> Result<Document> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let mut doc = Document::load(path)?;

    // lopdf already tried the empty user password while loading
    if is_locked(&doc) {
        doc = match password {
            Some(password) => load_locked(path, password)?,
            None => return Err(Error::PasswordRequired(path.to_path_buf())),
        };
    }

    debug!(pages = doc.get_pages().len(), encrypted = doc.is_encrypted(), "PDF loaded");
    Ok(doc)
}

/// Encrypted, and the empty user password did not unlock it
///
/// lopdf keeps only the encryption dictionary of such a file.
fn is_locked(doc: &Document) -> bool {
    doc.is_encrypted() && doc.encryption_state.is_none()
}

/// Trailer key `/Encrypt` is renamed to while the locked file is parsed
const HIDDEN_ENCRYPT_KEY: &[u8] = b"EncrypX";

/// Parse every object of a locked file, then decrypt them with `password`
///
/// The trailer's `/Encrypt` entries are renamed in place so lopdf reads the
/// object graph as if it were plain, then restored before decrypting.
fn load_locked(path: &Path, password: &str) -> Result<Document> {
    let mut bytes = std::fs::read(path)?;
    let hidden = hide_encrypt_entries(&mut bytes);
    debug!(hidden, "Parsing locked PDF");

    let mut doc = Document::load_mem(&bytes)?;
    let encrypt = doc
        .trailer
        .remove(HIDDEN_ENCRYPT_KEY)
        .ok_or_else(|| Error::Encryption("encryption dictionary not found in trailer".to_string()))?;
    doc.trailer.set("Encrypt", encrypt);

    doc.decrypt(password)
        .map_err(|_| Error::WrongPassword(path.to_path_buf()))?;
    Ok(doc)
}

/// Rename every `/Encrypt` name token to `/EncrypX`, keeping byte offsets intact
///
/// Longer names such as `/EncryptMetadata` are left alone. Returns the number
/// of tokens renamed.
fn hide_encrypt_entries(bytes: &mut [u8]) -> usize {
    const TOKEN: &[u8] = b"/Encrypt";
    let mut hidden = 0;
    let mut i = 0;

    while i + TOKEN.len() <= bytes.len() {
        let ends_name = bytes.get(i + TOKEN.len()).map_or(true, |&b| is_name_delimiter(b));
        if &bytes[i..i + TOKEN.len()] == TOKEN && ends_name {
            bytes[i + TOKEN.len() - 1] = HIDDEN_ENCRYPT_KEY[HIDDEN_ENCRYPT_KEY.len() - 1];
            hidden += 1;
            i += TOKEN.len();
        } else {
            i += 1;
        }
    }

    hidden
}

fn is_name_delimiter(b: u8) -> bool {
    b == 0 || b.is_ascii_whitespace() || b"()<>[]{}/%".contains(&b)
}

/// Check whether a PDF file carries an encryption dictionary
pub fn is_encrypted(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    Ok(doc.is_encrypted())
}

/// Resolve an object that may be a reference
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Resolve an object to a dictionary, following a reference if needed
pub(crate) fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, object)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Read a number that may be stored as an integer or a real
pub(crate) fn as_number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(n) => Some(*n as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Look up a page attribute, walking up the Parent chain for inherited values
pub(crate) fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;

    // Bounded walk in case of a cyclic Parent chain
    for _ in 0..64 {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }

    None
}

/// Copy inherited attributes onto the page dictionary itself
///
/// Required before a page is moved under a different Pages node.
pub(crate) fn materialize_inherited_attributes(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let mut inherited = Vec::new();
    for key in INHERITABLE_ATTRIBUTES {
        let page = doc.get_dictionary(page_id)?;
        if page.has(key) {
            continue;
        }
        if let Some(value) = inherited_attribute(doc, page_id, key) {
            inherited.push((key.to_vec(), value.clone()));
        }
    }

    if !inherited.is_empty() {
        let page = doc.get_dictionary_mut(page_id)?;
        for (key, value) in inherited {
            page.set(key, value);
        }
    }

    Ok(())
}

/// The page's MediaBox as `[x0, y0, x1, y1]`
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let values: Option<Vec<f32>> = inherited_attribute(doc, page_id, b"MediaBox")
        .and_then(|object| resolve(doc, object))
        .and_then(|object| object.as_array().ok())
        .map(|array| {
            array
                .iter()
                .filter_map(|item| resolve(doc, item).and_then(as_number))
                .collect()
        });

    match values.as_deref() {
        Some([x0, y0, x1, y1]) => [x0.min(*x1), y0.min(*y1), x0.max(*x1), y0.max(*y1)],
        _ => DEFAULT_MEDIA_BOX,
    }
}

/// The page's effective /Rotate value
pub(crate) fn page_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    inherited_attribute(doc, page_id, b"Rotate")
        .and_then(|object| resolve(doc, object))
        .and_then(|object| object.as_i64().ok())
        .unwrap_or(0)
}
