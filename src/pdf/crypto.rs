//! Password-based encryption and decryption
//!
//! Encryption always uses AES-256 (standard security handler V5, R6) with a
//! fixed permission set. Both operations write a new file and never modify
//! their input.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use lopdf::encryption::crypt_filters::{Aes256CryptFilter, CryptFilter};
use lopdf::{Document, EncryptionState, EncryptionVersion, Object, Permissions};
use ring::rand::{SecureRandom, SystemRandom};
use tracing::{info, instrument};
use crate::error::{Error, Result};
use crate::naming;
use super::document::{is_encrypted, open, open_with_password};

/// Name of the crypt filter used for both strings and streams
const CRYPT_FILTER_NAME: &[u8] = b"StdCF";

/// Permissions granted to users of encrypted output
///
/// Accessibility extraction is always on; printing, copying and annotating
/// are allowed. Everything else (modifying, form filling, assembling) is denied.
pub fn encryption_permissions() -> Permissions {
    Permissions::COPYABLE_FOR_ACCESSIBILITY
        | Permissions::PRINTABLE
        | Permissions::COPYABLE
        | Permissions::ANNOTABLE
}

/// Encrypt a PDF, writing `{stem}_encrypted.pdf`
///
/// Returns `Ok(None)` without writing anything if the input is already encrypted.
pub fn encrypt(path: &Path, password: &str) -> Result<Option<PathBuf>> {
    if is_encrypted(path)? {
        info!(path = %path.display(), "Already encrypted, nothing to do");
        return Ok(None);
    }

    let output = naming::encrypted(path);
    encrypt_to(path, password, &output)?;
    Ok(Some(output))
}

/// Encrypt a PDF into an explicit output path
///
/// The same password is used as user and owner password.
#[instrument(skip_all, fields(path = %path.display(), output = %output.display()))]
pub fn encrypt_to(path: &Path, password: &str, output: &Path) -> Result<()> {
    let mut doc = open(path)?;

    // Fresh random file encryption key for every output
    let mut file_encryption_key = [0u8; 32];
    SystemRandom::new()
        .fill(&mut file_encryption_key)
        .map_err(|_| Error::Encryption("failed to generate file encryption key".to_string()))?;

    let crypt_filter: Arc<dyn CryptFilter> = Arc::new(Aes256CryptFilter);
    let version = EncryptionVersion::V5 {
        encrypt_metadata: true,
        crypt_filters: BTreeMap::from([(CRYPT_FILTER_NAME.to_vec(), crypt_filter)]),
        file_encryption_key: &file_encryption_key,
        stream_filter: CRYPT_FILTER_NAME.to_vec(),
        string_filter: CRYPT_FILTER_NAME.to_vec(),
        owner_password: password,
        user_password: password,
        permissions: encryption_permissions(),
    };

    let state = EncryptionState::try_from(version)
        .map_err(|e| Error::Encryption(e.to_string()))?;
    doc.encrypt(&state)
        .map_err(|e| Error::Encryption(e.to_string()))?;

    doc.save(output)?;
    info!("Wrote encrypted PDF");

    Ok(())
}

/// Decrypt a PDF, writing `{stem}_uncrypted.pdf`
///
/// Returns `Ok(None)` without writing anything if the input is not encrypted.
/// A wrong password is reported as [`Error::WrongPassword`] and no file is written.
pub fn decrypt(path: &Path, password: &str) -> Result<Option<PathBuf>> {
    if !is_encrypted(path)? {
        info!(path = %path.display(), "Not encrypted, nothing to do");
        return Ok(None);
    }

    let output = naming::uncrypted(path);
    decrypt_to(path, password, &output)?;
    Ok(Some(output))
}

/// Decrypt a PDF into an explicit output path
#[instrument(skip_all, fields(path = %path.display(), output = %output.display()))]
pub fn decrypt_to(path: &Path, password: &str, output: &Path) -> Result<()> {
    let mut doc = open_with_password(path, Some(password))?;
    strip_encryption(&mut doc);

    doc.save(output)?;
    info!("Wrote decrypted PDF");

    Ok(())
}

/// Drop the encryption dictionary so the document is saved in the clear
fn strip_encryption(doc: &mut Document) {
    if let Ok(encrypt_id) = doc.trailer.get(b"Encrypt").and_then(Object::as_reference) {
        doc.objects.remove(&encrypt_id);
    }
    doc.trailer.remove(b"Encrypt");
    doc.encryption_state = None;
    // An encryption dictionary no longer named by the trailer is unreferenced
    doc.prune_objects();
}
