//! Boundary contracts with storage collaborators.
//!
//! The engine never talks to a network directly. It asks an [`UploadSigner`] for credentials,
//! hands bytes to an [`ObjectStore`], and reads remote art or saved sources through an
//! [`ImageFetcher`]. Every call is a single attempt; caching and retry belong to the caller.

/// Filesystem-backed store.
pub mod dir;
/// In-process store.
pub mod memory;

use crate::foundation::error::{KitcardError, KitcardResult};
use crate::foundation::math::Fnv1a64;

/// Bytes returned by a remote read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedImage {
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
    /// MIME type reported by the store.
    pub content_type: String,
}

/// Credentials for writing into one logical folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadSignature {
    /// Normalized destination folder.
    pub folder: String,
    /// Opaque signature token.
    pub token: String,
}

/// Reads images by storage reference.
pub trait ImageFetcher {
    /// Fetch the bytes behind `storage_ref`.
    fn fetch(&self, storage_ref: &str) -> KitcardResult<FetchedImage>;
}

/// Issues upload credentials for a folder.
pub trait UploadSigner {
    /// Sign an upload destination.
    fn sign(&self, folder: &str) -> KitcardResult<UploadSignature>;
}

/// Persists bytes and returns the storage reference they can be fetched back with.
pub trait ObjectStore {
    /// Store `bytes` under the signed folder.
    fn put(
        &self,
        signature: &UploadSignature,
        bytes: &[u8],
        content_type: &str,
    ) -> KitcardResult<String>;
}

/// Deterministic signer keyed by a shared secret, for local stores and tests.
#[derive(Clone, Copy, Debug)]
pub struct LocalSigner {
    secret: u64,
}

impl LocalSigner {
    /// Create a signer with the given secret.
    pub fn new(secret: u64) -> Self {
        Self { secret }
    }

    fn token_for(&self, folder: &str) -> String {
        let mut h = Fnv1a64::new(Fnv1a64::OFFSET_BASIS ^ self.secret);
        h.write_str(folder);
        format!("{:016x}", h.finish())
    }

    /// Return `true` when `signature` was issued by this signer.
    pub fn verify(&self, signature: &UploadSignature) -> bool {
        signature.token == self.token_for(&signature.folder)
    }
}

impl UploadSigner for LocalSigner {
    fn sign(&self, folder: &str) -> KitcardResult<UploadSignature> {
        let folder = normalize_rel_path(folder)?;
        let token = self.token_for(&folder);
        Ok(UploadSignature { folder, token })
    }
}

/// Normalize and validate relative storage paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> KitcardResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(KitcardError::fetch("storage paths must be relative"));
    }
    if s.is_empty() {
        return Err(KitcardError::fetch("storage path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(KitcardError::fetch("storage paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(KitcardError::fetch("storage path must contain a name"));
    }

    Ok(out.join("/"))
}

/// Content-addressed object name: identical bytes always land on the same reference.
pub(crate) fn content_addressed_ref(folder: &str, bytes: &[u8], content_type: &str) -> String {
    let mut h = Fnv1a64::new_default();
    h.write_bytes(bytes);
    format!(
        "{folder}/{:016x}.{}",
        h.finish(),
        extension_for_content_type(content_type)
    )
}

pub(crate) fn extension_for_content_type(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}

pub(crate) fn content_type_for_ref(storage_ref: &str) -> &'static str {
    let ext = storage_ref
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[path = "../../tests/unit/remote/mod.rs"]
mod tests;
