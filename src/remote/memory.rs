use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::foundation::error::{KitcardError, KitcardResult};
use crate::remote::{
    FetchedImage, ImageFetcher, ObjectStore, UploadSignature, content_addressed_ref,
    normalize_rel_path,
};

/// In-process object store that also serves fetches.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, FetchedImage>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object under an explicit reference.
    pub fn insert(
        &self,
        storage_ref: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> KitcardResult<()> {
        let key = normalize_rel_path(storage_ref)?;
        self.lock()?.insert(
            key,
            FetchedImage {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    /// Drop an object, so later fetches fail.
    pub fn remove(&self, storage_ref: &str) -> KitcardResult<bool> {
        let key = normalize_rel_path(storage_ref)?;
        Ok(self.lock()?.remove(&key).is_some())
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Return `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> KitcardResult<std::sync::MutexGuard<'_, BTreeMap<String, FetchedImage>>> {
        self.objects
            .lock()
            .map_err(|_| KitcardError::fetch("memory store lock poisoned"))
    }
}

impl ImageFetcher for MemoryStore {
    fn fetch(&self, storage_ref: &str) -> KitcardResult<FetchedImage> {
        let key = normalize_rel_path(storage_ref)?;
        self.lock()?
            .get(&key)
            .cloned()
            .ok_or_else(|| KitcardError::fetch(format!("no object at '{key}'")))
    }
}

impl ObjectStore for MemoryStore {
    fn put(
        &self,
        signature: &UploadSignature,
        bytes: &[u8],
        content_type: &str,
    ) -> KitcardResult<String> {
        if signature.token.is_empty() {
            return Err(KitcardError::fetch("upload signature is empty"));
        }
        let storage_ref = content_addressed_ref(&signature.folder, bytes, content_type);
        self.lock()?.insert(
            storage_ref.clone(),
            FetchedImage {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(storage_ref)
    }
}
