use std::path::{Path, PathBuf};

use crate::foundation::error::{KitcardError, KitcardResult};
use crate::remote::{
    FetchedImage, ImageFetcher, ObjectStore, UploadSignature, content_addressed_ref,
    content_type_for_ref, normalize_rel_path,
};

/// Object store rooted at a local directory. Storage references are relative paths.
#[derive(Clone, Debug)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Create a store rooted at `root`. The directory is created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, storage_ref: &str) -> KitcardResult<PathBuf> {
        Ok(self.root.join(normalize_rel_path(storage_ref)?))
    }
}

impl ImageFetcher for DirStore {
    fn fetch(&self, storage_ref: &str) -> KitcardResult<FetchedImage> {
        let path = self.path_for(storage_ref)?;
        let bytes = std::fs::read(&path)
            .map_err(|e| KitcardError::fetch(format!("read '{}': {e}", path.display())))?;
        Ok(FetchedImage {
            bytes,
            content_type: content_type_for_ref(storage_ref).to_string(),
        })
    }
}

impl ObjectStore for DirStore {
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
        let path = self.path_for(&storage_ref)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                KitcardError::fetch(format!("create dir '{}': {e}", parent.display()))
            })?;
        }
        std::fs::write(&path, bytes)
            .map_err(|e| KitcardError::fetch(format!("write '{}': {e}", path.display())))?;
        tracing::debug!(%storage_ref, len = bytes.len(), "stored object");
        Ok(storage_ref)
    }
}
