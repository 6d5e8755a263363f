use std::sync::Arc;

use crate::assets::decode::{DecodedUpload, PreparedImage};
use crate::foundation::core::Rect;
use crate::geometry::transform::CutoutTransform;

/// Stable identifier of an uploaded image within one document.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ImageId(pub u64);

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "img-{}", self.0)
    }
}

/// Stable identifier of a cutout within one document.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct CutoutId(pub u64);

impl std::fmt::Display for CutoutId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cut-{}", self.0)
    }
}

/// Caller-supplied description of an upload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadMeta {
    /// Display name, usually the original file name.
    pub name: String,
    /// Storage reference when the bytes are already persisted.
    pub storage_ref: Option<String>,
}

impl UploadMeta {
    /// Metadata with only a display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage_ref: None,
        }
    }
}

/// A decoded source photo owned by the document.
#[derive(Clone, Debug)]
pub struct UploadedImage {
    /// Identifier.
    pub id: ImageId,
    /// Display name.
    pub name: String,
    /// Natural width of the decoded buffer.
    pub width: u32,
    /// Natural height of the decoded buffer.
    pub height: u32,
    /// Full-resolution premultiplied pixels.
    pub pixels: PreparedImage,
    /// Downscaled premultiplied pixels for display lists.
    pub thumbnail: PreparedImage,
    /// Original encoded bytes.
    pub source_bytes: Arc<Vec<u8>>,
    /// MIME type of `source_bytes`.
    pub content_type: String,
    /// Where the source bytes live once persisted.
    pub storage_ref: Option<String>,
}

impl UploadedImage {
    pub(crate) fn from_decoded(
        id: ImageId,
        name: String,
        storage_ref: Option<String>,
        decoded: DecodedUpload,
    ) -> Self {
        let content_type = decoded.content_type().to_string();
        Self {
            id,
            name,
            width: decoded.pixels.width,
            height: decoded.pixels.height,
            pixels: decoded.pixels,
            thumbnail: decoded.thumbnail,
            source_bytes: decoded.source_bytes,
            content_type,
            storage_ref,
        }
    }
}

/// Load state of one upload slot.
#[derive(Clone, Debug)]
pub enum SlotState {
    /// A decode or fetch is in flight.
    Pending,
    /// The image is decoded and usable.
    Ready(UploadedImage),
    /// The last load failed; the slot can be reloaded or removed.
    Failed(String),
}

/// One entry in the document's upload list.
///
/// `generation` changes every time a new load is issued for the slot, so completions from an
/// earlier load can be recognized and dropped.
#[derive(Clone, Debug)]
pub struct UploadSlot {
    /// Identifier shared by the slot and its image.
    pub id: ImageId,
    /// Display name.
    pub name: String,
    /// Storage reference known for this slot, if any.
    pub storage_ref: Option<String>,
    /// Token of the most recently issued load.
    pub generation: u64,
    /// Current load state.
    pub state: SlotState,
}

impl UploadSlot {
    /// The decoded image, when ready.
    pub fn image(&self) -> Option<&UploadedImage> {
        match &self.state {
            SlotState::Ready(img) => Some(img),
            _ => None,
        }
    }

    /// Return `true` while a load is in flight.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, SlotState::Pending)
    }
}

/// One positioned crop of an uploaded image.
#[derive(Clone, Debug, PartialEq)]
pub struct Cutout {
    /// Identifier.
    pub id: CutoutId,
    /// Source image, looked up by id in the owning document.
    pub source: ImageId,
    /// Crop rectangle in source pixel space.
    pub crop: Rect,
    /// Destination placement in canvas space.
    pub transform: CutoutTransform,
    /// Paint order; dense and unique across the document.
    pub z_index: u32,
    /// Hidden cutouts are kept but not rendered.
    pub visible: bool,
}

/// Partial update for [`crate::CardDocument::update_cutout`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CutoutPatch {
    /// New crop rectangle.
    pub crop: Option<Rect>,
    /// New destination transform.
    pub transform: Option<CutoutTransform>,
    /// New visibility.
    pub visible: Option<bool>,
}

impl CutoutPatch {
    /// Patch that only replaces the crop.
    pub fn crop(crop: Rect) -> Self {
        Self {
            crop: Some(crop),
            ..Self::default()
        }
    }

    /// Patch that only replaces the transform.
    pub fn transform(transform: CutoutTransform) -> Self {
        Self {
            transform: Some(transform),
            ..Self::default()
        }
    }
}

/// Handle for an in-flight image load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    /// Slot the load was issued for.
    pub image: ImageId,
    /// Generation of the slot when the load was issued.
    pub generation: u64,
}

/// What happened to a load completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The slot now holds the decoded image.
    Applied(ImageId),
    /// The slot recorded the failure.
    Failed(ImageId),
    /// The slot was removed or reloaded since the ticket was issued; nothing changed.
    Stale,
}
