//! Persisted project description: references and geometry, never pixels.

pub(crate) mod restore;

use std::collections::BTreeMap;

use crate::document::CardDocument;
use crate::document::model::{ImageId, SlotState};
use crate::foundation::core::{Rect, RectSpec};
use crate::foundation::error::{KitcardError, KitcardResult};
use crate::geometry::transform::{CutoutTransform, validate_crop};

/// Serialized form of a card document.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDescription {
    /// Selected base card template.
    #[serde(default)]
    pub base_card_id: Option<String>,
    /// Cutouts; `z_index` gives paint order.
    #[serde(default)]
    pub cutouts: Vec<CutoutRecord>,
    /// Source images by storage reference.
    #[serde(default)]
    pub images: Vec<ImageRecord>,
}

/// One cutout in a [`ProjectDescription`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutoutRecord {
    /// Id of the source entry in `images`.
    pub source_image_ref: ImageId,
    /// Crop in source pixel space.
    pub crop_rect: RectSpec,
    /// Destination placement.
    pub transform: CutoutTransform,
    /// Paint order.
    pub z_index: u32,
    /// Visibility flag.
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

/// One source image in a [`ProjectDescription`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Id referenced by cutout records.
    pub id: ImageId,
    /// Where the source bytes can be fetched.
    pub storage_ref: String,
    /// Natural width at save time.
    pub width: u32,
    /// Natural height at save time.
    pub height: u32,
    /// Display name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl ProjectDescription {
    /// Parse and validate a JSON project description.
    pub fn from_json(json: &[u8]) -> KitcardResult<Self> {
        let project: Self = serde_json::from_slice(json)
            .map_err(|e| KitcardError::serde(format!("project description: {e}")))?;
        project.validate()?;
        Ok(project)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> KitcardResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| KitcardError::serde(format!("project description: {e}")))
    }

    /// Check references, crops, and transforms without fetching anything.
    pub fn validate(&self) -> KitcardResult<()> {
        let mut images = BTreeMap::new();
        for img in &self.images {
            if img.width == 0 || img.height == 0 {
                return Err(KitcardError::serde(format!("image {} has zero size", img.id)));
            }
            if images.insert(img.id, img).is_some() {
                return Err(KitcardError::serde(format!("duplicate image id {}", img.id)));
            }
        }

        let mut z = Vec::with_capacity(self.cutouts.len());
        for (i, c) in self.cutouts.iter().enumerate() {
            let img = images.get(&c.source_image_ref).ok_or_else(|| {
                KitcardError::serde(format!(
                    "cutout #{i} references missing image {}",
                    c.source_image_ref
                ))
            })?;
            validate_crop(Rect::from(c.crop_rect), img.width, img.height)?;
            c.transform.validated()?;
            z.push(c.z_index);
        }
        z.sort_unstable();
        if z.windows(2).any(|w| w[0] == w[1]) {
            return Err(KitcardError::serde("cutout zIndex values must be unique"));
        }
        Ok(())
    }
}

impl CardDocument {
    /// Describe the document for persistence.
    ///
    /// Every referenced image must be loaded and carry a storage reference; see
    /// [`crate::persist_sources`].
    pub fn to_project(&self) -> KitcardResult<ProjectDescription> {
        let mut images = Vec::new();
        for slot in self.uploads() {
            let SlotState::Ready(img) = &slot.state else {
                if self.cutouts().iter().any(|c| c.source == slot.id) {
                    return Err(KitcardError::serde(format!(
                        "image {} is referenced but not loaded",
                        slot.id
                    )));
                }
                continue;
            };
            let storage_ref = img.storage_ref.clone().ok_or_else(|| {
                KitcardError::serde(format!("image {} has no storage reference", img.id))
            })?;
            images.push(ImageRecord {
                id: img.id,
                storage_ref,
                width: img.width,
                height: img.height,
                name: img.name.clone(),
            });
        }

        let cutouts = self
            .cutouts()
            .iter()
            .map(|c| CutoutRecord {
                source_image_ref: c.source,
                crop_rect: RectSpec::from(c.crop),
                transform: c.transform,
                z_index: c.z_index,
                visible: c.visible,
            })
            .collect();

        Ok(ProjectDescription {
            base_card_id: self.base_card().map(|b| b.id.clone()),
            cutouts,
            images,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/project/mod.rs"]
mod tests;
