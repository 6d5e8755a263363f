//! The card document: canonical editing state and the only place it is mutated.
//!
//! Every mutating operation validates first and commits last, so a returned error always means
//! the document is unchanged. Operations are deterministic: identifiers and load generations come
//! from counters inside the document, never from clocks or randomness.

/// Document data types.
pub mod model;

use std::sync::Arc;

use crate::assets::decode::{DecodedUpload, decode_upload};
use crate::assets::template::{BaseCardTemplate, TemplateCatalog};
use crate::foundation::config::SessionOpts;
use crate::foundation::core::Rect;
use crate::foundation::error::{KitcardError, KitcardResult};
use crate::foundation::math::Fnv1a64;
use crate::geometry::transform::{
    CutoutTransform, apply_transform, is_within_canvas, validate_crop,
};

use model::{
    Cutout, CutoutId, CutoutPatch, ImageId, LoadOutcome, LoadTicket, SlotState, UploadMeta,
    UploadSlot, UploadedImage,
};

/// Aggregate root of one card-builder session.
#[derive(Clone, Debug, Default)]
pub struct CardDocument {
    uploads: Vec<UploadSlot>,
    base_card: Option<Arc<BaseCardTemplate>>,
    // Paint order: `cutouts[i].z_index == i`.
    cutouts: Vec<Cutout>,
    counters: IdCounters,
}

/// High-water marks of every identifier and load generation handed out so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct IdCounters {
    image: u64,
    cutout: u64,
    generation: u64,
}

impl IdCounters {
    fn max(self, other: Self) -> Self {
        Self {
            image: self.image.max(other.image),
            cutout: self.cutout.max(other.cutout),
            generation: self.generation.max(other.generation),
        }
    }
}

impl CardDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    // ---- queries -------------------------------------------------------------------------

    /// All upload slots in insertion order, including pending and failed ones.
    pub fn uploads(&self) -> &[UploadSlot] {
        &self.uploads
    }

    /// Decoded images in insertion order.
    pub fn images(&self) -> impl Iterator<Item = &UploadedImage> {
        self.uploads.iter().filter_map(UploadSlot::image)
    }

    /// Slot by id, whatever its state.
    pub fn slot(&self, id: ImageId) -> Option<&UploadSlot> {
        self.uploads.iter().find(|s| s.id == id)
    }

    /// Decoded image by id.
    pub fn image(&self, id: ImageId) -> KitcardResult<&UploadedImage> {
        let slot = self
            .slot(id)
            .ok_or_else(|| KitcardError::not_found(format!("image {id}")))?;
        slot.image()
            .ok_or_else(|| KitcardError::not_found(format!("image {id} is not loaded")))
    }

    /// Active base card, if one is selected.
    pub fn base_card(&self) -> Option<&Arc<BaseCardTemplate>> {
        self.base_card.as_ref()
    }

    /// Cutouts in paint order (lowest z first).
    pub fn cutouts(&self) -> &[Cutout] {
        &self.cutouts
    }

    /// Cutout by id.
    pub fn cutout(&self, id: CutoutId) -> KitcardResult<&Cutout> {
        self.cutouts
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| KitcardError::not_found(format!("cutout {id}")))
    }

    /// Visible cutouts in paint order.
    pub fn visible_cutouts(&self) -> impl Iterator<Item = &Cutout> {
        self.cutouts.iter().filter(|c| c.visible)
    }

    /// Return `true` when at least one upload is decoded.
    pub fn has_ready_image(&self) -> bool {
        self.images().next().is_some()
    }

    /// Whether the cutout's placed footprint leaves the active canvas.
    ///
    /// Derived on demand; `false` while no base card is selected.
    pub fn is_out_of_bounds(&self, id: CutoutId) -> KitcardResult<bool> {
        let cutout = self.cutout(id)?;
        Ok(self.cutout_out_of_bounds(cutout))
    }

    /// Identifiers of every cutout whose placed footprint leaves the active canvas.
    pub fn out_of_bounds_cutouts(&self) -> Vec<CutoutId> {
        self.cutouts
            .iter()
            .filter(|c| self.cutout_out_of_bounds(c))
            .map(|c| c.id)
            .collect()
    }

    fn cutout_out_of_bounds(&self, cutout: &Cutout) -> bool {
        self.base_card.as_ref().is_some_and(|base| {
            !is_within_canvas(apply_transform(cutout.crop, cutout.transform), base.canvas)
        })
    }

    /// Hash of everything that affects rendering, for change detection within a session.
    pub fn fingerprint(&self) -> u64 {
        let mut h = Fnv1a64::new_default();
        match &self.base_card {
            Some(base) => {
                h.write_u8(1);
                h.write_str(&base.id);
                h.write_u32(base.canvas.width);
                h.write_u32(base.canvas.height);
                h.write_u64(Arc::as_ptr(base) as usize as u64);
            }
            None => h.write_u8(0),
        }
        for slot in &self.uploads {
            h.write_u64(slot.id.0);
            h.write_u64(slot.generation);
            match &slot.state {
                SlotState::Pending => h.write_u8(0),
                SlotState::Ready(img) => {
                    h.write_u8(1);
                    h.write_u32(img.width);
                    h.write_u32(img.height);
                    h.write_u64(Arc::as_ptr(&img.pixels.rgba8_premul) as usize as u64);
                }
                SlotState::Failed(_) => h.write_u8(2),
            }
        }
        for c in &self.cutouts {
            h.write_u64(c.id.0);
            h.write_u64(c.source.0);
            for v in [c.crop.x0, c.crop.y0, c.crop.x1, c.crop.y1] {
                h.write_f64(v);
            }
            let t = c.transform;
            for v in [t.x, t.y, t.scale, t.scale_y.unwrap_or(t.scale), t.rotation] {
                h.write_f64(v);
            }
            h.write_u32(c.z_index);
            h.write_u8(u8::from(c.visible));
        }
        h.finish()
    }

    // ---- uploads -------------------------------------------------------------------------

    /// Decode, validate, and append an upload.
    pub fn add_upload(
        &mut self,
        bytes: &[u8],
        meta: UploadMeta,
        opts: &SessionOpts,
    ) -> KitcardResult<&UploadedImage> {
        let decoded = decode_upload(bytes, &opts.limits, opts.thumbnail_max_dim)?;
        let id = self.insert_decoded(decoded, meta);
        self.image(id)
    }

    /// Append an upload that was decoded elsewhere.
    pub fn insert_decoded(&mut self, decoded: DecodedUpload, meta: UploadMeta) -> ImageId {
        let id = self.alloc_image_id();
        let generation = self.alloc_generation();
        let image =
            UploadedImage::from_decoded(id, meta.name.clone(), meta.storage_ref.clone(), decoded);
        tracing::debug!(%id, width = image.width, height = image.height, "upload added");
        self.uploads.push(UploadSlot {
            id,
            name: meta.name,
            storage_ref: meta.storage_ref,
            generation,
            state: SlotState::Ready(image),
        });
        id
    }

    /// Reserve a slot for an upload whose decode runs asynchronously.
    ///
    /// The slot keeps its place in the upload list no matter when the decode completes.
    pub fn begin_upload(&mut self, meta: UploadMeta) -> LoadTicket {
        let id = self.alloc_image_id();
        self.push_pending_slot(id, meta)
    }

    pub(crate) fn push_pending_slot(&mut self, id: ImageId, meta: UploadMeta) -> LoadTicket {
        let generation = self.alloc_generation();
        self.uploads.push(UploadSlot {
            id,
            name: meta.name,
            storage_ref: meta.storage_ref,
            generation,
            state: SlotState::Pending,
        });
        self.counters.image = self.counters.image.max(id.0);
        LoadTicket {
            image: id,
            generation,
        }
    }

    /// Issue a new load for a pending or failed slot; earlier tickets become stale.
    pub fn reload_upload(&mut self, id: ImageId) -> KitcardResult<LoadTicket> {
        let generation = self.counters.generation + 1;
        let slot = self
            .uploads
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| KitcardError::not_found(format!("image {id}")))?;
        if matches!(slot.state, SlotState::Ready(_)) {
            return Err(KitcardError::not_found(format!(
                "image {id} is already loaded"
            )));
        }
        slot.generation = generation;
        slot.state = SlotState::Pending;
        self.counters.generation = generation;
        Ok(LoadTicket {
            image: id,
            generation,
        })
    }

    /// Apply the result of an asynchronous load.
    ///
    /// Completions for removed slots or superseded generations are dropped without touching the
    /// document. Only the ticket's own slot is ever written.
    pub fn complete_upload(
        &mut self,
        ticket: LoadTicket,
        result: KitcardResult<DecodedUpload>,
    ) -> LoadOutcome {
        let Some(idx) = self.uploads.iter().position(|s| s.id == ticket.image) else {
            tracing::debug!(image = %ticket.image, "dropping load for removed slot");
            return LoadOutcome::Stale;
        };
        if self.uploads[idx].generation != ticket.generation {
            tracing::debug!(image = %ticket.image, "dropping superseded load");
            return LoadOutcome::Stale;
        }

        let decoded = match result {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::warn!(image = %ticket.image, error = %err, "upload failed to load");
                self.uploads[idx].state = SlotState::Failed(err.to_string());
                return LoadOutcome::Failed(ticket.image);
            }
        };

        let (w, h) = (decoded.pixels.width, decoded.pixels.height);
        if let Some(c) = self
            .cutouts
            .iter()
            .find(|c| c.source == ticket.image && validate_crop(c.crop, w, h).is_err())
        {
            let reason = format!("loaded image {w}x{h} does not contain crop of {}", c.id);
            tracing::warn!(image = %ticket.image, %reason, "upload rejected");
            self.uploads[idx].state = SlotState::Failed(reason);
            return LoadOutcome::Failed(ticket.image);
        }

        let slot = &mut self.uploads[idx];
        let image = UploadedImage::from_decoded(
            slot.id,
            slot.name.clone(),
            slot.storage_ref.clone(),
            decoded,
        );
        slot.state = SlotState::Ready(image);
        LoadOutcome::Applied(ticket.image)
    }

    /// Drop every slot whose load is still in flight, with their cutouts.
    pub fn cancel_pending_loads(&mut self) -> Vec<ImageId> {
        let pending: Vec<ImageId> = self
            .uploads
            .iter()
            .filter(|s| s.is_pending())
            .map(|s| s.id)
            .collect();
        if pending.is_empty() {
            return pending;
        }
        self.uploads.retain(|s| !s.is_pending());
        self.cutouts.retain(|c| !pending.contains(&c.source));
        self.renumber();
        pending
    }

    /// Remove an upload and every cutout that references it.
    ///
    /// Returns the number of cutouts removed.
    pub fn remove_upload(&mut self, id: ImageId) -> KitcardResult<usize> {
        let idx = self
            .uploads
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| KitcardError::not_found(format!("image {id}")))?;
        self.uploads.remove(idx);

        let before = self.cutouts.len();
        self.cutouts.retain(|c| c.source != id);
        let removed = before - self.cutouts.len();
        self.renumber();
        tracing::debug!(%id, cascaded = removed, "upload removed");
        Ok(removed)
    }

    /// Record where an upload's source bytes were persisted.
    pub fn set_storage_ref(&mut self, id: ImageId, storage_ref: String) -> KitcardResult<()> {
        let slot = self
            .uploads
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| KitcardError::not_found(format!("image {id}")))?;
        if let SlotState::Ready(img) = &mut slot.state {
            img.storage_ref = Some(storage_ref.clone());
        }
        slot.storage_ref = Some(storage_ref);
        Ok(())
    }

    // ---- base card -----------------------------------------------------------------------

    /// Select the active base card from `catalog`.
    ///
    /// Returns the cutouts that no longer fit the new canvas. They are reported, never moved or
    /// deleted.
    pub fn select_base_card(
        &mut self,
        catalog: &TemplateCatalog,
        template_id: &str,
    ) -> KitcardResult<Vec<CutoutId>> {
        let template = catalog.get(template_id)?;
        Ok(self.set_base_card(template))
    }

    /// Replace the active base card.
    pub fn set_base_card(&mut self, template: Arc<BaseCardTemplate>) -> Vec<CutoutId> {
        tracing::debug!(template = %template.id, "base card selected");
        self.base_card = Some(template);
        let oob = self.out_of_bounds_cutouts();
        if !oob.is_empty() {
            tracing::warn!(count = oob.len(), "cutouts outside the new canvas");
        }
        oob
    }

    // ---- cutouts -------------------------------------------------------------------------

    /// Place a new cutout on top of all others.
    pub fn add_cutout(
        &mut self,
        source: ImageId,
        crop: Rect,
        transform: CutoutTransform,
    ) -> KitcardResult<&Cutout> {
        let image = self.image(source)?;
        validate_crop(crop, image.width, image.height)?;
        let transform = transform.validated()?;

        let id = self.alloc_cutout_id();
        let z_index = self.cutouts.len() as u32;
        self.cutouts.push(Cutout {
            id,
            source,
            crop,
            transform,
            z_index,
            visible: true,
        });
        tracing::debug!(%id, %source, z_index, "cutout added");
        Ok(&self.cutouts[z_index as usize])
    }

    /// Partially update a cutout's crop, transform, or visibility.
    pub fn update_cutout(&mut self, id: CutoutId, patch: CutoutPatch) -> KitcardResult<&Cutout> {
        let idx = self.cutout_index(id)?;
        let current = &self.cutouts[idx];

        let crop = match patch.crop {
            Some(crop) => {
                let image = self.image(current.source)?;
                validate_crop(crop, image.width, image.height)?;
                crop
            }
            None => current.crop,
        };
        let transform = match patch.transform {
            Some(t) => t.validated()?,
            None => current.transform,
        };

        let c = &mut self.cutouts[idx];
        c.crop = crop;
        c.transform = transform;
        if let Some(visible) = patch.visible {
            c.visible = visible;
        }
        Ok(&self.cutouts[idx])
    }

    /// Show or hide a cutout.
    pub fn set_cutout_visible(&mut self, id: CutoutId, visible: bool) -> KitcardResult<()> {
        let idx = self.cutout_index(id)?;
        self.cutouts[idx].visible = visible;
        Ok(())
    }

    /// Move a cutout to `new_z` in paint order; indices past the top clamp to the top.
    pub fn reorder_cutout(&mut self, id: CutoutId, new_z: u32) -> KitcardResult<()> {
        let idx = self.cutout_index(id)?;
        let cutout = self.cutouts.remove(idx);
        let target = (new_z as usize).min(self.cutouts.len());
        self.cutouts.insert(target, cutout);
        self.renumber();
        Ok(())
    }

    /// Delete a cutout.
    pub fn remove_cutout(&mut self, id: CutoutId) -> KitcardResult<Cutout> {
        let idx = self.cutout_index(id)?;
        let removed = self.cutouts.remove(idx);
        self.renumber();
        Ok(removed)
    }

    // ---- internals -----------------------------------------------------------------------

    pub(crate) fn push_restored_cutout(
        &mut self,
        source: ImageId,
        crop: Rect,
        transform: CutoutTransform,
        visible: bool,
    ) -> CutoutId {
        let id = self.alloc_cutout_id();
        self.cutouts.push(Cutout {
            id,
            source,
            crop,
            transform,
            z_index: self.cutouts.len() as u32,
            visible,
        });
        id
    }

    /// Take over `from`'s load state when this document holds the same slot unloaded.
    pub(crate) fn adopt_slot(&mut self, from: &UploadSlot) {
        if let Some(slot) = self.uploads.iter_mut().find(|s| s.id == from.id)
            && !matches!(slot.state, SlotState::Ready(_))
        {
            *slot = from.clone();
        }
    }

    fn cutout_index(&self, id: CutoutId) -> KitcardResult<usize> {
        self.cutouts
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| KitcardError::not_found(format!("cutout {id}")))
    }

    fn renumber(&mut self) {
        for (i, c) in self.cutouts.iter_mut().enumerate() {
            c.z_index = i as u32;
        }
    }

    pub(crate) fn counters(&self) -> IdCounters {
        self.counters
    }

    /// Never hand out an identifier or generation at or below `seen`.
    ///
    /// Restoring an older snapshot must not rewind allocation, or a ticket still in flight
    /// could match a slot created after the restore.
    pub(crate) fn raise_counters(&mut self, seen: IdCounters) {
        self.counters = self.counters.max(seen);
    }

    fn alloc_image_id(&mut self) -> ImageId {
        self.counters.image += 1;
        ImageId(self.counters.image)
    }

    fn alloc_cutout_id(&mut self) -> CutoutId {
        self.counters.cutout += 1;
        CutoutId(self.counters.cutout)
    }

    fn alloc_generation(&mut self) -> u64 {
        self.counters.generation += 1;
        self.counters.generation
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/mod.rs"]
mod tests;
