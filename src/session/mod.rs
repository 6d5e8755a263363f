//! Editor session: one document, its current stage, and undo history.

pub(crate) mod history;

use std::sync::Arc;

use crate::assets::decode::DecodedUpload;
use crate::assets::template::TemplateCatalog;
use crate::document::CardDocument;
use crate::document::model::{
    CutoutId, CutoutPatch, ImageId, LoadOutcome, LoadTicket, UploadMeta,
};
use crate::foundation::config::SessionOpts;
use crate::foundation::core::Rect;
use crate::foundation::error::KitcardResult;
use crate::geometry::transform::CutoutTransform;
use crate::project::ProjectDescription;
use crate::project::restore::restore_project;
use crate::remote::{ImageFetcher, ObjectStore, UploadSigner};
use crate::render::export::{
    ExportedImage, Preview, export_png, persist_sources, publish_export, render_preview,
};
use crate::workflow::stage::{Stage, StageHint};

use history::History;

/// Interactive editing session over one [`CardDocument`].
///
/// Every successful document mutation is recorded for undo; failed mutations leave both the
/// document and the history untouched. Stage switches and load completions are not edits and
/// are never recorded.
pub struct EditorSession {
    doc: CardDocument,
    stage: Stage,
    history: History<CardDocument>,
    opts: SessionOpts,
    catalog: Arc<TemplateCatalog>,
    preview: Option<CachedPreview>,
}

struct CachedPreview {
    fingerprint: u64,
    max_dim: u32,
    preview: Arc<Preview>,
}

impl EditorSession {
    /// Start an empty session.
    pub fn new(catalog: Arc<TemplateCatalog>, opts: SessionOpts) -> Self {
        Self {
            doc: CardDocument::new(),
            stage: Stage::default(),
            history: History::new(opts.history_depth),
            opts,
            catalog,
            preview: None,
        }
    }

    /// Current document.
    pub fn document(&self) -> &CardDocument {
        &self.doc
    }

    /// Current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Session options.
    pub fn opts(&self) -> &SessionOpts {
        &self.opts
    }

    /// Template catalog.
    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Move to `stage`. Never blocks; returns advisory hints for the new stage.
    pub fn switch_stage(&mut self, stage: Stage) -> Vec<StageHint> {
        let hints = stage.hints(&self.doc);
        if !hints.is_empty() {
            tracing::debug!(%stage, ?hints, "entering stage with hints");
        }
        self.stage = stage;
        hints
    }

    // ---- edits ---------------------------------------------------------------------------

    /// Decode and add an upload.
    pub fn add_upload(&mut self, bytes: &[u8], meta: UploadMeta) -> KitcardResult<ImageId> {
        let opts = self.opts.clone();
        self.edit(|doc| doc.add_upload(bytes, meta, &opts).map(|img| img.id))
    }

    /// Reserve a slot for an asynchronous upload.
    pub fn begin_upload(&mut self, meta: UploadMeta) -> LoadTicket {
        let before = self.doc.clone();
        let ticket = self.doc.begin_upload(meta);
        self.history.record(before);
        ticket
    }

    /// Remove an upload and its cutouts.
    pub fn remove_upload(&mut self, id: ImageId) -> KitcardResult<usize> {
        self.edit(|doc| doc.remove_upload(id))
    }

    /// Select the base card by template id; returns cutouts outside the new canvas.
    pub fn select_base_card(&mut self, template_id: &str) -> KitcardResult<Vec<CutoutId>> {
        let catalog = Arc::clone(&self.catalog);
        self.edit(|doc| doc.select_base_card(&catalog, template_id))
    }

    /// Place a new cutout on top.
    pub fn add_cutout(
        &mut self,
        source: ImageId,
        crop: Rect,
        transform: CutoutTransform,
    ) -> KitcardResult<CutoutId> {
        self.edit(|doc| doc.add_cutout(source, crop, transform).map(|c| c.id))
    }

    /// Partially update a cutout.
    pub fn update_cutout(&mut self, id: CutoutId, patch: CutoutPatch) -> KitcardResult<()> {
        self.edit(|doc| doc.update_cutout(id, patch).map(|_| ()))
    }

    /// Show or hide a cutout.
    pub fn set_cutout_visible(&mut self, id: CutoutId, visible: bool) -> KitcardResult<()> {
        self.edit(|doc| doc.set_cutout_visible(id, visible))
    }

    /// Move a cutout in paint order.
    pub fn reorder_cutout(&mut self, id: CutoutId, new_z: u32) -> KitcardResult<()> {
        self.edit(|doc| doc.reorder_cutout(id, new_z))
    }

    /// Delete a cutout.
    pub fn remove_cutout(&mut self, id: CutoutId) -> KitcardResult<()> {
        self.edit(|doc| doc.remove_cutout(id).map(|_| ()))
    }

    fn edit<R>(
        &mut self,
        op: impl FnOnce(&mut CardDocument) -> KitcardResult<R>,
    ) -> KitcardResult<R> {
        let before = self.doc.clone();
        let out = op(&mut self.doc)?;
        self.history.record(before);
        Ok(out)
    }

    // ---- loads ---------------------------------------------------------------------------

    /// Apply an asynchronous load result to the current document and to every snapshot that
    /// still holds the slot, so undo never resurrects a pending load.
    ///
    /// When an edit removed the slot from the current document the outcome is
    /// [`LoadOutcome::Stale`], but snapshots that still hold the ticket's slot take the result,
    /// so undoing the removal brings the image back loaded.
    pub fn complete_upload(
        &mut self,
        ticket: LoadTicket,
        result: KitcardResult<DecodedUpload>,
    ) -> LoadOutcome {
        if self.doc.slot(ticket.image).is_none() {
            self.complete_in_history(ticket, result);
            return LoadOutcome::Stale;
        }
        let outcome = self.doc.complete_upload(ticket, result);
        if outcome != LoadOutcome::Stale {
            self.sync_slot_to_history(ticket.image);
        }
        outcome
    }

    fn complete_in_history(&mut self, ticket: LoadTicket, result: KitcardResult<DecodedUpload>) {
        let holder = self.history.iter_mut().find(|snap| {
            snap.slot(ticket.image)
                .is_some_and(|slot| slot.generation == ticket.generation && slot.is_pending())
        });
        let Some(snap) = holder else {
            return;
        };
        if snap.complete_upload(ticket, result) == LoadOutcome::Stale {
            return;
        }
        let Some(slot) = snap.slot(ticket.image).cloned() else {
            return;
        };
        tracing::debug!(image = %ticket.image, "load applied to undo history only");
        self.history.for_each_mut(|snap| snap.adopt_slot(&slot));
    }

    /// Issue a new load for a pending or failed slot.
    pub fn reload_upload(&mut self, id: ImageId) -> KitcardResult<LoadTicket> {
        let ticket = self.doc.reload_upload(id)?;
        self.sync_slot_to_history(id);
        Ok(ticket)
    }

    fn sync_slot_to_history(&mut self, id: ImageId) {
        if let Some(slot) = self.doc.slot(id) {
            self.history.for_each_mut(|snap| snap.adopt_slot(slot));
        }
    }

    // ---- history -------------------------------------------------------------------------

    /// Return `true` when there is an edit to undo.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Return `true` when there is an undone edit to reapply.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Revert the last edit. Returns `false` when there was nothing to undo.
    ///
    /// Identifier and generation allocation keeps counting from where the current document left
    /// off, so tickets issued before the undo never match slots created after it.
    pub fn undo(&mut self) -> bool {
        let seen = self.doc.counters();
        let current = std::mem::take(&mut self.doc);
        let (doc, changed) = match self.history.undo(current) {
            Ok(prev) => (prev, true),
            Err(current) => (current, false),
        };
        self.doc = doc;
        self.doc.raise_counters(seen);
        changed
    }

    /// Reapply the last undone edit. Returns `false` when there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let seen = self.doc.counters();
        let current = std::mem::take(&mut self.doc);
        let (doc, changed) = match self.history.redo(current) {
            Ok(next) => (next, true),
            Err(current) => (current, false),
        };
        self.doc = doc;
        self.doc.raise_counters(seen);
        changed
    }

    // ---- output --------------------------------------------------------------------------

    /// Downscaled preview, re-rendered only when the document changed.
    pub fn preview(&mut self) -> KitcardResult<Arc<Preview>> {
        let fingerprint = self.doc.fingerprint();
        let max_dim = self.opts.preview_max_dim;
        if let Some(cached) = &self.preview
            && cached.fingerprint == fingerprint
            && cached.max_dim == max_dim
        {
            return Ok(Arc::clone(&cached.preview));
        }
        let preview = Arc::new(render_preview(&self.doc, max_dim)?);
        self.preview = Some(CachedPreview {
            fingerprint,
            max_dim,
            preview: Arc::clone(&preview),
        });
        Ok(preview)
    }

    /// Full-resolution PNG export.
    pub fn export(&self) -> KitcardResult<ExportedImage> {
        export_png(&self.doc)
    }

    /// Export and upload the card; returns its storage reference.
    pub fn publish(
        &self,
        signer: &dyn UploadSigner,
        store: &dyn ObjectStore,
        folder: &str,
    ) -> KitcardResult<String> {
        publish_export(&self.doc, signer, store, folder)
    }

    /// Persist unsaved sources, then describe the document.
    ///
    /// Storage references assigned here are copied into the undo history, so undoing never
    /// forgets where a source was saved.
    pub fn save(
        &mut self,
        signer: &dyn UploadSigner,
        store: &dyn ObjectStore,
        folder: &str,
    ) -> KitcardResult<ProjectDescription> {
        let persisted = persist_sources(&mut self.doc, signer, store, folder);
        let refs: Vec<(ImageId, String)> = self
            .doc
            .images()
            .filter_map(|img| img.storage_ref.clone().map(|r| (img.id, r)))
            .collect();
        self.history.for_each_mut(|snap| {
            for (id, storage_ref) in &refs {
                // Snapshots that no longer hold the image have nothing to update.
                let _ = snap.set_storage_ref(*id, storage_ref.clone());
            }
        });
        persisted?;
        self.doc.to_project()
    }

    /// Replace the document with a restored project and clear the history.
    ///
    /// Returns cutouts outside the restored base card. Images that failed to load stay in the
    /// document as failed slots.
    pub fn restore(
        &mut self,
        project: &ProjectDescription,
        fetcher: &dyn ImageFetcher,
    ) -> KitcardResult<Vec<CutoutId>> {
        let restored = restore_project(project, &self.catalog, fetcher, &self.opts)?;
        for (id, reason) in &restored.failed {
            tracing::warn!(image = %id, %reason, "restored image unavailable");
        }
        self.doc = restored.document;
        self.history.clear();
        self.preview = None;
        Ok(restored.out_of_bounds)
    }

    /// Leave the session: cancel pending loads and drop the history.
    pub fn close(&mut self) -> Vec<ImageId> {
        let cancelled = self.doc.cancel_pending_loads();
        self.history.clear();
        self.preview = None;
        cancelled
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/mod.rs"]
mod tests;
