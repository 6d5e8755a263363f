use crate::assets::decode::decode_upload;
use crate::assets::template::TemplateCatalog;
use crate::document::CardDocument;
use crate::document::model::{CutoutId, ImageId, SlotState, UploadMeta};
use crate::foundation::config::SessionOpts;
use crate::foundation::core::Rect;
use crate::foundation::error::KitcardResult;
use crate::project::ProjectDescription;
use crate::remote::ImageFetcher;

/// A document rebuilt from a [`ProjectDescription`].
#[derive(Debug)]
pub struct RestoredProject {
    /// The rebuilt document.
    pub document: CardDocument,
    /// Images whose fetch or decode failed, with the recorded reason. Their slots stay in the
    /// document in the failed state and can be reloaded.
    pub failed: Vec<(ImageId, String)>,
    /// Cutouts that do not fit the restored base card.
    pub out_of_bounds: Vec<CutoutId>,
}

/// Rebuild a document, fetching every source image with a single attempt.
///
/// Structural problems (bad references, invalid crops, unknown template) fail the whole restore.
/// Fetch and decode failures are scoped to the image that produced them.
#[tracing::instrument(
    skip_all,
    fields(images = project.images.len(), cutouts = project.cutouts.len())
)]
pub fn restore_project(
    project: &ProjectDescription,
    catalog: &TemplateCatalog,
    fetcher: &dyn ImageFetcher,
    opts: &SessionOpts,
) -> KitcardResult<RestoredProject> {
    project.validate()?;
    let base = project
        .base_card_id
        .as_deref()
        .map(|id| catalog.get(id))
        .transpose()?;

    let mut doc = CardDocument::new();
    let tickets: Vec<_> = project
        .images
        .iter()
        .map(|rec| {
            let meta = UploadMeta {
                name: rec.name.clone(),
                storage_ref: Some(rec.storage_ref.clone()),
            };
            (rec, doc.push_pending_slot(rec.id, meta))
        })
        .collect();

    let mut ordered: Vec<_> = project.cutouts.iter().collect();
    ordered.sort_by_key(|c| c.z_index);
    for c in ordered {
        doc.push_restored_cutout(
            c.source_image_ref,
            Rect::from(c.crop_rect),
            c.transform.validated()?,
            c.visible,
        );
    }

    for (rec, ticket) in tickets {
        let result = fetcher.fetch(&rec.storage_ref).and_then(|fetched| {
            decode_upload(&fetched.bytes, &opts.limits, opts.thumbnail_max_dim)
        });
        if let Ok(decoded) = &result
            && (decoded.pixels.width, decoded.pixels.height) != (rec.width, rec.height)
        {
            tracing::warn!(
                image = %rec.id,
                recorded = ?(rec.width, rec.height),
                actual = ?(decoded.pixels.width, decoded.pixels.height),
                "source size changed since save"
            );
        }
        doc.complete_upload(ticket, result);
    }

    let failed = doc
        .uploads()
        .iter()
        .filter_map(|slot| match &slot.state {
            SlotState::Failed(reason) => Some((slot.id, reason.clone())),
            _ => None,
        })
        .collect();

    let out_of_bounds = match base {
        Some(template) => doc.set_base_card(template),
        None => Vec::new(),
    };

    Ok(RestoredProject {
        document: doc,
        failed,
        out_of_bounds,
    })
}
