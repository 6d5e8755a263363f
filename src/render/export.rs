use std::io::Cursor;

use anyhow::Context;

use crate::assets::decode::{thumbnail_scale, thumbnail_size};
use crate::document::CardDocument;
use crate::document::model::SlotState;
use crate::foundation::core::Vec2;
use crate::foundation::error::{KitcardError, KitcardResult};
use crate::geometry::display::DisplayMapping;
use crate::remote::{ObjectStore, UploadSigner};
use crate::render::FrameRGBA;
use crate::render::cpu::render_canvas;

/// Content type of every export.
pub const EXPORT_CONTENT_TYPE: &str = "image/png";

/// Encoded export of a composed card.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedImage {
    /// Width in pixels; always the base card canvas width.
    pub width: u32,
    /// Height in pixels; always the base card canvas height.
    pub height: u32,
    /// MIME type of `bytes`.
    pub content_type: &'static str,
    /// Encoded raster.
    pub bytes: Vec<u8>,
}

/// Downscaled render for on-screen display.
#[derive(Clone, Debug, PartialEq)]
pub struct Preview {
    /// Premultiplied preview pixels.
    pub frame: FrameRGBA,
    /// Mapping from canvas space to preview pixels.
    pub mapping: DisplayMapping,
}

/// Render the document at full resolution and encode it as PNG.
///
/// Output bytes depend only on the document, so two exports of an unchanged document are
/// byte-identical.
#[tracing::instrument(skip(doc))]
pub fn export_png(doc: &CardDocument) -> KitcardResult<ExportedImage> {
    let frame = render_canvas(doc)?;
    let bytes = encode_png(&frame)?;
    tracing::debug!(width = frame.width, height = frame.height, len = bytes.len(), "exported");
    Ok(ExportedImage {
        width: frame.width,
        height: frame.height,
        content_type: EXPORT_CONTENT_TYPE,
        bytes,
    })
}

/// Encode a frame as straight-alpha PNG.
pub fn encode_png(frame: &FrameRGBA) -> KitcardResult<Vec<u8>> {
    let straight = frame.to_straight();
    let img = image::RgbaImage::from_raw(straight.width, straight.height, straight.data)
        .ok_or_else(|| KitcardError::invalid_format("frame buffer does not match its size"))?;
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(out)
}

/// Render a preview whose longest edge is at most `max_dim`.
///
/// The composition is rendered at canvas resolution first and downsampled afterwards, so the
/// preview shows exactly what an export would contain. Small canvases are never upscaled.
/// The mapping's scale is the uniform downscale factor; each rounded edge is within half a
/// preview pixel of it.
#[tracing::instrument(skip(doc))]
pub fn render_preview(doc: &CardDocument, max_dim: u32) -> KitcardResult<Preview> {
    let full = render_canvas(doc)?;
    let (pw, ph) = thumbnail_size(full.width, full.height, max_dim);
    if (pw, ph) == (full.width, full.height) {
        return Ok(Preview {
            frame: full,
            mapping: DisplayMapping::default(),
        });
    }

    // The mapping uses the factor both edges were rounded from, so neither axis drifts.
    let scale = thumbnail_scale(full.width, full.height, max_dim);
    let img = image::RgbaImage::from_raw(full.width, full.height, full.data)
        .ok_or_else(|| KitcardError::invalid_format("frame buffer does not match its size"))?;
    // Premultiplied data filters correctly with a plain linear kernel.
    let small = image::imageops::resize(&img, pw, ph, image::imageops::FilterType::Triangle);
    Ok(Preview {
        frame: FrameRGBA {
            width: pw,
            height: ph,
            data: small.into_raw(),
            premultiplied: true,
        },
        mapping: DisplayMapping::new(scale, Vec2::ZERO)?,
    })
}

/// Export the card and upload it into `folder`; returns the storage reference.
#[tracing::instrument(skip(doc, signer, store))]
pub fn publish_export(
    doc: &CardDocument,
    signer: &dyn UploadSigner,
    store: &dyn ObjectStore,
    folder: &str,
) -> KitcardResult<String> {
    let exported = export_png(doc)?;
    let signature = signer.sign(folder)?;
    let storage_ref = store.put(&signature, &exported.bytes, exported.content_type)?;
    tracing::debug!(%storage_ref, "export published");
    Ok(storage_ref)
}

/// Upload the source bytes of every loaded image that has no storage reference yet.
///
/// Returns how many images were persisted. On error, images persisted before the failure keep
/// their new references.
#[tracing::instrument(skip(doc, signer, store))]
pub fn persist_sources(
    doc: &mut CardDocument,
    signer: &dyn UploadSigner,
    store: &dyn ObjectStore,
    folder: &str,
) -> KitcardResult<usize> {
    let pending: Vec<_> = doc
        .uploads()
        .iter()
        .filter_map(|slot| match &slot.state {
            SlotState::Ready(img) if img.storage_ref.is_none() => Some((
                img.id,
                img.source_bytes.clone(),
                img.content_type.clone(),
            )),
            _ => None,
        })
        .collect();
    if pending.is_empty() {
        return Ok(0);
    }

    let signature = signer.sign(folder)?;
    for (id, bytes, content_type) in &pending {
        let storage_ref = store.put(&signature, bytes, content_type)?;
        doc.set_storage_ref(*id, storage_ref)?;
    }
    Ok(pending.len())
}

#[cfg(test)]
#[path = "../../tests/unit/render/export.rs"]
mod tests;
