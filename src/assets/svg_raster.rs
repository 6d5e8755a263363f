use std::sync::Arc;

use anyhow::Context;

use crate::assets::decode::PreparedImage;
use crate::foundation::core::Canvas;
use crate::foundation::error::{KitcardError, KitcardResult};

/// Rasterize SVG template art so it exactly fills `canvas`.
///
/// The SVG's own size is stretched non-uniformly onto the canvas; templates are authored at the
/// card aspect ratio so this only compensates for unit differences. `tiny-skia` pixmaps are
/// already premultiplied RGBA8, which is the format the compositor expects.
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn rasterize_svg(bytes: &[u8], canvas: Canvas) -> KitcardResult<PreparedImage> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;

    let size = tree.size();
    if !size.width().is_finite() || size.width() <= 0.0 || !size.height().is_finite() {
        return Err(KitcardError::invalid_format("svg has invalid width/height"));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(canvas.width, canvas.height)
        .ok_or_else(|| KitcardError::invalid_format("failed to allocate svg pixmap"))?;

    let sx = (canvas.width as f32) / size.width();
    let sy = (canvas.height as f32) / size.height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(&tree, xform, &mut pixmap.as_mut());
    Ok(PreparedImage {
        width: canvas.width,
        height: canvas.height,
        rgba8_premul: Arc::new(pixmap.data().to_vec()),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/svg_raster.rs"]
mod tests;
