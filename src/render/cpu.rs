use rayon::prelude::*;

use crate::assets::decode::PreparedImage;
use crate::assets::template::{BaseCardTemplate, TemplateArt};
use crate::document::CardDocument;
use crate::document::model::{Cutout, UploadSlot};
use crate::foundation::core::{Canvas, Point, Rect};
use crate::foundation::error::{KitcardError, KitcardResult};
use crate::foundation::math::quantize_u8;
use crate::render::FrameRGBA;
use crate::render::composite::{PremulRgba8, fill, over};

// Sample offsets closer than this to a pixel center snap onto it, so axis-aligned placements
// copy source pixels exactly even when the inverse matrix carries rounding noise.
const SNAP_EPS: f64 = 1e-6;

/// Composite the document onto its base card at full canvas resolution.
///
/// Visible cutouts are drawn in ascending z order with premultiplied source-over, clipped to the
/// canvas. Cutouts whose source image is not loaded are skipped.
#[tracing::instrument(skip(doc))]
pub fn render_canvas(doc: &CardDocument) -> KitcardResult<FrameRGBA> {
    let base = doc.base_card().ok_or(KitcardError::NoBaseCard)?;
    let canvas = base.canvas;
    let mut data = base_pixels(base);

    for cutout in doc.visible_cutouts() {
        let Some(image) = doc.slot(cutout.source).and_then(UploadSlot::image) else {
            tracing::warn!(
                cutout = %cutout.id,
                source = %cutout.source,
                "source not loaded, skipping"
            );
            continue;
        };
        draw_cutout(&mut data, canvas, &image.pixels, cutout)?;
    }

    Ok(FrameRGBA {
        width: canvas.width,
        height: canvas.height,
        data,
        premultiplied: true,
    })
}

fn base_pixels(base: &BaseCardTemplate) -> Vec<u8> {
    match &base.art {
        TemplateArt::Transparent => vec![0; base.canvas.rgba_len()],
        TemplateArt::Solid(c) => {
            let mut data = vec![0; base.canvas.rgba_len()];
            fill(&mut data, c.to_array());
            data
        }
        TemplateArt::Raster(img) => img.rgba8_premul.as_ref().clone(),
    }
}

fn draw_cutout(
    dst: &mut [u8],
    canvas: Canvas,
    src: &PreparedImage,
    cutout: &Cutout,
) -> KitcardResult<()> {
    let to_canvas = cutout.transform.source_to_canvas(cutout.crop);
    if to_canvas.determinant().abs() <= f64::EPSILON {
        return Err(KitcardError::invalid_transform(format!(
            "cutout {} has a degenerate transform",
            cutout.id
        )));
    }
    let to_source = to_canvas.inverse();

    let bbox = to_canvas.transform_rect_bbox(cutout.crop);
    let x0 = bbox.x0.floor().max(0.0);
    let y0 = bbox.y0.floor().max(0.0);
    let x1 = bbox.x1.ceil().min(f64::from(canvas.width));
    let y1 = bbox.y1.ceil().min(f64::from(canvas.height));
    if !(x0 < x1 && y0 < y1) {
        return Ok(());
    }
    let (x0, x1) = (x0 as usize, x1 as usize);
    let (y0, y1) = (y0 as usize, y1 as usize);

    let sampler = CropSampler::new(src, cutout.crop);
    let stride = canvas.width as usize * 4;
    dst[y0 * stride..y1 * stride]
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(i, row)| {
            let cy = (y0 + i) as f64 + 0.5;
            for x in x0..x1 {
                let p = to_source * Point::new(x as f64 + 0.5, cy);
                if let Some(s) = sampler.sample(p) {
                    let d = &mut row[x * 4..x * 4 + 4];
                    let out = over([d[0], d[1], d[2], d[3]], s);
                    d.copy_from_slice(&out);
                }
            }
        });
    Ok(())
}

/// Bilinear sampler restricted to the pixels of one crop rectangle.
struct CropSampler<'a> {
    img: &'a PreparedImage,
    crop: Rect,
    min_x: i64,
    max_x: i64,
    min_y: i64,
    max_y: i64,
}

impl<'a> CropSampler<'a> {
    fn new(img: &'a PreparedImage, crop: Rect) -> Self {
        let max_x = (crop.x1.ceil() as i64 - 1).min(i64::from(img.width) - 1);
        let max_y = (crop.y1.ceil() as i64 - 1).min(i64::from(img.height) - 1);
        Self {
            img,
            crop,
            min_x: (crop.x0.floor() as i64).min(max_x),
            max_x,
            min_y: (crop.y0.floor() as i64).min(max_y),
            max_y,
        }
    }

    /// Sample at source-space point `p`; `None` outside the crop (hard edge).
    fn sample(&self, p: Point) -> Option<PremulRgba8> {
        let c = self.crop;
        if !(p.x >= c.x0 && p.x < c.x1 && p.y >= c.y0 && p.y < c.y1) {
            return None;
        }
        let (ix, fx) = split_center(p.x);
        let (iy, fy) = split_center(p.y);

        let xa = ix.clamp(self.min_x, self.max_x) as u32;
        let xb = (ix + 1).clamp(self.min_x, self.max_x) as u32;
        let ya = iy.clamp(self.min_y, self.max_y) as u32;
        let yb = (iy + 1).clamp(self.min_y, self.max_y) as u32;

        if fx == 0.0 && fy == 0.0 {
            return Some(self.img.pixel(xa, ya));
        }

        let p00 = self.img.pixel(xa, ya);
        let p10 = self.img.pixel(xb, ya);
        let p01 = self.img.pixel(xa, yb);
        let p11 = self.img.pixel(xb, yb);

        let mut out = [0u8; 4];
        for i in 0..4 {
            let top = f64::from(p00[i]) * (1.0 - fx) + f64::from(p10[i]) * fx;
            let bottom = f64::from(p01[i]) * (1.0 - fx) + f64::from(p11[i]) * fx;
            out[i] = quantize_u8(top * (1.0 - fy) + bottom * fy);
        }
        Some(out)
    }
}

/// Split a coordinate into the pixel whose center lies at or before it and the fractional
/// distance past that center.
fn split_center(v: f64) -> (i64, f64) {
    let u = v - 0.5;
    let base = u.floor();
    let frac = u - base;
    if frac < SNAP_EPS {
        (base as i64, 0.0)
    } else if frac > 1.0 - SNAP_EPS {
        (base as i64 + 1, 0.0)
    } else {
        (base as i64, frac)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
