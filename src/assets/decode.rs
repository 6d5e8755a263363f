use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context;
use image::ImageFormat;

use crate::foundation::config::UploadLimits;
use crate::foundation::error::{KitcardError, KitcardResult};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Raster image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Wrap a straight-alpha RGBA8 image, premultiplying its pixels.
    pub fn from_rgba_straight(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let mut rgba8_premul = img.into_raw();
        premultiply_rgba8_in_place(&mut rgba8_premul);
        Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        }
    }

    /// Premultiplied pixel at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let p = &self.rgba8_premul[idx..idx + 4];
        [p[0], p[1], p[2], p[3]]
    }
}

#[derive(Clone, Debug)]
/// A validated, decoded upload ready to be placed into a document slot.
pub struct DecodedUpload {
    /// Detected container format.
    pub format: ImageFormat,
    /// Full-resolution pixels at the natural size of the encoded image.
    pub pixels: PreparedImage,
    /// Downscaled copy for display lists.
    pub thumbnail: PreparedImage,
    /// Original encoded bytes, kept for persisting the source to storage.
    pub source_bytes: Arc<Vec<u8>>,
}

impl DecodedUpload {
    /// MIME type of the original encoded bytes.
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

/// Validate and decode upload bytes.
///
/// Checks run cheapest first: byte ceiling, format sniffing, header dimensions against the
/// pixel-area ceiling, and only then the full decode.
#[tracing::instrument(skip(bytes, limits), fields(len = bytes.len()))]
pub fn decode_upload(
    bytes: &[u8],
    limits: &UploadLimits,
    thumbnail_max_dim: u32,
) -> KitcardResult<DecodedUpload> {
    if bytes.len() > limits.max_bytes {
        return Err(KitcardError::too_large(format!(
            "upload is {} bytes (max {})",
            bytes.len(),
            limits.max_bytes
        )));
    }

    let format = image::guess_format(bytes)
        .map_err(|_| KitcardError::invalid_format("unrecognized image data"))?;
    if !limits.accepts(format) {
        return Err(KitcardError::invalid_format(format!(
            "{} uploads are not accepted",
            format.to_mime_type()
        )));
    }

    let (w, h) = image::ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|e| KitcardError::invalid_format(format!("unreadable image header: {e}")))?;
    if w == 0 || h == 0 {
        return Err(KitcardError::invalid_format("image has zero area"));
    }
    let area = u64::from(w) * u64::from(h);
    if area > limits.max_pixels {
        return Err(KitcardError::too_large(format!(
            "image is {w}x{h} ({area} px, max {})",
            limits.max_pixels
        )));
    }

    let rgba = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| KitcardError::invalid_format(format!("decode failed: {e}")))?
        .to_rgba8();

    let (tw, th) = thumbnail_size(w, h, thumbnail_max_dim);
    let thumbnail = if (tw, th) == (w, h) {
        rgba.clone()
    } else {
        image::imageops::thumbnail(&rgba, tw, th)
    };

    tracing::debug!(width = w, height = h, ?format, "decoded upload");
    Ok(DecodedUpload {
        format,
        pixels: PreparedImage::from_rgba_straight(rgba),
        thumbnail: PreparedImage::from_rgba_straight(thumbnail),
        source_bytes: Arc::new(bytes.to_vec()),
    })
}

/// Decode trusted image bytes (templates) without upload ceilings.
pub fn decode_image(bytes: &[u8]) -> KitcardResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(PreparedImage::from_rgba_straight(dyn_img.to_rgba8()))
}

/// Uniform factor `thumbnail_size` applies before rounding each edge; `1.0` when no downscale
/// is needed.
pub(crate) fn thumbnail_scale(w: u32, h: u32, max_dim: u32) -> f64 {
    let longest = w.max(h);
    let max_dim = max_dim.max(1);
    if longest <= max_dim {
        1.0
    } else {
        f64::from(max_dim) / f64::from(longest)
    }
}

/// Fit `(w, h)` inside a square of `max_dim`, never upscaling.
pub(crate) fn thumbnail_size(w: u32, h: u32, max_dim: u32) -> (u32, u32) {
    let max_dim = max_dim.max(1);
    let scale = thumbnail_scale(w, h, max_dim);
    if scale == 1.0 {
        return (w, h);
    }
    let tw = (f64::from(w) * scale).round_ties_even().max(1.0) as u32;
    let th = (f64::from(h) * scale).round_ties_even().max(1.0) as u32;
    (tw.min(max_dim), th.min(max_dim))
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u32;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u32 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
