use crate::foundation::core::{Affine, Canvas, Rect, Size, Vec2};
use crate::foundation::error::{KitcardError, KitcardResult};
use crate::foundation::math::normalize_degrees;

/// Slack for bounds comparisons; rotation matrices are not exact at right angles.
const BOUNDS_EPS: f64 = 1e-9;

/// Placement of a cutout's crop on the canvas.
///
/// `(x, y)` is the top-left corner of the scaled, unrotated crop in canvas pixels. Rotation is
/// applied about the center of that scaled crop, in degrees, clockwise on screen (canvas space is
/// y-down). A scale of `1.0` draws the crop at its native source size; `scale_y`, when present,
/// makes the scale non-uniform with `scale` applying to the x axis.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutoutTransform {
    /// Left edge of the unrotated footprint.
    pub x: f64,
    /// Top edge of the unrotated footprint.
    pub y: f64,
    /// Horizontal (or uniform) scale factor.
    pub scale: f64,
    /// Vertical scale factor, when different from `scale`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    /// Rotation in degrees, normalized to `[0, 360)` on validation.
    #[serde(default)]
    pub rotation: f64,
}

impl Default for CutoutTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            scale_y: None,
            rotation: 0.0,
        }
    }
}

impl CutoutTransform {
    /// Unscaled, unrotated placement at `(x, y)`.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    /// Return the transform with a uniform scale.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self.scale_y = None;
        self
    }

    /// Return the transform with independent x/y scales.
    pub fn with_scale_xy(mut self, sx: f64, sy: f64) -> Self {
        self.scale = sx;
        self.scale_y = if sx == sy { None } else { Some(sy) };
        self
    }

    /// Return the transform rotated to `degrees`.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    /// Return the transform moved by `delta` canvas pixels.
    pub fn translated(mut self, delta: Vec2) -> Self {
        self.x += delta.x;
        self.y += delta.y;
        self
    }

    /// Effective `(sx, sy)` scale.
    pub fn scale_xy(self) -> Vec2 {
        Vec2::new(self.scale, self.scale_y.unwrap_or(self.scale))
    }

    /// Check every component and normalize the rotation.
    pub fn validated(self) -> KitcardResult<Self> {
        let s = self.scale_xy();
        for (name, v) in [
            ("x", self.x),
            ("y", self.y),
            ("rotation", self.rotation),
        ] {
            if !v.is_finite() {
                return Err(KitcardError::invalid_transform(format!(
                    "{name} must be finite, got {v}"
                )));
            }
        }
        if !(s.x.is_finite() && s.y.is_finite() && s.x > 0.0 && s.y > 0.0) {
            return Err(KitcardError::invalid_transform(format!(
                "scale must be finite and > 0, got ({}, {})",
                s.x, s.y
            )));
        }
        // Matches the renderer's invertibility check; rotation does not change the determinant.
        if s.x * s.y <= f64::EPSILON {
            return Err(KitcardError::invalid_transform(format!(
                "scale ({}, {}) collapses the cutout",
                s.x, s.y
            )));
        }
        Ok(Self {
            rotation: normalize_degrees(self.rotation),
            ..self
        })
    }

    /// Size of the scaled, unrotated footprint of a crop of `crop_size`.
    pub fn footprint(self, crop_size: Size) -> Size {
        let s = self.scale_xy();
        Size::new(crop_size.width * s.x, crop_size.height * s.y)
    }

    /// Map crop-local coordinates (`[0, w) x [0, h)`) to canvas space.
    ///
    /// Canonical order: `T(x, y) * T(c) * R(rot) * T(-c) * S(sx, sy)`, where `c` is the center of
    /// the scaled footprint.
    pub fn to_affine(self, crop_size: Size) -> Affine {
        let s = self.scale_xy();
        let fp = self.footprint(crop_size);
        let c = Vec2::new(fp.width * 0.5, fp.height * 0.5);

        Affine::translate(Vec2::new(self.x, self.y))
            * Affine::translate(c)
            * Affine::rotate(self.rotation.to_radians())
            * Affine::translate(-c)
            * Affine::scale_non_uniform(s.x, s.y)
    }

    /// Map source-image pixel coordinates inside `crop` to canvas space.
    pub fn source_to_canvas(self, crop: Rect) -> Affine {
        self.to_affine(crop.size()) * Affine::translate(-crop.origin().to_vec2())
    }
}

/// Canvas-space axis-aligned bounding box of `crop` placed with `transform`.
pub fn apply_transform(crop: Rect, transform: CutoutTransform) -> Rect {
    let local = Rect::from_origin_size((0.0, 0.0), crop.size());
    transform.to_affine(crop.size()).transform_rect_bbox(local)
}

/// Return `true` when `bbox` lies entirely inside `canvas`.
pub fn is_within_canvas(bbox: Rect, canvas: Canvas) -> bool {
    let c = canvas.rect();
    bbox.x0 >= c.x0 - BOUNDS_EPS
        && bbox.y0 >= c.y0 - BOUNDS_EPS
        && bbox.x1 <= c.x1 + BOUNDS_EPS
        && bbox.y1 <= c.y1 + BOUNDS_EPS
}

/// Shift `transform` so the placed crop lies inside `canvas`.
///
/// Axes on which the placed crop is larger than the canvas are centered instead. Scale and
/// rotation are never changed. This is a snapping helper for the UI; stored cutouts are never
/// clamped implicitly.
pub fn clamp_to_canvas(
    transform: CutoutTransform,
    crop: Rect,
    canvas: Canvas,
) -> CutoutTransform {
    fn axis_shift(lo: f64, hi: f64, limit: f64) -> f64 {
        if hi - lo > limit {
            limit * 0.5 - (lo + hi) * 0.5
        } else if lo < 0.0 {
            -lo
        } else if hi > limit {
            limit - hi
        } else {
            0.0
        }
    }

    let bbox = apply_transform(crop, transform);
    let dx = axis_shift(bbox.x0, bbox.x1, f64::from(canvas.width));
    let dy = axis_shift(bbox.y0, bbox.y1, f64::from(canvas.height));
    transform.translated(Vec2::new(dx, dy))
}

/// Transform that scales `crop` uniformly to cover `slot`, centered, unrotated.
pub fn transform_for_slot(crop: Rect, slot: Rect) -> KitcardResult<CutoutTransform> {
    if !(crop.width() > 0.0 && crop.height() > 0.0) {
        return Err(KitcardError::invalid_crop("crop must have positive area"));
    }
    if !(slot.width() > 0.0 && slot.height() > 0.0) {
        return Err(KitcardError::invalid_transform("slot must have positive area"));
    }
    let scale = (slot.width() / crop.width()).max(slot.height() / crop.height());
    let c = slot.center();
    Ok(CutoutTransform::at(
        c.x - crop.width() * scale * 0.5,
        c.y - crop.height() * scale * 0.5,
    )
    .with_scale(scale))
}

/// Check that `crop` is non-degenerate and inside a `width x height` source image.
pub(crate) fn validate_crop(crop: Rect, width: u32, height: u32) -> KitcardResult<()> {
    let finite = [crop.x0, crop.y0, crop.x1, crop.y1]
        .iter()
        .all(|v| v.is_finite());
    if !finite {
        return Err(KitcardError::invalid_crop("crop coordinates must be finite"));
    }
    if !(crop.width() > 0.0 && crop.height() > 0.0) {
        return Err(KitcardError::invalid_crop(format!(
            "crop {}x{} is empty",
            crop.width(),
            crop.height()
        )));
    }
    if crop.x0 < 0.0
        || crop.y0 < 0.0
        || crop.x1 > f64::from(width)
        || crop.y1 > f64::from(height)
    {
        return Err(KitcardError::invalid_crop(format!(
            "crop ({}, {}, {}, {}) exceeds source {width}x{height}",
            crop.x0, crop.y0, crop.x1, crop.y1
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/transform.rs"]
mod tests;
