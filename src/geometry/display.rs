use crate::foundation::core::{Canvas, Point, Size, Vec2};
use crate::foundation::error::{KitcardError, KitcardResult};

/// Inverse of the preview mapping: `canvas = (display - offset) / scale`.
pub fn display_to_canvas(point: Point, display_scale: f64, display_offset: Vec2) -> Point {
    ((point.to_vec2() - display_offset) / display_scale).to_point()
}

/// Affine mapping from canvas space to an on-screen preview.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayMapping {
    /// Uniform display pixels per canvas pixel.
    pub scale: f64,
    /// Display-space position of the canvas origin.
    pub offset: Vec2,
}

impl Default for DisplayMapping {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
        }
    }
}

impl DisplayMapping {
    /// Validated mapping.
    pub fn new(scale: f64, offset: Vec2) -> KitcardResult<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(KitcardError::invalid_transform(format!(
                "display scale must be finite and > 0, got {scale}"
            )));
        }
        if !offset.is_finite() {
            return Err(KitcardError::invalid_transform("display offset must be finite"));
        }
        Ok(Self { scale, offset })
    }

    /// Letterbox `canvas` into `viewport`: largest uniform scale that fits, centered.
    pub fn fit(canvas: Canvas, viewport: Size) -> KitcardResult<Self> {
        let c = canvas.size();
        let scale = (viewport.width / c.width).min(viewport.height / c.height);
        let offset = Vec2::new(
            (viewport.width - c.width * scale) * 0.5,
            (viewport.height - c.height * scale) * 0.5,
        );
        Self::new(scale, offset)
    }

    /// Forward mapping used to draw the preview.
    pub fn canvas_to_display(self, p: Point) -> Point {
        (p.to_vec2() * self.scale + self.offset).to_point()
    }

    /// Inverse mapping used to interpret pointer positions.
    pub fn display_to_canvas(self, p: Point) -> Point {
        display_to_canvas(p, self.scale, self.offset)
    }

    /// Convert a pointer drag delta into a canvas-space translation.
    pub fn display_delta_to_canvas(self, delta: Vec2) -> Vec2 {
        delta / self.scale
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/display.rs"]
mod tests;
