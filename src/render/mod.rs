//! Pixel output: compositing cutouts onto the base card and encoding the result.

pub(crate) mod composite;
pub(crate) mod cpu;
pub(crate) mod export;

/// A rendered frame in RGBA8 format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Pixel at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let p = &self.data[idx..idx + 4];
        [p[0], p[1], p[2], p[3]]
    }

    /// Copy of the frame with straight (non-premultiplied) alpha.
    pub fn to_straight(&self) -> Self {
        let mut data = self.data.clone();
        if self.premultiplied {
            crate::assets::decode::unpremultiply_rgba8_in_place(&mut data);
        }
        Self {
            width: self.width,
            height: self.height,
            data,
            premultiplied: false,
        }
    }
}
