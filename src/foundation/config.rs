use image::ImageFormat;

/// Environment variable overriding [`UploadLimits::max_bytes`].
pub const ENV_MAX_UPLOAD_BYTES: &str = "KITCARD_MAX_UPLOAD_BYTES";
/// Environment variable overriding [`UploadLimits::max_pixels`].
pub const ENV_MAX_UPLOAD_PIXELS: &str = "KITCARD_MAX_UPLOAD_PIXELS";

/// Ceilings applied to every upload before it enters a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadLimits {
    /// Maximum encoded size in bytes.
    pub max_bytes: usize,
    /// Maximum decoded pixel area (`width * height`).
    pub max_pixels: u64,
    /// Accepted container formats.
    pub formats: Vec<ImageFormat>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: 20 * 1024 * 1024,
            max_pixels: 40_000_000,
            formats: vec![
                ImageFormat::Png,
                ImageFormat::Jpeg,
                ImageFormat::WebP,
                ImageFormat::Gif,
            ],
        }
    }
}

impl UploadLimits {
    /// Defaults, with byte and pixel ceilings overridable from the environment.
    ///
    /// Unparseable or zero values are ignored.
    pub fn from_env() -> Self {
        let mut limits = Self::default();
        if let Some(v) = env_positive(ENV_MAX_UPLOAD_BYTES) {
            limits.max_bytes = v as usize;
        }
        if let Some(v) = env_positive(ENV_MAX_UPLOAD_PIXELS) {
            limits.max_pixels = v;
        }
        limits
    }

    /// Return `true` when `format` is in the accepted list.
    pub fn accepts(&self, format: ImageFormat) -> bool {
        self.formats.contains(&format)
    }
}

fn env_positive(key: &str) -> Option<u64> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|&n| n > 0)
}

/// Options for an [`crate::EditorSession`].
#[derive(Clone, Debug)]
pub struct SessionOpts {
    /// Upload ceilings.
    pub limits: UploadLimits,
    /// Maximum number of undo snapshots kept.
    pub history_depth: usize,
    /// Longest edge of generated upload thumbnails, in pixels.
    pub thumbnail_max_dim: u32,
    /// Longest edge of rendered previews, in pixels.
    pub preview_max_dim: u32,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            limits: UploadLimits::default(),
            history_depth: 64,
            thumbnail_max_dim: 256,
            preview_max_dim: 720,
        }
    }
}

impl SessionOpts {
    /// Return options with the given upload limits.
    pub fn with_limits(mut self, limits: UploadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Return options with the given undo depth.
    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth;
        self
    }

    /// Return options with the given thumbnail edge length (at least 1).
    pub fn with_thumbnail_max_dim(mut self, dim: u32) -> Self {
        self.thumbnail_max_dim = dim.max(1);
        self
    }

    /// Return options with the given preview edge length (at least 1).
    pub fn with_preview_max_dim(mut self, dim: u32) -> Self {
        self.preview_max_dim = dim.max(1);
        self
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
