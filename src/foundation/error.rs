/// Convenience result type used across kitcard.
pub type KitcardResult<T> = Result<T, KitcardError>;

/// Top-level error taxonomy used by the card builder.
///
/// Every variant is recoverable at the UI boundary: the operation that produced it left the
/// document unchanged.
#[derive(thiserror::Error, Debug)]
pub enum KitcardError {
    /// Upload bytes are not a decodable image in an accepted format.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Upload exceeds the configured byte or pixel-area ceiling.
    #[error("too large: {0}")]
    TooLarge(String),

    /// An operation referenced a stale image, cutout, or template identifier.
    #[error("not found: {0}")]
    NotFound(String),

    /// Crop rectangle is degenerate or leaves the source image bounds.
    #[error("invalid crop: {0}")]
    InvalidCrop(String),

    /// Destination transform has non-finite values or a non-positive scale.
    #[error("invalid transform: {0}")]
    InvalidTransform(String),

    /// Export or preview requested before a base card was selected.
    #[error("no base card selected")]
    NoBaseCard,

    /// Remote retrieval or upload collaborator failure.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Errors when serializing or deserializing a project description.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KitcardError {
    /// Build a [`KitcardError::InvalidFormat`] value.
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    /// Build a [`KitcardError::TooLarge`] value.
    pub fn too_large(msg: impl Into<String>) -> Self {
        Self::TooLarge(msg.into())
    }

    /// Build a [`KitcardError::NotFound`] value.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`KitcardError::InvalidCrop`] value.
    pub fn invalid_crop(msg: impl Into<String>) -> Self {
        Self::InvalidCrop(msg.into())
    }

    /// Build a [`KitcardError::InvalidTransform`] value.
    pub fn invalid_transform(msg: impl Into<String>) -> Self {
        Self::InvalidTransform(msg.into())
    }

    /// Build a [`KitcardError::Fetch`] value.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Build a [`KitcardError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
