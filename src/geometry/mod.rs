//! Coordinate mapping between source-image, canvas, and display space.

pub(crate) mod display;
pub(crate) mod transform;
