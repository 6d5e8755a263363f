//! Kitcard is a deterministic image-composition engine for building cards from photo cutouts.
//!
//! A [`CardDocument`] owns uploaded photos, the selected base card template and an ordered list
//! of cutouts (cropped, scaled and rotated regions of those photos). The engine renders the
//! document onto the base card canvas and exports byte-stable PNGs.
//!
//! - Decode uploads with [`CardDocument::add_upload`] or the async pair
//!   [`CardDocument::begin_upload`] / [`CardDocument::complete_upload`]
//! - Pick a template from a [`TemplateCatalog`] and place cutouts
//! - Render with [`render_canvas`], [`render_preview`] or [`export_png`]
//! - Persist with [`ProjectDescription`] and restore with [`restore_project`]
//!
//! [`EditorSession`] wraps a document with stage tracking, undo/redo and a preview cache.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;

pub(crate) mod document;
pub(crate) mod geometry;
pub(crate) mod project;
/// Storage collaborators: signing, object stores and fetchers.
pub mod remote;
pub(crate) mod render;
pub(crate) mod session;
pub(crate) mod workflow;

pub use crate::foundation::config::{
    ENV_MAX_UPLOAD_BYTES, ENV_MAX_UPLOAD_PIXELS, SessionOpts, UploadLimits,
};
pub use crate::foundation::core::{Affine, Canvas, Point, Rect, RectSpec, Rgba8Premul, Size, Vec2};
pub use crate::foundation::error::{KitcardError, KitcardResult};

pub use crate::assets::decode::{DecodedUpload, PreparedImage, decode_upload};
pub use crate::assets::svg_raster::rasterize_svg;
pub use crate::assets::template::{
    ArtSpec, BaseCardTemplate, CatalogLoad, TemplateArt, TemplateCatalog, TemplateSpec,
};
pub use crate::document::CardDocument;
pub use crate::document::model::{
    Cutout, CutoutId, CutoutPatch, ImageId, LoadOutcome, LoadTicket, SlotState, UploadMeta,
    UploadSlot, UploadedImage,
};
pub use crate::geometry::display::{DisplayMapping, display_to_canvas};
pub use crate::geometry::transform::{
    CutoutTransform, apply_transform, clamp_to_canvas, is_within_canvas, transform_for_slot,
};
pub use crate::project::restore::{RestoredProject, restore_project};
pub use crate::project::{CutoutRecord, ImageRecord, ProjectDescription};
pub use crate::remote::dir::DirStore;
pub use crate::remote::memory::MemoryStore;
pub use crate::remote::{
    FetchedImage, ImageFetcher, LocalSigner, ObjectStore, UploadSignature, UploadSigner,
};
pub use crate::render::FrameRGBA;
pub use crate::render::cpu::render_canvas;
pub use crate::render::export::{
    EXPORT_CONTENT_TYPE, ExportedImage, Preview, encode_png, export_png, persist_sources,
    publish_export, render_preview,
};
pub use crate::session::EditorSession;
pub use crate::workflow::stage::{Stage, StageHint};
