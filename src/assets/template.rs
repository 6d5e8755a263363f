use std::collections::BTreeMap;
use std::sync::Arc;

use crate::assets::decode::{PreparedImage, decode_image};
use crate::assets::svg_raster::rasterize_svg;
use crate::foundation::core::{Canvas, Rect, RectSpec, Rgba8Premul};
use crate::foundation::error::{KitcardError, KitcardResult};
use crate::remote::ImageFetcher;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
/// Catalog description of a template's background art.
pub enum ArtSpec {
    /// Empty background; the template is layered content drawn elsewhere.
    Transparent,
    /// Uniform straight-alpha fill.
    Solid {
        /// Straight-alpha RGBA8 color.
        rgba: [u8; 4],
    },
    /// Raster art fetched from storage; must match the canvas size.
    Image {
        /// Storage reference passed to the fetcher.
        storage_ref: String,
    },
    /// Vector art fetched from storage and rasterized to the canvas size.
    Svg {
        /// Storage reference passed to the fetcher.
        storage_ref: String,
    },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Serializable catalog entry for one base card template.
pub struct TemplateSpec {
    /// Template identifier referenced by project descriptions.
    pub id: String,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Regions where cutouts are expected to sit, in canvas space.
    #[serde(default)]
    pub slots: Vec<RectSpec>,
    /// Background art.
    pub art: ArtSpec,
}

#[derive(Clone, Debug, PartialEq)]
/// Resolved template pixels, ready for compositing.
pub enum TemplateArt {
    /// Start from a fully transparent canvas.
    Transparent,
    /// Uniform premultiplied fill.
    Solid(Rgba8Premul),
    /// Canvas-sized premultiplied raster.
    Raster(PreparedImage),
}

#[derive(Clone, Debug, PartialEq)]
/// A base card: the fixed-resolution background onto which cutouts are composited.
pub struct BaseCardTemplate {
    /// Template identifier.
    pub id: String,
    /// Output resolution.
    pub canvas: Canvas,
    /// Optional slot regions in canvas space.
    pub slots: Vec<Rect>,
    /// Background pixels.
    pub art: TemplateArt,
}

impl BaseCardTemplate {
    /// Create a template, validating that raster art matches the canvas.
    pub fn new(id: impl Into<String>, canvas: Canvas, art: TemplateArt) -> KitcardResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(KitcardError::invalid_format("template id must be non-empty"));
        }
        if let TemplateArt::Raster(img) = &art
            && (img.width != canvas.width || img.height != canvas.height)
        {
            return Err(KitcardError::invalid_format(format!(
                "template '{id}' art is {}x{} but canvas is {}x{}",
                img.width, img.height, canvas.width, canvas.height
            )));
        }
        Ok(Self {
            id,
            canvas,
            slots: Vec::new(),
            art,
        })
    }

    /// Return the template with the given slot regions.
    pub fn with_slots(mut self, slots: Vec<Rect>) -> Self {
        self.slots = slots;
        self
    }

    /// Resolve a catalog entry, fetching remote art with a single attempt.
    pub fn resolve(spec: &TemplateSpec, fetcher: &dyn ImageFetcher) -> KitcardResult<Self> {
        let canvas = Canvas::new(spec.width, spec.height)?;
        let art = match &spec.art {
            ArtSpec::Transparent => TemplateArt::Transparent,
            ArtSpec::Solid { rgba } => TemplateArt::Solid(Rgba8Premul::from_straight_rgba(
                rgba[0], rgba[1], rgba[2], rgba[3],
            )),
            ArtSpec::Image { storage_ref } => {
                let fetched = fetcher.fetch(storage_ref)?;
                TemplateArt::Raster(decode_image(&fetched.bytes)?)
            }
            ArtSpec::Svg { storage_ref } => {
                let fetched = fetcher.fetch(storage_ref)?;
                TemplateArt::Raster(rasterize_svg(&fetched.bytes, canvas)?)
            }
        };
        let slots = spec.slots.iter().copied().map(Rect::from).collect();
        Ok(Self::new(spec.id.clone(), canvas, art)?.with_slots(slots))
    }
}

/// Outcome of loading a batch of template specs.
///
/// Failures are scoped to the template that produced them.
#[derive(Debug, Default)]
pub struct CatalogLoad {
    /// Identifiers that were resolved and inserted.
    pub loaded: Vec<String>,
    /// Identifiers that failed, with the reason.
    pub failed: Vec<(String, KitcardError)>,
}

#[derive(Clone, Debug, Default)]
/// Lookup table of base card templates available to a session.
pub struct TemplateCatalog {
    templates: BTreeMap<String, Arc<BaseCardTemplate>>,
}

impl TemplateCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON array of [`TemplateSpec`] values.
    pub fn parse_specs(json: &[u8]) -> KitcardResult<Vec<TemplateSpec>> {
        serde_json::from_slice(json)
            .map_err(|e| KitcardError::serde(format!("template catalog: {e}")))
    }

    /// Insert or replace a template.
    pub fn insert(&mut self, template: BaseCardTemplate) -> Arc<BaseCardTemplate> {
        let t = Arc::new(template);
        self.templates.insert(t.id.clone(), Arc::clone(&t));
        t
    }

    /// Resolve and insert every spec. One unreachable template does not stop the rest.
    #[tracing::instrument(skip_all, fields(count = specs.len()))]
    pub fn load(&mut self, specs: &[TemplateSpec], fetcher: &dyn ImageFetcher) -> CatalogLoad {
        let mut out = CatalogLoad::default();
        for spec in specs {
            match BaseCardTemplate::resolve(spec, fetcher) {
                Ok(t) => {
                    self.insert(t);
                    out.loaded.push(spec.id.clone());
                }
                Err(err) => {
                    tracing::warn!(template = %spec.id, error = %err, "template failed to load");
                    out.failed.push((spec.id.clone(), err));
                }
            }
        }
        out
    }

    /// Look up a template by id.
    pub fn get(&self, id: &str) -> KitcardResult<Arc<BaseCardTemplate>> {
        self.templates
            .get(id)
            .cloned()
            .ok_or_else(|| KitcardError::not_found(format!("template '{id}'")))
    }

    /// Template identifiers in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Return `true` when the catalog has no templates.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/template.rs"]
mod tests;
