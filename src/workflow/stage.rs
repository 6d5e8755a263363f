use crate::document::CardDocument;

/// One step of the card-building flow.
///
/// Every stage is reachable from every other; gates only produce [`StageHint`]s.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Add source photos.
    #[default]
    Upload,
    /// Pick a base card template.
    Base,
    /// Crop and place cutouts.
    Cutouts,
    /// Review the composed card.
    Preview,
}

impl Stage {
    /// Stages in flow order.
    pub const ALL: [Stage; 4] = [Stage::Upload, Stage::Base, Stage::Cutouts, Stage::Preview];

    /// Short human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Upload => "upload",
            Stage::Base => "base card",
            Stage::Cutouts => "cutouts",
            Stage::Preview => "preview",
        }
    }

    /// Hints for entering this stage with `doc` as it is.
    pub fn hints(self, doc: &CardDocument) -> Vec<StageHint> {
        let mut out = Vec::new();
        match self {
            Stage::Upload | Stage::Base => {}
            Stage::Cutouts => {
                if !doc.has_ready_image() {
                    out.push(StageHint::NeedsUpload);
                }
                if doc.base_card().is_none() {
                    out.push(StageHint::NeedsBaseCard);
                }
            }
            Stage::Preview => {
                if doc.base_card().is_none() && doc.visible_cutouts().next().is_none() {
                    out.push(StageHint::NothingToRender);
                }
            }
        }
        out
    }

    /// Return `true` when entering this stage produces no hints.
    pub fn is_ready(self, doc: &CardDocument) -> bool {
        self.hints(doc).is_empty()
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Advisory reason a stage is not fully usable yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageHint {
    /// No decoded upload exists.
    NeedsUpload,
    /// No base card is selected.
    NeedsBaseCard,
    /// Neither a base card nor a visible cutout exists.
    NothingToRender,
}

impl StageHint {
    /// Message suitable for a status line.
    pub fn message(self) -> &'static str {
        match self {
            StageHint::NeedsUpload => "upload at least one photo first",
            StageHint::NeedsBaseCard => "select a base card first",
            StageHint::NothingToRender => "nothing to preview yet",
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/workflow/stage.rs"]
mod tests;
