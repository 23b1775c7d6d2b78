//! JSON preset documents.
//!
//! Saving always emits the full schema. Loading is tolerant down to the
//! field level: every key is optional and only the fields present in the
//! document are applied, so hand-edited files and presets written by older
//! builds keep working. A malformed document fails as a unit; the caller's
//! settings are untouched.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::edge::{EdgePatch, EdgeTechniques};
use crate::material::{IlluminationModel, MaterialPatch, SlotOverride};
use crate::settings::RenderSettings;
use crate::shadow::ShadowPatch;

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("preset io: {0}")]
    Io(#[from] std::io::Error),
    #[error("preset parse: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk preset document. Every key is optional on load, and the
/// parameter sub-blocks are patches, so a document can override a single
/// field without disturbing its neighbors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Preset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_params: Option<MaterialPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_model: Option<IlluminationModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_global_model: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_params: Option<EdgePatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_techniques: Option<EdgeTechniques>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_params: Option<ShadowPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub materials: Option<BTreeMap<String, SlotOverride>>,
}

impl Preset {
    /// File name for a numbered preset slot.
    pub fn file_name(index: u32) -> String {
        format!("preset_{index}.json")
    }

    /// Snapshot the full settings state.
    pub fn capture(settings: &RenderSettings) -> Self {
        Self {
            global_params: Some(MaterialPatch::capture(&settings.global_params)),
            global_model: Some(settings.global_model),
            use_global_model: Some(settings.use_global_model),
            edge_params: Some(EdgePatch::capture(&settings.edge_params)),
            edge_techniques: Some(settings.edge_techniques),
            shadow_params: Some(ShadowPatch::capture(&settings.shadow_params)),
            materials: Some(settings.materials.to_keyed()),
        }
    }

    /// Apply the fields present in this document; absent fields keep the
    /// current value.
    pub fn apply(&self, settings: &mut RenderSettings) {
        if let Some(patch) = &self.global_params {
            patch.apply(&mut settings.global_params);
        }
        if let Some(model) = self.global_model {
            settings.global_model = model;
        }
        if let Some(flag) = self.use_global_model {
            settings.use_global_model = flag;
        }
        if let Some(patch) = &self.edge_params {
            patch.apply(&mut settings.edge_params);
        }
        if let Some(techniques) = self.edge_techniques {
            settings.edge_techniques = techniques;
        }
        if let Some(patch) = &self.shadow_params {
            patch.apply(&mut settings.shadow_params);
        }
        if let Some(materials) = &self.materials {
            settings.materials.apply_keyed(materials);
        }
    }

    pub fn load(path: &Path) -> Result<Self, PresetError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), PresetError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialSlot;

    #[test]
    fn capture_then_apply_round_trips() {
        let mut settings = RenderSettings::default();
        settings.use_global_model = true;
        settings.global_model = IlluminationModel::OrenNayar;
        settings.edge_params.depth_threshold = 0.25;
        settings.shadow_params.map_size = 4096;
        settings.materials.get_mut(MaterialSlot::Barrel).model = IlluminationModel::Minnaert;

        let preset = Preset::capture(&settings);
        let json = serde_json::to_string(&preset).unwrap();
        let parsed: Preset = serde_json::from_str(&json).unwrap();

        let mut restored = RenderSettings::default();
        parsed.apply(&mut restored);
        assert_eq!(restored, settings);
    }

    #[test]
    fn partial_document_keeps_absent_sections() {
        let json = r#"{ "edge_params": { "depth_threshold": 0.42 } }"#;
        let preset: Preset = serde_json::from_str(json).unwrap();

        let mut settings = RenderSettings::default();
        settings.shadow_params.bias = 0.123;
        preset.apply(&mut settings);

        assert_eq!(settings.edge_params.depth_threshold, 0.42);
        // Untouched sections keep their values.
        assert_eq!(settings.shadow_params.bias, 0.123);
    }

    #[test]
    fn partial_sub_block_keeps_unlisted_fields() {
        let json = r#"{ "edge_params": { "depth_threshold": 0.42 } }"#;
        let preset: Preset = serde_json::from_str(json).unwrap();

        let mut settings = RenderSettings::default();
        settings.edge_params.edge_width = 2.5;
        settings.edge_params.sobel_scale = 3.0;
        preset.apply(&mut settings);

        assert_eq!(settings.edge_params.depth_threshold, 0.42);
        // Fields the document does not mention are retained, not reset.
        assert_eq!(settings.edge_params.edge_width, 2.5);
        assert_eq!(settings.edge_params.sobel_scale, 3.0);
    }

    #[test]
    fn partial_material_fields_are_retained() {
        let json = r#"{
            "global_params": { "minnaert_k": 1.8 },
            "shadow_params": { "map_size": 4096 }
        }"#;
        let preset: Preset = serde_json::from_str(json).unwrap();

        let mut settings = RenderSettings::default();
        settings.global_params.specular_shininess = 64.0;
        settings.shadow_params.bias = 0.01;
        preset.apply(&mut settings);

        assert_eq!(settings.global_params.minnaert_k, 1.8);
        assert_eq!(settings.global_params.specular_shininess, 64.0);
        assert_eq!(settings.shadow_params.map_size, 4096);
        assert_eq!(settings.shadow_params.bias, 0.01);
    }

    #[test]
    fn empty_document_changes_nothing() {
        let preset: Preset = serde_json::from_str("{}").unwrap();
        let mut settings = RenderSettings::default();
        preset.apply(&mut settings);
        assert_eq!(settings, RenderSettings::default());
    }

    #[test]
    fn malformed_document_is_an_error() {
        let result = serde_json::from_str::<Preset>("{ not json");
        assert!(result.is_err());
    }

    #[test]
    fn file_name_is_indexed() {
        assert_eq!(Preset::file_name(3), "preset_3.json");
    }
}
