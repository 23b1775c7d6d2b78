//! Aggregate of every user-tunable rendering setting.

use crate::edge::{EdgeParams, EdgeTechniques};
use crate::material::{IlluminationModel, MaterialLibrary, MaterialParams};
use crate::shadow::ShadowParams;

/// Everything the preset system persists and the UI edits, in one place.
///
/// `global_params` supplies the toon quantization controls (band count,
/// specular thresholds, intensity correction) for the whole frame;
/// per-slot materials supply everything else unless `use_global_model`
/// forces one illumination model everywhere.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderSettings {
    pub global_params: MaterialParams,
    pub global_model: IlluminationModel,
    pub use_global_model: bool,
    pub edge_params: EdgeParams,
    pub edge_techniques: EdgeTechniques,
    pub shadow_params: ShadowParams,
    pub materials: MaterialLibrary,
}

impl RenderSettings {
    /// Restore every parameter to its default, preserving material slot
    /// display names.
    pub fn reset(&mut self) {
        self.global_params = MaterialParams::default();
        self.global_model = IlluminationModel::default();
        self.use_global_model = false;
        self.edge_params = EdgeParams::default();
        self.edge_techniques = EdgeTechniques::default();
        self.shadow_params = ShadowParams::default();
        self.materials.reset_to_defaults();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialSlot;

    #[test]
    fn reset_restores_defaults_but_keeps_names() {
        let mut settings = RenderSettings::default();
        settings.use_global_model = true;
        settings.edge_params.depth_threshold = 0.9;
        settings.shadow_params.map_size = 512;
        settings.materials.get_mut(MaterialSlot::Chest).name = "Loot".to_string();
        settings.materials.get_mut(MaterialSlot::Chest).params.roughness = 0.7;

        settings.reset();

        assert!(!settings.use_global_model);
        assert_eq!(settings.edge_params, EdgeParams::default());
        assert_eq!(settings.shadow_params, ShadowParams::default());
        let chest = settings.materials.get(MaterialSlot::Chest);
        assert_eq!(chest.name, "Loot");
        assert_eq!(chest.params.roughness, MaterialParams::default().roughness);
    }
}
