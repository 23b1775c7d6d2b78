//! Illumination models and per-surface-class material records.
//!
//! Every semantic object class in the scene (floor, walls, torches, ...)
//! owns one [`SurfaceMaterial`] slot. Slots all start from the same default
//! template and are individually overridable; resetting restores the
//! template but keeps each slot's display name.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Per-surface illumination model evaluated in the deferred lighting stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum IlluminationModel {
    /// Standard diffuse.
    #[default]
    Lambertian,
    /// Velvet-like cloth.
    Minnaert,
    /// Dusty/rough surfaces.
    OrenNayar,
    /// Anisotropic metal.
    AshikhminShirley,
    /// Microfacet PBR.
    CookTorrance,
}

impl IlluminationModel {
    pub const ALL: [IlluminationModel; 5] = [
        IlluminationModel::Lambertian,
        IlluminationModel::Minnaert,
        IlluminationModel::OrenNayar,
        IlluminationModel::AshikhminShirley,
        IlluminationModel::CookTorrance,
    ];

    /// Stable integer tag used in G-buffer encoding and GPU uniforms.
    pub fn gpu_id(self) -> u32 {
        match self {
            IlluminationModel::Lambertian => 0,
            IlluminationModel::Minnaert => 1,
            IlluminationModel::OrenNayar => 2,
            IlluminationModel::AshikhminShirley => 3,
            IlluminationModel::CookTorrance => 4,
        }
    }
}

/// Scalar parameters for every illumination model plus the toon
/// quantization controls. Roughness-like terms differ per model, so each
/// model keeps its own field and ignores the rest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialParams {
    pub roughness: f32,
    pub metallic: f32,
    pub minnaert_k: f32,
    pub oren_nayar_roughness: f32,
    pub ashikhmin_shirley_nu: f32,
    pub ashikhmin_shirley_nv: f32,
    pub cook_torrance_roughness: f32,
    pub cook_torrance_f0: f32,
    pub specular_shininess: f32,
    pub albedo: Vec3,

    // Cel shading quantization
    pub enable_quantization: bool,
    pub diffuse_quantization_bands: u32,
    pub specular_threshold1: f32,
    pub specular_threshold2: f32,
    pub intensity_correction: f32,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            roughness: 0.1,
            metallic: 0.0,
            minnaert_k: 1.2,
            oren_nayar_roughness: 0.3,
            ashikhmin_shirley_nu: 100.0,
            ashikhmin_shirley_nv: 100.0,
            cook_torrance_roughness: 0.3,
            cook_torrance_f0: 0.5,
            specular_shininess: 32.0,
            albedo: Vec3::new(0.2, 0.7, 0.9),
            enable_quantization: true,
            diffuse_quantization_bands: 5,
            specular_threshold1: 0.3,
            specular_threshold2: 0.7,
            intensity_correction: 1.0,
        }
    }
}

impl MaterialParams {
    /// The roughness-like term the selected model actually reads.
    pub fn primary_param(&self, model: IlluminationModel) -> f32 {
        match model {
            IlluminationModel::Lambertian => self.roughness,
            IlluminationModel::Minnaert => self.minnaert_k,
            IlluminationModel::OrenNayar => self.oren_nayar_roughness,
            IlluminationModel::AshikhminShirley => self.ashikhmin_shirley_nu,
            IlluminationModel::CookTorrance => self.cook_torrance_roughness,
        }
    }

    /// The model's secondary term (metallic / anisotropy / Fresnel base).
    pub fn secondary_param(&self, model: IlluminationModel) -> f32 {
        match model {
            IlluminationModel::Lambertian => self.metallic,
            IlluminationModel::Minnaert => self.metallic,
            IlluminationModel::OrenNayar => self.metallic,
            IlluminationModel::AshikhminShirley => self.ashikhmin_shirley_nv,
            IlluminationModel::CookTorrance => self.cook_torrance_f0,
        }
    }
}

/// Field-granular override of [`MaterialParams`], used by the preset
/// document. Absent fields keep their current value on apply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MaterialPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roughness: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metallic: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minnaert_k: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oren_nayar_roughness: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ashikhmin_shirley_nu: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ashikhmin_shirley_nv: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cook_torrance_roughness: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cook_torrance_f0: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specular_shininess: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub albedo: Option<Vec3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_quantization: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diffuse_quantization_bands: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specular_threshold1: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specular_threshold2: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity_correction: Option<f32>,
}

impl MaterialPatch {
    /// Snapshot every field for a full-schema save.
    pub fn capture(params: &MaterialParams) -> Self {
        Self {
            roughness: Some(params.roughness),
            metallic: Some(params.metallic),
            minnaert_k: Some(params.minnaert_k),
            oren_nayar_roughness: Some(params.oren_nayar_roughness),
            ashikhmin_shirley_nu: Some(params.ashikhmin_shirley_nu),
            ashikhmin_shirley_nv: Some(params.ashikhmin_shirley_nv),
            cook_torrance_roughness: Some(params.cook_torrance_roughness),
            cook_torrance_f0: Some(params.cook_torrance_f0),
            specular_shininess: Some(params.specular_shininess),
            albedo: Some(params.albedo),
            enable_quantization: Some(params.enable_quantization),
            diffuse_quantization_bands: Some(params.diffuse_quantization_bands),
            specular_threshold1: Some(params.specular_threshold1),
            specular_threshold2: Some(params.specular_threshold2),
            intensity_correction: Some(params.intensity_correction),
        }
    }

    /// Overwrite only the fields present in this patch.
    pub fn apply(&self, params: &mut MaterialParams) {
        if let Some(v) = self.roughness {
            params.roughness = v;
        }
        if let Some(v) = self.metallic {
            params.metallic = v;
        }
        if let Some(v) = self.minnaert_k {
            params.minnaert_k = v;
        }
        if let Some(v) = self.oren_nayar_roughness {
            params.oren_nayar_roughness = v;
        }
        if let Some(v) = self.ashikhmin_shirley_nu {
            params.ashikhmin_shirley_nu = v;
        }
        if let Some(v) = self.ashikhmin_shirley_nv {
            params.ashikhmin_shirley_nv = v;
        }
        if let Some(v) = self.cook_torrance_roughness {
            params.cook_torrance_roughness = v;
        }
        if let Some(v) = self.cook_torrance_f0 {
            params.cook_torrance_f0 = v;
        }
        if let Some(v) = self.specular_shininess {
            params.specular_shininess = v;
        }
        if let Some(v) = self.albedo {
            params.albedo = v;
        }
        if let Some(v) = self.enable_quantization {
            params.enable_quantization = v;
        }
        if let Some(v) = self.diffuse_quantization_bands {
            params.diffuse_quantization_bands = v;
        }
        if let Some(v) = self.specular_threshold1 {
            params.specular_threshold1 = v;
        }
        if let Some(v) = self.specular_threshold2 {
            params.specular_threshold2 = v;
        }
        if let Some(v) = self.intensity_correction {
            params.intensity_correction = v;
        }
    }
}

/// Semantic object classes with independently configurable materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MaterialSlot {
    Floor,
    Wall,
    Ceiling,
    WoodFloor,
    Stair,
    Torch,
    Dirt,
    Table,
    Chair,
    Stool,
    Barrel,
    Shelf,
    Bed,
    Chest,
    Banner,
    Candle,
    Crate,
    SwordShield,
    WoodPallet,
    WoodPlanks,
    StoneStack,
    GoldBars,
    MetalParts,
    Textiles,
}

impl MaterialSlot {
    pub const ALL: [MaterialSlot; 24] = [
        MaterialSlot::Floor,
        MaterialSlot::Wall,
        MaterialSlot::Ceiling,
        MaterialSlot::WoodFloor,
        MaterialSlot::Stair,
        MaterialSlot::Torch,
        MaterialSlot::Dirt,
        MaterialSlot::Table,
        MaterialSlot::Chair,
        MaterialSlot::Stool,
        MaterialSlot::Barrel,
        MaterialSlot::Shelf,
        MaterialSlot::Bed,
        MaterialSlot::Chest,
        MaterialSlot::Banner,
        MaterialSlot::Candle,
        MaterialSlot::Crate,
        MaterialSlot::SwordShield,
        MaterialSlot::WoodPallet,
        MaterialSlot::WoodPlanks,
        MaterialSlot::StoneStack,
        MaterialSlot::GoldBars,
        MaterialSlot::MetalParts,
        MaterialSlot::Textiles,
    ];

    /// Stable key used in the preset document.
    pub fn key(self) -> &'static str {
        match self {
            MaterialSlot::Floor => "floor",
            MaterialSlot::Wall => "wall",
            MaterialSlot::Ceiling => "ceiling",
            MaterialSlot::WoodFloor => "wood_floor",
            MaterialSlot::Stair => "stair",
            MaterialSlot::Torch => "torch",
            MaterialSlot::Dirt => "dirt",
            MaterialSlot::Table => "table",
            MaterialSlot::Chair => "chair",
            MaterialSlot::Stool => "stool",
            MaterialSlot::Barrel => "barrel",
            MaterialSlot::Shelf => "shelf",
            MaterialSlot::Bed => "bed",
            MaterialSlot::Chest => "chest",
            MaterialSlot::Banner => "banner",
            MaterialSlot::Candle => "candle",
            MaterialSlot::Crate => "crate",
            MaterialSlot::SwordShield => "sword_shield",
            MaterialSlot::WoodPallet => "wood_pallet",
            MaterialSlot::WoodPlanks => "wood_planks",
            MaterialSlot::StoneStack => "stone_stack",
            MaterialSlot::GoldBars => "gold_bars",
            MaterialSlot::MetalParts => "metal_parts",
            MaterialSlot::Textiles => "textiles",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|slot| slot.key() == key)
    }

    /// Human-readable name shown by the UI.
    pub fn display_name(self) -> &'static str {
        match self {
            MaterialSlot::Floor => "Floor",
            MaterialSlot::Wall => "Walls",
            MaterialSlot::Ceiling => "Ceiling",
            MaterialSlot::WoodFloor => "Wood Floor",
            MaterialSlot::Stair => "Stairs",
            MaterialSlot::Torch => "Torch",
            MaterialSlot::Dirt => "Grass/Dirt",
            MaterialSlot::Table => "Table",
            MaterialSlot::Chair => "Chair",
            MaterialSlot::Stool => "Stool",
            MaterialSlot::Barrel => "Barrel",
            MaterialSlot::Shelf => "Shelf",
            MaterialSlot::Bed => "Bed",
            MaterialSlot::Chest => "Chest",
            MaterialSlot::Banner => "Banner",
            MaterialSlot::Candle => "Candles",
            MaterialSlot::Crate => "Crates",
            MaterialSlot::SwordShield => "Sword & Shield",
            MaterialSlot::WoodPallet => "Wood Pallet",
            MaterialSlot::WoodPlanks => "Wood Planks",
            MaterialSlot::StoneStack => "Stone Stack",
            MaterialSlot::GoldBars => "Gold Bars",
            MaterialSlot::MetalParts => "Metal Parts",
            MaterialSlot::Textiles => "Textiles",
        }
    }
}

/// One material slot: selected model, its parameters, and the display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMaterial {
    pub model: IlluminationModel,
    pub params: MaterialParams,
    pub name: String,
}

impl SurfaceMaterial {
    fn for_slot(slot: MaterialSlot) -> Self {
        Self {
            model: IlluminationModel::default(),
            params: MaterialParams::default(),
            name: slot.display_name().to_string(),
        }
    }
}

/// All per-class material slots, iterated generically for UI and presets.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialLibrary {
    slots: BTreeMap<MaterialSlot, SurfaceMaterial>,
}

impl Default for MaterialLibrary {
    fn default() -> Self {
        let slots = MaterialSlot::ALL
            .iter()
            .map(|&slot| (slot, SurfaceMaterial::for_slot(slot)))
            .collect();
        Self { slots }
    }
}

impl MaterialLibrary {
    pub fn get(&self, slot: MaterialSlot) -> &SurfaceMaterial {
        // Every slot is populated at construction and never removed.
        &self.slots[&slot]
    }

    pub fn get_mut(&mut self, slot: MaterialSlot) -> &mut SurfaceMaterial {
        self.slots
            .entry(slot)
            .or_insert_with(|| SurfaceMaterial::for_slot(slot))
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialSlot, &SurfaceMaterial)> {
        self.slots.iter().map(|(&slot, mat)| (slot, mat))
    }

    /// Reset every slot to the default template, preserving display names.
    pub fn reset_to_defaults(&mut self) {
        for mat in self.slots.values_mut() {
            let name = std::mem::take(&mut mat.name);
            *mat = SurfaceMaterial {
                model: IlluminationModel::default(),
                params: MaterialParams::default(),
                name,
            };
        }
    }

    /// Apply a preset sub-block keyed by stable slot names. Unknown keys
    /// are ignored; slots and fields absent from the document keep their
    /// values.
    pub fn apply_keyed(&mut self, entries: &BTreeMap<String, SlotOverride>) {
        for (key, entry) in entries {
            if let Some(slot) = MaterialSlot::from_key(key) {
                let mat = self.get_mut(slot);
                if let Some(model) = entry.model {
                    mat.model = model;
                }
                if let Some(patch) = &entry.params {
                    patch.apply(&mut mat.params);
                }
            }
        }
    }

    /// Emit the full keyed map for the preset document.
    pub fn to_keyed(&self) -> BTreeMap<String, SlotOverride> {
        self.slots
            .iter()
            .map(|(&slot, mat)| {
                (
                    slot.key().to_string(),
                    SlotOverride {
                        model: Some(mat.model),
                        params: Some(MaterialPatch::capture(&mat.params)),
                    },
                )
            })
            .collect()
    }
}

/// Preset representation of one material slot; missing fields keep the
/// current value on load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SlotOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<IlluminationModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<MaterialPatch>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_populates_every_slot() {
        let lib = MaterialLibrary::default();
        assert_eq!(lib.iter().count(), MaterialSlot::ALL.len());
    }

    #[test]
    fn reset_preserves_display_names() {
        let mut lib = MaterialLibrary::default();
        lib.get_mut(MaterialSlot::Torch).name = "My Torches".to_string();
        lib.get_mut(MaterialSlot::Torch).params.roughness = 0.9;
        lib.reset_to_defaults();
        let torch = lib.get(MaterialSlot::Torch);
        assert_eq!(torch.name, "My Torches");
        assert_eq!(torch.params.roughness, MaterialParams::default().roughness);
    }

    #[test]
    fn keyed_round_trip_covers_all_slots() {
        let mut lib = MaterialLibrary::default();
        lib.get_mut(MaterialSlot::GoldBars).model = IlluminationModel::CookTorrance;
        let keyed = lib.to_keyed();
        assert_eq!(keyed.len(), MaterialSlot::ALL.len());

        let mut fresh = MaterialLibrary::default();
        fresh.apply_keyed(&keyed);
        assert_eq!(
            fresh.get(MaterialSlot::GoldBars).model,
            IlluminationModel::CookTorrance
        );
    }

    #[test]
    fn slot_patch_leaves_unlisted_fields_alone() {
        let mut lib = MaterialLibrary::default();
        lib.get_mut(MaterialSlot::Barrel).params.specular_shininess = 64.0;

        let mut entries = BTreeMap::new();
        entries.insert(
            "barrel".to_string(),
            SlotOverride {
                model: None,
                params: Some(MaterialPatch {
                    roughness: Some(0.8),
                    ..Default::default()
                }),
            },
        );
        lib.apply_keyed(&entries);

        let barrel = lib.get(MaterialSlot::Barrel);
        assert_eq!(barrel.params.roughness, 0.8);
        assert_eq!(barrel.params.specular_shininess, 64.0);
    }

    #[test]
    fn apply_keyed_ignores_unknown_keys() {
        let mut lib = MaterialLibrary::default();
        let mut entries = BTreeMap::new();
        entries.insert("not_a_slot".to_string(), SlotOverride::default());
        lib.apply_keyed(&entries);
        assert_eq!(lib, MaterialLibrary::default());
    }

    #[test]
    fn primary_param_tracks_model() {
        let params = MaterialParams::default();
        assert_eq!(
            params.primary_param(IlluminationModel::Minnaert),
            params.minnaert_k
        );
        assert_eq!(
            params.primary_param(IlluminationModel::CookTorrance),
            params.cook_torrance_roughness
        );
    }
}
