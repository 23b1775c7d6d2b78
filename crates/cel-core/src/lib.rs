//! Cel Renderer Core
//!
//! GPU-independent domain logic for the cel-shaded deferred renderer:
//!
//! - [`light`] - Scene light model (directional / point / spot variants)
//! - [`store`] - Bounded light collection with positional slots
//! - [`material`] - Illumination models and per-surface-class materials
//! - [`edge`] - Edge-detection techniques and parameters
//! - [`shadow`] - Shadow mapping parameters
//! - [`settings`] - Aggregate of every user-tunable setting
//! - [`preset`] - Persisted parameter document (JSON)
//! - [`animator`] - Day/night cycle and torch flicker

pub mod animator;
pub mod edge;
pub mod light;
pub mod material;
pub mod preset;
pub mod settings;
pub mod shadow;
pub mod store;

pub use animator::{CelestialState, LightAnimator};
pub use edge::{EdgeParams, EdgePatch, EdgeTechniques};
pub use light::{Attenuation, Light, LightKind, SpotCone};
pub use material::{
    IlluminationModel, MaterialLibrary, MaterialParams, MaterialPatch, MaterialSlot,
    SlotOverride, SurfaceMaterial,
};
pub use preset::{Preset, PresetError};
pub use settings::RenderSettings;
pub use shadow::{ShadowParams, ShadowPatch};
pub use store::{LightStore, MAX_LIGHTS};
