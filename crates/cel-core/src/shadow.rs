//! Shadow mapping parameters shared by every shadow-casting light.

use serde::{Deserialize, Serialize};

/// Global shadow tunables. Map resolutions apply at slot (re)allocation,
/// the rest are read each frame by the lighting stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowParams {
    /// Resolution of directional and spot shadow maps.
    pub map_size: u32,
    /// Per-face resolution of point-light cube maps.
    pub cube_size: u32,
    pub bias: f32,
    pub normal_bias: f32,
    /// PCF kernel radius; the kernel is `(2n+1)^2` taps.
    pub pcf_samples: u32,
    pub enable_pcf: bool,
    /// How dark shadowed areas get, 0 = no darkening, 1 = black.
    pub shadow_intensity: f32,
    /// Half-extent of the directional ortho projection.
    pub ortho_size: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            map_size: 2048,
            cube_size: 1024,
            bias: 0.005,
            normal_bias: 0.02,
            pcf_samples: 2,
            enable_pcf: true,
            shadow_intensity: 0.7,
            ortho_size: 20.0,
            near: 0.5,
            far: 50.0,
        }
    }
}

/// Field-granular override of [`ShadowParams`], used by the preset
/// document. Absent fields keep their current value on apply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ShadowPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cube_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bias: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal_bias: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pcf_samples: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_pcf: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_intensity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ortho_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub near: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub far: Option<f32>,
}

impl ShadowPatch {
    /// Snapshot every field for a full-schema save.
    pub fn capture(params: &ShadowParams) -> Self {
        Self {
            map_size: Some(params.map_size),
            cube_size: Some(params.cube_size),
            bias: Some(params.bias),
            normal_bias: Some(params.normal_bias),
            pcf_samples: Some(params.pcf_samples),
            enable_pcf: Some(params.enable_pcf),
            shadow_intensity: Some(params.shadow_intensity),
            ortho_size: Some(params.ortho_size),
            near: Some(params.near),
            far: Some(params.far),
        }
    }

    /// Overwrite only the fields present in this patch.
    pub fn apply(&self, params: &mut ShadowParams) {
        if let Some(v) = self.map_size {
            params.map_size = v;
        }
        if let Some(v) = self.cube_size {
            params.cube_size = v;
        }
        if let Some(v) = self.bias {
            params.bias = v;
        }
        if let Some(v) = self.normal_bias {
            params.normal_bias = v;
        }
        if let Some(v) = self.pcf_samples {
            params.pcf_samples = v;
        }
        if let Some(v) = self.enable_pcf {
            params.enable_pcf = v;
        }
        if let Some(v) = self.shadow_intensity {
            params.shadow_intensity = v;
        }
        if let Some(v) = self.ortho_size {
            params.ortho_size = v;
        }
        if let Some(v) = self.near {
            params.near = v;
        }
        if let Some(v) = self.far {
            params.far = v;
        }
    }
}
