//! Edge-detection techniques and parameters for the outlining stage.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Bitmask of enabled edge-detection techniques.
///
/// Techniques combine by taking the maximum edge response, so enabling more
/// of them can only add outlines, never remove them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeTechniques(u32);

impl EdgeTechniques {
    pub const DEPTH: EdgeTechniques = EdgeTechniques(1 << 0);
    pub const NORMAL: EdgeTechniques = EdgeTechniques(1 << 1);
    pub const SOBEL: EdgeTechniques = EdgeTechniques(1 << 2);
    pub const COLOR: EdgeTechniques = EdgeTechniques(1 << 3);
    pub const LAPLACIAN: EdgeTechniques = EdgeTechniques(1 << 4);

    pub const NONE: EdgeTechniques = EdgeTechniques(0);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn from_bits(bits: u32) -> Self {
        // Unknown bits are dropped rather than preserved.
        EdgeTechniques(bits & 0b1_1111)
    }

    pub fn contains(self, other: EdgeTechniques) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: EdgeTechniques) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: EdgeTechniques) {
        self.0 &= !other.0;
    }

    pub fn toggle(&mut self, other: EdgeTechniques) {
        self.0 ^= other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for EdgeTechniques {
    fn default() -> Self {
        EdgeTechniques::DEPTH
    }
}

/// Tunables for the edge-detection stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeParams {
    pub enable_outlining: bool,
    pub depth_threshold: f32,
    pub normal_threshold: f32,
    pub sobel_threshold: f32,
    pub color_threshold: f32,
    pub laplacian_threshold: f32,
    pub edge_width: f32,
    pub edge_color: Vec3,
    /// Exponent shaping the depth-difference response.
    pub depth_exponent: f32,
    /// Split point between the crease and silhouette normal tests.
    pub normal_split: f32,
    pub sobel_scale: f32,
    pub laplacian_scale: f32,
    /// Softness of the edge/no-edge transition.
    pub smooth_width: f32,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            enable_outlining: true,
            depth_threshold: 0.1,
            normal_threshold: 0.5,
            sobel_threshold: 0.3,
            color_threshold: 0.2,
            laplacian_threshold: 0.5,
            edge_width: 1.0,
            edge_color: Vec3::ZERO,
            depth_exponent: 1.0,
            normal_split: 0.5,
            sobel_scale: 1.0,
            laplacian_scale: 1.0,
            smooth_width: 1.0,
        }
    }
}

/// Field-granular override of [`EdgeParams`], used by the preset document.
/// Absent fields keep their current value on apply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EdgePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_outlining: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth_threshold: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal_threshold: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sobel_threshold: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_threshold: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub laplacian_threshold: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_color: Option<Vec3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth_exponent: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal_split: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sobel_scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub laplacian_scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smooth_width: Option<f32>,
}

impl EdgePatch {
    /// Snapshot every field for a full-schema save.
    pub fn capture(params: &EdgeParams) -> Self {
        Self {
            enable_outlining: Some(params.enable_outlining),
            depth_threshold: Some(params.depth_threshold),
            normal_threshold: Some(params.normal_threshold),
            sobel_threshold: Some(params.sobel_threshold),
            color_threshold: Some(params.color_threshold),
            laplacian_threshold: Some(params.laplacian_threshold),
            edge_width: Some(params.edge_width),
            edge_color: Some(params.edge_color),
            depth_exponent: Some(params.depth_exponent),
            normal_split: Some(params.normal_split),
            sobel_scale: Some(params.sobel_scale),
            laplacian_scale: Some(params.laplacian_scale),
            smooth_width: Some(params.smooth_width),
        }
    }

    /// Overwrite only the fields present in this patch.
    pub fn apply(&self, params: &mut EdgeParams) {
        if let Some(v) = self.enable_outlining {
            params.enable_outlining = v;
        }
        if let Some(v) = self.depth_threshold {
            params.depth_threshold = v;
        }
        if let Some(v) = self.normal_threshold {
            params.normal_threshold = v;
        }
        if let Some(v) = self.sobel_threshold {
            params.sobel_threshold = v;
        }
        if let Some(v) = self.color_threshold {
            params.color_threshold = v;
        }
        if let Some(v) = self.laplacian_threshold {
            params.laplacian_threshold = v;
        }
        if let Some(v) = self.edge_width {
            params.edge_width = v;
        }
        if let Some(v) = self.edge_color {
            params.edge_color = v;
        }
        if let Some(v) = self.depth_exponent {
            params.depth_exponent = v;
        }
        if let Some(v) = self.normal_split {
            params.normal_split = v;
        }
        if let Some(v) = self.sobel_scale {
            params.sobel_scale = v;
        }
        if let Some(v) = self.laplacian_scale {
            params.laplacian_scale = v;
        }
        if let Some(v) = self.smooth_width {
            params.smooth_width = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_enables_depth_only() {
        let t = EdgeTechniques::default();
        assert!(t.contains(EdgeTechniques::DEPTH));
        assert!(!t.contains(EdgeTechniques::NORMAL));
    }

    #[test]
    fn insert_remove_toggle() {
        let mut t = EdgeTechniques::NONE;
        t.insert(EdgeTechniques::SOBEL);
        t.insert(EdgeTechniques::COLOR);
        assert!(t.contains(EdgeTechniques::SOBEL));
        t.remove(EdgeTechniques::SOBEL);
        assert!(!t.contains(EdgeTechniques::SOBEL));
        t.toggle(EdgeTechniques::COLOR);
        assert!(t.is_empty());
    }

    #[test]
    fn from_bits_drops_unknown_bits() {
        let t = EdgeTechniques::from_bits(0xFF);
        assert_eq!(t.bits(), 0b1_1111);
    }
}
