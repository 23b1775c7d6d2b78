//! Scene light model.
//!
//! Lights are a sum type: fields that only make sense for one kind of light
//! (cone angles, attenuation, position) live in the [`LightKind`] variant
//! payload, so a directional light simply has no cutoff to misconfigure.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Distance attenuation for point and spot lights.
///
/// Falloff is `1 / (constant + linear * d + quadratic * d^2)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for Attenuation {
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

/// Spot light cone, angles in degrees.
///
/// The inner angle is full brightness, the outer angle fades to zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotCone {
    pub inner_deg: f32,
    pub outer_deg: f32,
}

impl SpotCone {
    /// Create a cone, swapping the angles if they arrive inverted so the
    /// `outer >= inner` invariant holds at construction.
    pub fn new(inner_deg: f32, outer_deg: f32) -> Self {
        if outer_deg >= inner_deg {
            Self {
                inner_deg,
                outer_deg,
            }
        } else {
            Self {
                inner_deg: outer_deg,
                outer_deg: inner_deg,
            }
        }
    }
}

impl Default for SpotCone {
    fn default() -> Self {
        Self {
            inner_deg: 12.5,
            outer_deg: 15.0,
        }
    }
}

/// Per-kind light payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LightKind {
    Directional {
        direction: Vec3,
    },
    Point {
        position: Vec3,
        attenuation: Attenuation,
    },
    Spot {
        position: Vec3,
        direction: Vec3,
        attenuation: Attenuation,
        cone: SpotCone,
    },
}

/// A scene light.
///
/// `base_color` and `base_intensity` are the reference values the flicker
/// animation perturbs around; they are what the UI edits when it wants a
/// lasting change to a flickering light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub kind: LightKind,
    /// Linear RGB.
    pub color: Vec3,
    pub intensity: f32,
    pub cast_shadows: bool,
    /// Shadow-cache hint: the light's shadow map is rendered once and reused.
    pub is_static: bool,
    pub flicker: bool,
    pub base_color: Vec3,
    pub base_intensity: f32,
}

impl Light {
    /// Create a directional light (sun/moon style).
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional {
                direction: direction.normalize_or_zero(),
            },
            color,
            intensity: intensity.max(0.0),
            cast_shadows: true,
            is_static: false,
            flicker: false,
            base_color: color,
            base_intensity: intensity.max(0.0),
        }
    }

    /// Create a point light with default attenuation.
    pub fn point(position: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Point {
                position,
                attenuation: Attenuation::default(),
            },
            color,
            intensity: intensity.max(0.0),
            cast_shadows: true,
            is_static: false,
            flicker: false,
            base_color: color,
            base_intensity: intensity.max(0.0),
        }
    }

    /// Create a spot light.
    pub fn spot(
        position: Vec3,
        direction: Vec3,
        color: Vec3,
        cone: SpotCone,
        intensity: f32,
    ) -> Self {
        Self {
            kind: LightKind::Spot {
                position,
                direction: direction.normalize_or_zero(),
                attenuation: Attenuation::default(),
                cone,
            },
            color,
            intensity: intensity.max(0.0),
            cast_shadows: true,
            is_static: false,
            flicker: false,
            base_color: color,
            base_intensity: intensity.max(0.0),
        }
    }

    /// World position, if the light has one.
    pub fn position(&self) -> Option<Vec3> {
        match self.kind {
            LightKind::Directional { .. } => None,
            LightKind::Point { position, .. } | LightKind::Spot { position, .. } => Some(position),
        }
    }

    /// Emission direction, if the light has one.
    pub fn direction(&self) -> Option<Vec3> {
        match self.kind {
            LightKind::Point { .. } => None,
            LightKind::Directional { direction } | LightKind::Spot { direction, .. } => {
                Some(direction)
            }
        }
    }

    /// Set the direction on a directional or spot light; no-op for point.
    pub fn set_direction(&mut self, dir: Vec3) {
        let dir = dir.normalize_or_zero();
        match &mut self.kind {
            LightKind::Directional { direction } => *direction = dir,
            LightKind::Spot { direction, .. } => *direction = dir,
            LightKind::Point { .. } => {}
        }
    }

    /// Seed used to de-synchronize flicker between co-located lights.
    /// Directional lights fall back to the origin.
    pub fn flicker_seed(&self) -> f32 {
        let p = self.position().unwrap_or(Vec3::ZERO);
        p.x * 12.9898 + p.y * 78.233 + p.z * 43.123
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spot_cone_orders_angles() {
        let cone = SpotCone::new(30.0, 20.0);
        assert!(cone.outer_deg >= cone.inner_deg);
        assert_eq!(cone.inner_deg, 20.0);
        assert_eq!(cone.outer_deg, 30.0);
    }

    #[test]
    fn directional_has_no_position() {
        let light = Light::directional(Vec3::NEG_Y, Vec3::ONE, 1.0);
        assert!(light.position().is_none());
        assert_eq!(light.direction(), Some(Vec3::NEG_Y));
    }

    #[test]
    fn point_has_no_direction() {
        let light = Light::point(Vec3::new(1.0, 2.0, 3.0), Vec3::ONE, 1.0);
        assert!(light.direction().is_none());
        assert_eq!(light.position(), Some(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn factories_record_base_values() {
        let color = Vec3::new(1.0, 0.6, 0.2);
        let light = Light::point(Vec3::ZERO, color, 2.5);
        assert_eq!(light.base_color, color);
        assert_eq!(light.base_intensity, 2.5);
    }

    #[test]
    fn negative_intensity_is_clamped() {
        let light = Light::directional(Vec3::NEG_Y, Vec3::ONE, -3.0);
        assert_eq!(light.intensity, 0.0);
    }

    #[test]
    fn set_direction_ignores_point_lights() {
        let mut light = Light::point(Vec3::ZERO, Vec3::ONE, 1.0);
        light.set_direction(Vec3::X);
        assert!(light.direction().is_none());
    }
}
