//! Shadow slot bookkeeping, kept free of GPU types so the reconciliation
//! rules are unit-testable.

use cel_core::{Light, LightKind, ShadowParams};

/// Number of shadow map slots; lights beyond this render unshadowed.
pub const MAX_SHADOW_SLOTS: usize = 8;

/// What kind of map a slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// Single 2D depth map (directional and spot lights).
    Flat,
    /// Six-face cube depth map (point lights).
    Cube,
}

impl SlotKind {
    pub fn for_light(light: &Light) -> Self {
        match light.kind {
            LightKind::Point { .. } => SlotKind::Cube,
            _ => SlotKind::Flat,
        }
    }
}

/// CPU-side state of one shadow slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotState {
    pub active: bool,
    pub kind: Option<SlotKind>,
    pub size: u32,
    /// Set after the slot's map has been rendered at least once; static
    /// lights skip re-rendering while this holds.
    pub has_rendered: bool,
}

/// Decision for one slot during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAction {
    /// Slot already matches the light; keep the existing map.
    Keep,
    /// (Re)allocate a map of this kind and size.
    Allocate { kind: SlotKind, size: u32 },
    /// Free the slot's map.
    Release,
}

impl SlotState {
    /// Decide what must happen to this slot for `light` under `params`.
    pub fn plan(&self, light: &Light, params: &ShadowParams) -> SlotAction {
        if !light.cast_shadows {
            return if self.active {
                SlotAction::Release
            } else {
                SlotAction::Keep
            };
        }

        let kind = SlotKind::for_light(light);
        let size = match kind {
            SlotKind::Cube => params.cube_size,
            SlotKind::Flat => params.map_size,
        };

        if !self.active || self.kind != Some(kind) || self.size != size {
            SlotAction::Allocate { kind, size }
        } else {
            SlotAction::Keep
        }
    }

    /// Whether the slot's map must be (re)drawn this frame.
    pub fn needs_render(&self, light: &Light) -> bool {
        self.active && !(light.is_static && self.has_rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn point() -> Light {
        Light::point(Vec3::new(1.0, 2.0, 3.0), Vec3::ONE, 1.0)
    }

    fn directional() -> Light {
        Light::directional(Vec3::NEG_Y, Vec3::ONE, 1.0)
    }

    #[test]
    fn fresh_slot_allocates() {
        let state = SlotState::default();
        let params = ShadowParams::default();
        assert_eq!(
            state.plan(&directional(), &params),
            SlotAction::Allocate {
                kind: SlotKind::Flat,
                size: params.map_size
            }
        );
        assert_eq!(
            state.plan(&point(), &params),
            SlotAction::Allocate {
                kind: SlotKind::Cube,
                size: params.cube_size
            }
        );
    }

    #[test]
    fn matching_slot_is_kept() {
        let params = ShadowParams::default();
        let state = SlotState {
            active: true,
            kind: Some(SlotKind::Flat),
            size: params.map_size,
            has_rendered: true,
        };
        assert_eq!(state.plan(&directional(), &params), SlotAction::Keep);
    }

    #[test]
    fn kind_change_reallocates() {
        let params = ShadowParams::default();
        let state = SlotState {
            active: true,
            kind: Some(SlotKind::Flat),
            size: params.map_size,
            has_rendered: true,
        };
        assert!(matches!(
            state.plan(&point(), &params),
            SlotAction::Allocate {
                kind: SlotKind::Cube,
                ..
            }
        ));
    }

    #[test]
    fn resolution_change_reallocates() {
        let state = SlotState {
            active: true,
            kind: Some(SlotKind::Flat),
            size: 2048,
            has_rendered: true,
        };
        let params = ShadowParams {
            map_size: 4096,
            ..Default::default()
        };
        assert_eq!(
            state.plan(&directional(), &params),
            SlotAction::Allocate {
                kind: SlotKind::Flat,
                size: 4096
            }
        );
    }

    #[test]
    fn non_caster_releases_active_slot() {
        let params = ShadowParams::default();
        let state = SlotState {
            active: true,
            kind: Some(SlotKind::Cube),
            size: params.cube_size,
            has_rendered: true,
        };
        let mut light = point();
        light.cast_shadows = false;
        assert_eq!(state.plan(&light, &params), SlotAction::Release);
        // Inactive slot stays untouched.
        assert_eq!(
            SlotState::default().plan(&light, &params),
            SlotAction::Keep
        );
    }

    #[test]
    fn static_light_renders_once() {
        let mut light = point();
        light.is_static = true;
        let mut state = SlotState {
            active: true,
            kind: Some(SlotKind::Cube),
            size: 1024,
            has_rendered: false,
        };
        assert!(state.needs_render(&light));
        state.has_rendered = true;
        assert!(!state.needs_render(&light));

        // Dynamic lights re-render every frame.
        light.is_static = false;
        assert!(state.needs_render(&light));
    }
}
