//! Bounded light collection.
//!
//! Slots are positional: a light's index in the store is also its shadow
//! slot index, so `remove_at` shifts subsequent lights down. Access is
//! single-threaded; the animator and the UI are the only mutation points,
//! both outside the render stages' execution window.

use crate::light::Light;

/// Hard cap on scene lights. Operations beyond the cap are silent no-ops.
pub const MAX_LIGHTS: usize = 32;

/// Owns every light in the scene.
#[derive(Debug, Clone, Default)]
pub struct LightStore {
    lights: Vec<Light>,
}

impl LightStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a light. Silently dropped when the store is full; callers
    /// must not assume success.
    pub fn add(&mut self, light: Light) {
        if self.lights.len() < MAX_LIGHTS {
            self.lights.push(light);
        }
    }

    /// Remove the light at `index`, shifting subsequent lights down one
    /// slot. Out-of-range indices are a no-op.
    pub fn remove_at(&mut self, index: usize) {
        if index < self.lights.len() {
            self.lights.remove(index);
        }
    }

    /// Replace the light at `index` in place. Returns `true` when the slot
    /// existed and the stored value actually changed, so callers can
    /// invalidate cached shadow state for that slot. Out-of-range is a
    /// no-op returning `false`.
    pub fn update(&mut self, index: usize, light: Light) -> bool {
        match self.lights.get_mut(index) {
            Some(slot) if *slot != light => {
                *slot = light;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.lights.clear();
    }

    pub fn get(&self, index: usize) -> Option<&Light> {
        self.lights.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Light> {
        self.lights.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Light> {
        self.lights.iter()
    }

    /// Direct mutable iteration for the animator and the UI.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Light> {
        self.lights.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn torch(x: f32) -> Light {
        Light::point(Vec3::new(x, 1.9, 0.0), Vec3::new(1.0, 0.6, 0.2), 1.0)
    }

    #[test]
    fn add_beyond_capacity_is_silently_dropped() {
        let mut store = LightStore::new();
        for i in 0..MAX_LIGHTS + 5 {
            store.add(torch(i as f32));
        }
        assert_eq!(store.len(), MAX_LIGHTS);
    }

    #[test]
    fn remove_shifts_subsequent_slots() {
        let mut store = LightStore::new();
        for i in 0..4 {
            store.add(torch(i as f32));
        }
        let was_at_2 = *store.get(2).unwrap();
        store.remove_at(1);
        assert_eq!(store.len(), 3);
        assert_eq!(*store.get(1).unwrap(), was_at_2);
    }

    #[test]
    fn remove_out_of_range_is_noop() {
        let mut store = LightStore::new();
        store.add(torch(0.0));
        store.remove_at(7);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_reports_change() {
        let mut store = LightStore::new();
        store.add(torch(0.0));
        let same = *store.get(0).unwrap();
        assert!(!store.update(0, same));
        assert!(store.update(0, torch(5.0)));
        assert!(!store.update(3, torch(5.0)));
    }

    #[test]
    fn clear_empties_the_store() {
        let mut store = LightStore::new();
        store.add(torch(0.0));
        store.clear();
        assert!(store.is_empty());
    }
}
