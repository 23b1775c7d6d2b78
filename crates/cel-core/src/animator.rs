//! Day/night cycle and torch flicker.
//!
//! The sun and moon each orbit through a tilted arc over a window of the
//! normalized day. Windows overlap around dusk so both bodies are briefly
//! lit at the handover. Flicker perturbs a light's intensity and color
//! around its recorded base values, so toggling flicker off restores the
//! light exactly.

use glam::Vec3;

use crate::light::{Light, LightKind};
use crate::store::LightStore;

/// Fraction of the day cycle advanced per second at speed 1.0.
const CYCLE_SPEED: f32 = 0.01;

/// Tilt of the orbital plane, radians.
const ORBIT_TILT: f32 = std::f32::consts::FRAC_PI_4;

/// Window of the normalized day during which a celestial body is above
/// the horizon, plus its peak intensity.
#[derive(Debug, Clone, Copy)]
struct CelestialWindow {
    start: f32,
    end: f32,
    max_intensity: f32,
}

const SUN_WINDOW: CelestialWindow = CelestialWindow {
    start: 0.0,
    end: 0.55,
    max_intensity: 1.0,
};

const MOON_WINDOW: CelestialWindow = CelestialWindow {
    start: 0.50,
    end: 1.05,
    max_intensity: 0.5,
};

/// Computed state for one celestial body at a given time of day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CelestialState {
    /// Direction the light shines, i.e. from the body toward the scene.
    pub direction: Vec3,
    pub intensity: f32,
    pub cast_shadows: bool,
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn celestial_state(window: CelestialWindow, time_of_day: f32) -> CelestialState {
    let mut relative = time_of_day - window.start;
    if relative < 0.0 {
        relative += 1.0;
    }
    let window_size = window.end - window.start;

    if relative <= window_size {
        let angle = (relative / window_size) * std::f32::consts::PI;
        let orbit_y = angle.sin();
        let orbit_x = angle.cos();
        let world = Vec3::new(
            orbit_x,
            orbit_y * ORBIT_TILT.cos(),
            orbit_y * ORBIT_TILT.sin(),
        );
        // Fade in/out near the horizon instead of popping.
        let intensity = window.max_intensity * smoothstep(0.0, 0.2, world.y);
        CelestialState {
            direction: (-world).normalize_or_zero(),
            intensity,
            cast_shadows: intensity > 0.001,
        }
    } else {
        CelestialState {
            direction: Vec3::new(-1.0, 0.0, 0.0).normalize(),
            intensity: 0.0,
            cast_shadows: false,
        }
    }
}

/// Flicker noise in roughly [-1, 1]: three incommensurate sines so the
/// pattern does not visibly repeat.
fn flicker_noise(t: f32) -> f32 {
    ((3.0 * t).sin() + (5.3 * t + 1.2).sin() + (7.7 * t + 3.5).sin()) * 0.33
}

fn apply_flicker(light: &mut Light, total_time: f32) {
    // Phase-shift by the position-derived seed so co-located torches
    // do not pulse in lockstep.
    let seed = light.flicker_seed();
    let t = total_time + (seed as i32 % 100) as f32 / 10.0;
    let noise = flicker_noise(t);
    light.intensity = (light.base_intensity * (1.0 + 0.08 * noise)).max(0.0);
    light.color = (light.base_color + Vec3::new(0.03 * noise, 0.01 * noise, 0.0))
        .clamp(Vec3::ZERO, Vec3::ONE);
}

/// Drives the sun, the moon, and every flickering light.
///
/// Slot 0 is the sun and slot 1 is the moon; the scene seeds them there
/// and the animator leaves other slots' direction state alone.
#[derive(Debug, Clone)]
pub struct LightAnimator {
    pub cycle_enabled: bool,
    /// Multiplier on the base cycle speed.
    pub speed: f32,
    time_of_day: f32,
    total_time: f32,
}

impl Default for LightAnimator {
    fn default() -> Self {
        Self {
            cycle_enabled: true,
            speed: 1.0,
            time_of_day: 0.25,
            total_time: 0.0,
        }
    }
}

impl LightAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalized time of day in [0, 1). 0.25 is solar noon.
    pub fn time_of_day(&self) -> f32 {
        self.time_of_day
    }

    /// Jump to a specific time of day; the fractional part is used.
    pub fn set_time_of_day(&mut self, t: f32) {
        self.time_of_day = t.rem_euclid(1.0);
    }

    pub fn sun_state(&self) -> CelestialState {
        celestial_state(SUN_WINDOW, self.time_of_day)
    }

    pub fn moon_state(&self) -> CelestialState {
        celestial_state(MOON_WINDOW, self.time_of_day)
    }

    /// Advance time and write the animated state into the store.
    pub fn update(&mut self, dt: f32, lights: &mut LightStore) {
        self.total_time += dt;
        if self.cycle_enabled {
            self.time_of_day = (self.time_of_day + dt * CYCLE_SPEED * self.speed).rem_euclid(1.0);
        }

        for (index, state) in [(0, self.sun_state()), (1, self.moon_state())] {
            if let Some(light) = lights.get_mut(index) {
                if matches!(light.kind, LightKind::Directional { .. }) {
                    light.set_direction(state.direction);
                    light.intensity = state.intensity * light.base_intensity;
                    light.cast_shadows = state.cast_shadows;
                }
            }
        }

        for light in lights.iter_mut() {
            if light.flicker {
                apply_flicker(light, self.total_time);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sun_peaks_at_noon() {
        let state = celestial_state(SUN_WINDOW, 0.275);
        assert!(state.intensity > 0.99);
        assert!(state.cast_shadows);
        // At the top of the arc the light shines downward.
        assert!(state.direction.y < -0.5);
    }

    #[test]
    fn sun_is_dark_at_night() {
        let state = celestial_state(SUN_WINDOW, 0.8);
        assert_eq!(state.intensity, 0.0);
        assert!(!state.cast_shadows);
    }

    #[test]
    fn moon_window_wraps_past_midnight() {
        // 0.02 is inside the moon's [0.50, 1.05] window via wraparound.
        let state = celestial_state(MOON_WINDOW, 0.02);
        assert!(state.intensity > 0.0);
    }

    #[test]
    fn dusk_overlap_lights_both_bodies() {
        let t = 0.52;
        let sun = celestial_state(SUN_WINDOW, t);
        let moon = celestial_state(MOON_WINDOW, t);
        assert!(sun.intensity > 0.0);
        assert!(moon.intensity > 0.0);
    }

    #[test]
    fn moon_never_exceeds_half_intensity() {
        for i in 0..100 {
            let state = celestial_state(MOON_WINDOW, i as f32 / 100.0);
            assert!(state.intensity <= 0.5 + 1e-6);
        }
    }

    #[test]
    fn horizon_intensity_fades_smoothly() {
        // Just past sunrise the sun is dim but nonzero.
        let early = celestial_state(SUN_WINDOW, 0.01);
        let noon = celestial_state(SUN_WINDOW, 0.275);
        assert!(early.intensity > 0.0);
        assert!(early.intensity < noon.intensity);
    }

    #[test]
    fn flicker_stays_within_bounds() {
        let mut light = Light::point(Vec3::new(2.0, 1.0, -3.0), Vec3::new(1.0, 0.6, 0.2), 1.0);
        light.flicker = true;
        for i in 0..1000 {
            apply_flicker(&mut light, i as f32 * 0.016);
            assert!(light.intensity >= 1.0 * (1.0 - 0.08) - 1e-4);
            assert!(light.intensity <= 1.0 * (1.0 + 0.08) + 1e-4);
            assert!(light.color.max_element() <= 1.0);
            assert!(light.color.min_element() >= 0.0);
        }
    }

    #[test]
    fn flicker_is_deterministic() {
        let mut a = Light::point(Vec3::new(1.0, 2.0, 3.0), Vec3::ONE, 1.0);
        let mut b = a;
        apply_flicker(&mut a, 12.5);
        apply_flicker(&mut b, 12.5);
        assert_eq!(a.intensity, b.intensity);
        assert_eq!(a.color, b.color);
    }

    #[test]
    fn flicker_phase_differs_by_position() {
        let mut a = Light::point(Vec3::new(-6.0, 1.9, -9.6), Vec3::ONE, 1.0);
        let mut b = Light::point(Vec3::new(9.6, 1.9, 6.0), Vec3::ONE, 1.0);
        apply_flicker(&mut a, 10.0);
        apply_flicker(&mut b, 10.0);
        assert!(a.intensity != b.intensity);
    }

    #[test]
    fn update_drives_celestial_slots() {
        let mut lights = LightStore::new();
        lights.add(Light::directional(
            Vec3::NEG_Y,
            Vec3::new(1.0, 1.0, 0.984),
            1.0,
        ));
        lights.add(Light::directional(
            Vec3::Y,
            Vec3::new(0.839, 0.863, 0.890),
            1.0,
        ));

        let mut animator = LightAnimator::new();
        animator.cycle_enabled = false;
        animator.set_time_of_day(0.275);
        animator.update(0.016, &mut lights);

        let sun = lights.get(0).unwrap();
        assert!(sun.intensity > 0.99);
        let moon = lights.get(1).unwrap();
        assert_eq!(moon.intensity, 0.0);
        assert!(!moon.cast_shadows);
    }

    #[test]
    fn update_leaves_non_flickering_point_lights_alone() {
        let mut lights = LightStore::new();
        lights.add(Light::directional(Vec3::NEG_Y, Vec3::ONE, 1.0));
        lights.add(Light::directional(Vec3::Y, Vec3::ONE, 1.0));
        lights.add(Light::point(Vec3::ZERO, Vec3::ONE, 2.0));

        let mut animator = LightAnimator::new();
        animator.update(0.016, &mut lights);
        assert_eq!(lights.get(2).unwrap().intensity, 2.0);
    }
}
