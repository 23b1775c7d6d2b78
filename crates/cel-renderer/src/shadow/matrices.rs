//! Light-space view-projection matrices for shadow rendering.

use glam::{Mat4, Vec3};

use cel_core::{ShadowParams, SpotCone};

/// Up vector for a look-at, switching axes when the view direction is
/// nearly parallel to world up.
fn stable_up(dir: Vec3) -> Vec3 {
    if dir.dot(Vec3::Y).abs() > 0.99 {
        Vec3::X
    } else {
        Vec3::Y
    }
}

/// Orthographic light matrix for a directional light. The virtual eye sits
/// halfway up the far range, opposite the light direction, aimed at the
/// scene origin.
pub fn directional(dir: Vec3, params: &ShadowParams) -> Mat4 {
    let dir = dir.normalize_or_zero();
    let eye = -dir * (params.far * 0.5);
    let s = params.ortho_size;
    let proj = Mat4::orthographic_rh(-s, s, -s, s, params.near, params.far);
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, stable_up(dir));
    proj * view
}

/// Perspective light matrix for a spot light. The frustum covers the full
/// outer cone.
pub fn spot(pos: Vec3, dir: Vec3, cone: SpotCone, params: &ShadowParams) -> Mat4 {
    let dir = dir.normalize_or_zero();
    let fov_deg = (2.0 * cone.outer_deg).clamp(1.0, 179.0);
    let proj = Mat4::perspective_rh(fov_deg.to_radians(), 1.0, params.near, params.far);
    let view = Mat4::look_at_rh(pos, pos + dir, stable_up(dir));
    proj * view
}

/// Face order matches the cube texture layer order: +X, -X, +Y, -Y, +Z, -Z.
const CUBE_FACES: [(Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::new(0.0, -1.0, 0.0)),
    (Vec3::NEG_X, Vec3::new(0.0, -1.0, 0.0)),
    (Vec3::Y, Vec3::new(0.0, 0.0, 1.0)),
    (Vec3::NEG_Y, Vec3::new(0.0, 0.0, -1.0)),
    (Vec3::Z, Vec3::new(0.0, -1.0, 0.0)),
    (Vec3::NEG_Z, Vec3::new(0.0, -1.0, 0.0)),
];

/// Six 90-degree perspective matrices for a point light's cube map.
pub fn point_faces(pos: Vec3, params: &ShadowParams) -> [Mat4; 6] {
    let proj = Mat4::perspective_rh(
        90.0_f32.to_radians(),
        1.0,
        params.near,
        params.far,
    );
    CUBE_FACES.map(|(forward, up)| proj * Mat4::look_at_rh(pos, pos + forward, up))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn finite(m: Mat4) -> bool {
        m.to_cols_array().iter().all(|v| v.is_finite())
    }

    #[test]
    fn straight_down_directional_is_finite() {
        let params = ShadowParams::default();
        let m = directional(Vec3::NEG_Y, &params);
        assert!(finite(m));
    }

    #[test]
    fn directional_centers_the_origin() {
        let params = ShadowParams::default();
        let m = directional(Vec3::new(-1.0, -1.0, 0.0), &params);
        let clip = m * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-4);
        assert!(ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn spot_fov_is_clamped() {
        let params = ShadowParams::default();
        // A degenerate cone still yields a usable projection.
        let narrow = spot(
            Vec3::ZERO,
            Vec3::NEG_Y,
            SpotCone::new(0.0, 0.1),
            &params,
        );
        let wide = spot(
            Vec3::ZERO,
            Vec3::NEG_Y,
            SpotCone::new(12.5, 170.0),
            &params,
        );
        assert!(finite(narrow));
        assert!(finite(wide));
    }

    #[test]
    fn spot_sees_a_point_down_its_axis() {
        let params = ShadowParams::default();
        let pos = Vec3::new(0.0, 5.0, 0.0);
        let m = spot(pos, Vec3::NEG_Y, SpotCone::default(), &params);
        let clip = m * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn cube_faces_each_see_their_axis() {
        let params = ShadowParams::default();
        let pos = Vec3::new(1.0, 2.0, 3.0);
        let faces = point_faces(pos, &params);
        let targets = [
            Vec3::X,
            Vec3::NEG_X,
            Vec3::Y,
            Vec3::NEG_Y,
            Vec3::Z,
            Vec3::NEG_Z,
        ];
        for (m, axis) in faces.iter().zip(targets) {
            let world = pos + axis * 10.0;
            let clip = *m * world.extend(1.0);
            let ndc = clip / clip.w;
            assert!(ndc.x.abs() < 1e-3, "face for {axis:?} off center");
            assert!(ndc.y.abs() < 1e-3, "face for {axis:?} off center");
        }
    }

    #[test]
    fn cube_faces_are_distinct() {
        let params = ShadowParams::default();
        let faces = point_faces(Vec3::ZERO, &params);
        for i in 0..6 {
            for j in i + 1..6 {
                assert_ne!(faces[i], faces[j]);
            }
        }
    }
}
