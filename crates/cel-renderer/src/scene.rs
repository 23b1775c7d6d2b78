//! Static scene description: a two-story dungeon interior surrounded by
//! rough terrain.
//!
//! The layout is procedural but fully deterministic; variation (terrain
//! tile choice, chair jitter) comes from position-derived seeds, never
//! from an RNG, so every run produces the same scene.

use glam::{Mat4, Vec3};

use cel_core::{Light, MaterialSlot};

/// Grid spacing of the floor/ceiling tiles.
const TILE: f32 = 4.0;
/// Ground level of the lower floor.
const GROUND_Y: f32 = -1.0;
/// Ground level of the upper floor.
const UPPER_Y: f32 = 3.0;
/// Local offset from a wall origin to its torch sconce.
const TORCH_OFFSET: Vec3 = Vec3::new(0.0, 2.3, 0.4);
/// Offset from a torch sconce to its flame light.
const FLAME_OFFSET: Vec3 = Vec3::new(0.0, 0.6, 0.0);

/// Identifies one loadable mesh asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKey {
    FloorTile,
    Wall,
    WallDoorway,
    WallWindowOpen,
    WallWindowClosed,
    WallCorner,
    CeilingTile,
    WoodFloor,
    Stairs,
    Torch,
    Table,
    Chair,
    Stool,
    Barrel,
    Shelf,
    Bed,
    Chest,
    Banner,
    Candle,
    Crates,
    SwordShield,
    WoodPallet,
    WoodPlanks,
    StoneStack,
    GoldBars,
    MetalParts,
    Textiles,
    TerrainDirtLarge,
    TerrainRocky,
    TerrainTileA,
    TerrainTileB,
    TerrainTileC,
    TerrainTileD,
    TerrainWeeds,
}

impl MeshKey {
    pub const ALL: [MeshKey; 34] = [
        MeshKey::FloorTile,
        MeshKey::Wall,
        MeshKey::WallDoorway,
        MeshKey::WallWindowOpen,
        MeshKey::WallWindowClosed,
        MeshKey::WallCorner,
        MeshKey::CeilingTile,
        MeshKey::WoodFloor,
        MeshKey::Stairs,
        MeshKey::Torch,
        MeshKey::Table,
        MeshKey::Chair,
        MeshKey::Stool,
        MeshKey::Barrel,
        MeshKey::Shelf,
        MeshKey::Bed,
        MeshKey::Chest,
        MeshKey::Banner,
        MeshKey::Candle,
        MeshKey::Crates,
        MeshKey::SwordShield,
        MeshKey::WoodPallet,
        MeshKey::WoodPlanks,
        MeshKey::StoneStack,
        MeshKey::GoldBars,
        MeshKey::MetalParts,
        MeshKey::Textiles,
        MeshKey::TerrainDirtLarge,
        MeshKey::TerrainRocky,
        MeshKey::TerrainTileA,
        MeshKey::TerrainTileB,
        MeshKey::TerrainTileC,
        MeshKey::TerrainTileD,
        MeshKey::TerrainWeeds,
    ];

    /// OBJ file name looked up in the asset search roots.
    pub fn file_name(self) -> &'static str {
        match self {
            MeshKey::FloorTile => "floor_tile.obj",
            MeshKey::Wall => "wall.obj",
            MeshKey::WallDoorway => "wall_doorway.obj",
            MeshKey::WallWindowOpen => "wall_window_open.obj",
            MeshKey::WallWindowClosed => "wall_window_closed.obj",
            MeshKey::WallCorner => "wall_corner.obj",
            MeshKey::CeilingTile => "ceiling_tile.obj",
            MeshKey::WoodFloor => "wood_floor.obj",
            MeshKey::Stairs => "stairs.obj",
            MeshKey::Torch => "torch.obj",
            MeshKey::Table => "table.obj",
            MeshKey::Chair => "chair.obj",
            MeshKey::Stool => "stool.obj",
            MeshKey::Barrel => "barrel.obj",
            MeshKey::Shelf => "shelf.obj",
            MeshKey::Bed => "bed.obj",
            MeshKey::Chest => "chest.obj",
            MeshKey::Banner => "banner.obj",
            MeshKey::Candle => "candle.obj",
            MeshKey::Crates => "crates.obj",
            MeshKey::SwordShield => "sword_shield.obj",
            MeshKey::WoodPallet => "wood_pallet.obj",
            MeshKey::WoodPlanks => "wood_planks.obj",
            MeshKey::StoneStack => "stone_stack.obj",
            MeshKey::GoldBars => "gold_bars.obj",
            MeshKey::MetalParts => "metal_parts.obj",
            MeshKey::Textiles => "textiles.obj",
            MeshKey::TerrainDirtLarge => "terrain_dirt_large.obj",
            MeshKey::TerrainRocky => "terrain_rocky.obj",
            MeshKey::TerrainTileA => "terrain_tile_a.obj",
            MeshKey::TerrainTileB => "terrain_tile_b.obj",
            MeshKey::TerrainTileC => "terrain_tile_c.obj",
            MeshKey::TerrainTileD => "terrain_tile_d.obj",
            MeshKey::TerrainWeeds => "terrain_weeds.obj",
        }
    }
}

/// One placed mesh instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneObject {
    pub mesh: MeshKey,
    pub slot: MaterialSlot,
    pub transform: Mat4,
}

/// The full scene plus the torch sconce positions lights attach to.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    torch_flames: Vec<Vec3>,
}

impl Scene {
    /// World positions of every torch flame, in placement order.
    pub fn torch_flames(&self) -> &[Vec3] {
        &self.torch_flames
    }

    fn place(&mut self, mesh: MeshKey, slot: MaterialSlot, pos: Vec3, rot_deg: f32) {
        self.objects.push(SceneObject {
            mesh,
            slot,
            transform: Mat4::from_translation(pos) * Mat4::from_rotation_y(rot_deg.to_radians()),
        });
    }

    /// Place a torch on a wall at `wall_pos` / `rot_deg` and record the
    /// flame position for light attachment.
    fn place_wall_torch(&mut self, wall_pos: Vec3, rot_deg: f32) {
        let rot = Mat4::from_rotation_y(rot_deg.to_radians());
        let torch_pos = wall_pos + rot.transform_vector3(TORCH_OFFSET);
        self.place(MeshKey::Torch, MaterialSlot::Torch, torch_pos, rot_deg);
        self.torch_flames.push(torch_pos + FLAME_OFFSET);
    }

    fn place_table_with_chairs(&mut self, tx: f32, tz: f32, chair_offset: f32) {
        let table_pos = Vec3::new(tx, GROUND_Y, tz);
        self.place(MeshKey::Table, MaterialSlot::Table, table_pos, 0.0);
        self.place(
            MeshKey::Candle,
            MaterialSlot::Candle,
            table_pos + Vec3::new(0.0, 1.5, 0.0),
            0.0,
        );

        // One chair per side, facing the table, with a small deterministic
        // jitter so the arrangement does not look machine-placed.
        let sides: [(f32, f32, f32); 4] = [
            (0.0, -1.0, 0.0),
            (1.0, 0.0, 90.0),
            (0.0, 1.0, 180.0),
            (-1.0, 0.0, 270.0),
        ];
        for (dx, dz, face_deg) in sides {
            let cx = tx + dx * chair_offset;
            let cz = tz + dz * chair_offset;
            let seed = cx * 13.0 + cz * 37.0 + tx * 7.0;
            let jitter_rot = (seed.sin() * 100.0).abs() % 20.0 - 10.0;
            let jitter_x = ((seed * 0.5).cos() * 100.0).abs() % 0.2 - 0.1;
            let jitter_z = ((seed * 0.8).sin() * 100.0).abs() % 0.2 - 0.1;
            self.place(
                MeshKey::Chair,
                MaterialSlot::Chair,
                Vec3::new(cx + jitter_x, GROUND_Y, cz + jitter_z),
                face_deg + jitter_rot,
            );
        }
    }

    fn place_pallet_stack(&mut self, stack: Option<(MeshKey, MaterialSlot)>, pos: Vec3, rot: f32) {
        self.place(MeshKey::WoodPallet, MaterialSlot::WoodPallet, pos, rot);
        if let Some((mesh, slot)) = stack {
            self.place(mesh, slot, pos + Vec3::new(0.0, 0.3, 0.0), rot);
        }
    }

    fn build_floors(&mut self) {
        let start = -(5 - 1) as f32 * TILE / 2.0;
        for ix in 0..5 {
            for iz in 0..5 {
                let pos = Vec3::new(start + ix as f32 * TILE, GROUND_Y, start + iz as f32 * TILE);
                self.place(MeshKey::FloorTile, MaterialSlot::Floor, pos, 0.0);

                // The stairwell opening: no ceiling or upper floor over it.
                let open = ix == 4 && (iz == 3 || iz == 4);
                if !open {
                    self.place(
                        MeshKey::CeilingTile,
                        MaterialSlot::Ceiling,
                        Vec3::new(pos.x, UPPER_Y, pos.z),
                        0.0,
                    );
                    self.place(
                        MeshKey::WoodFloor,
                        MaterialSlot::WoodFloor,
                        Vec3::new(pos.x, UPPER_Y + 0.1, pos.z),
                        0.0,
                    );
                }

                // Roof over the upper room only.
                if ix >= 2 && (iz == 3 || iz == 4) {
                    self.place(
                        MeshKey::CeilingTile,
                        MaterialSlot::Ceiling,
                        Vec3::new(pos.x, 7.0, pos.z),
                        0.0,
                    );
                }
            }
        }

        self.place(
            MeshKey::Stairs,
            MaterialSlot::Stair,
            Vec3::new(8.0, GROUND_Y, 10.0),
            180.0,
        );
    }

    fn build_outer_walls(&mut self) {
        let xs = [-6.0, -2.0, 2.0, 6.0];

        // -Z side: doorway and a window, torch next to the door.
        for (i, &x) in xs.iter().enumerate() {
            let mesh = match i {
                2 => MeshKey::WallDoorway,
                1 => MeshKey::WallWindowOpen,
                _ => MeshKey::Wall,
            };
            let pos = Vec3::new(x, GROUND_Y, -10.0);
            self.place(mesh, MaterialSlot::Wall, pos, 0.0);
            if i == 0 {
                self.place_wall_torch(pos, 0.0);
            }
        }

        // +Z side.
        for (i, &x) in xs.iter().enumerate() {
            let mesh = match i {
                0 => MeshKey::WallWindowClosed,
                2 => MeshKey::WallWindowOpen,
                _ => MeshKey::Wall,
            };
            self.place(mesh, MaterialSlot::Wall, Vec3::new(x, GROUND_Y, 10.0), 180.0);
        }

        // -X side.
        for (i, &z) in xs.iter().enumerate() {
            let mesh = if i == 1 {
                MeshKey::WallWindowOpen
            } else {
                MeshKey::Wall
            };
            let pos = Vec3::new(-10.0, GROUND_Y, z);
            self.place(mesh, MaterialSlot::Wall, pos, 90.0);
            if i == 0 {
                self.place_wall_torch(pos, 90.0);
            }
        }

        // +X side.
        for (i, &z) in xs.iter().enumerate() {
            let mesh = if i == 2 {
                MeshKey::WallWindowClosed
            } else {
                MeshKey::Wall
            };
            let pos = Vec3::new(10.0, GROUND_Y, z);
            self.place(mesh, MaterialSlot::Wall, pos, -90.0);
            if i == 3 {
                self.place_wall_torch(pos, -90.0);
            }
        }

        for (x, z, rot) in [
            (-10.0, -10.0, 0.0),
            (10.0, -10.0, -90.0),
            (10.0, 10.0, 180.0),
            (-10.0, 10.0, 90.0),
        ] {
            self.place(
                MeshKey::WallCorner,
                MaterialSlot::Wall,
                Vec3::new(x, GROUND_Y, z),
                rot,
            );
        }
    }

    fn build_upper_room(&mut self) {
        for x in [2.0, 6.0] {
            self.place(MeshKey::Wall, MaterialSlot::Wall, Vec3::new(x, UPPER_Y, 2.0), 0.0);
        }
        for (i, x) in [2.0, 6.0].into_iter().enumerate() {
            let pos = Vec3::new(x, UPPER_Y, 10.0);
            self.place(MeshKey::Wall, MaterialSlot::Wall, pos, 180.0);
            if i == 1 {
                self.place_wall_torch(pos, 180.0);
            }
        }
        let west = Vec3::new(-2.0, UPPER_Y, 6.0);
        self.place(MeshKey::Wall, MaterialSlot::Wall, west, 90.0);
        self.place_wall_torch(west, 90.0);
        self.place(
            MeshKey::WallWindowOpen,
            MaterialSlot::Wall,
            Vec3::new(10.0, UPPER_Y, 6.0),
            -90.0,
        );

        for (x, z, rot) in [
            (-2.0, 2.0, 0.0),
            (10.0, 2.0, -90.0),
            (10.0, 10.0, 180.0),
            (-2.0, 10.0, 90.0),
        ] {
            self.place(
                MeshKey::WallCorner,
                MaterialSlot::Wall,
                Vec3::new(x, UPPER_Y, z),
                rot,
            );
        }
    }

    fn build_terrain(&mut self) {
        let mut x = -22.0_f32;
        while x < 22.0 {
            let mut z = -22.0_f32;
            while z < 22.0 {
                let interior =
                    (-10.0..10.0).contains(&x) && (-10.0..10.0).contains(&z);
                if !interior {
                    let seed = (x * 31.0 + z * 17.0) as i32;
                    let pick = seed.abs() % 100;
                    if pick < 40 {
                        self.place(
                            MeshKey::TerrainDirtLarge,
                            MaterialSlot::Dirt,
                            Vec3::new(x, GROUND_Y, z),
                            0.0,
                        );
                    } else if pick < 70 {
                        self.place(
                            MeshKey::TerrainRocky,
                            MaterialSlot::Dirt,
                            Vec3::new(x, GROUND_Y, z),
                            0.0,
                        );
                    } else {
                        // Fill the cell with four small tiles instead.
                        for sx in [0.0, 2.0] {
                            for sz in [0.0, 2.0] {
                                let sub = ((x + sx) * 53.0 + (z + sz) * 29.0) as i32;
                                let mesh = match sub.abs() % 5 {
                                    0 => MeshKey::TerrainTileA,
                                    1 => MeshKey::TerrainTileB,
                                    2 => MeshKey::TerrainTileC,
                                    3 => MeshKey::TerrainTileD,
                                    _ => MeshKey::TerrainWeeds,
                                };
                                self.place(
                                    mesh,
                                    MaterialSlot::Dirt,
                                    Vec3::new(x + sx, GROUND_Y, z + sz),
                                    0.0,
                                );
                            }
                        }
                    }
                }
                z += TILE;
            }
            x += TILE;
        }
    }

    fn build_decorations(&mut self) {
        self.place_table_with_chairs(-6.0, 4.0, 1.0);
        self.place_table_with_chairs(6.0, -3.0, 0.7);
        self.place_table_with_chairs(0.0, 5.0, 1.0);

        self.place(
            MeshKey::Barrel,
            MaterialSlot::Barrel,
            Vec3::new(-8.5, GROUND_Y, 8.5),
            0.0,
        );
        self.place(
            MeshKey::Crates,
            MaterialSlot::Crate,
            Vec3::new(8.5, GROUND_Y, -8.5),
            30.0,
        );
        self.place(
            MeshKey::Shelf,
            MaterialSlot::Shelf,
            Vec3::new(-10.0, 0.4, -2.0),
            90.0,
        );
        self.place(
            MeshKey::SwordShield,
            MaterialSlot::SwordShield,
            Vec3::new(-0.5, 1.25, 9.6),
            180.0,
        );

        // Storage corner: pallets with goods stacked on top.
        self.place_pallet_stack(
            Some((MeshKey::WoodPlanks, MaterialSlot::WoodPlanks)),
            Vec3::new(-8.5, GROUND_Y, -3.5),
            95.0,
        );
        self.place_pallet_stack(
            Some((MeshKey::StoneStack, MaterialSlot::StoneStack)),
            Vec3::new(-8.5, GROUND_Y, -5.5),
            87.0,
        );
        self.place_pallet_stack(
            Some((MeshKey::GoldBars, MaterialSlot::GoldBars)),
            Vec3::new(-3.5, GROUND_Y, -8.5),
            2.0,
        );
        self.place_pallet_stack(
            Some((MeshKey::MetalParts, MaterialSlot::MetalParts)),
            Vec3::new(-5.5, GROUND_Y, -8.5),
            -4.0,
        );
        self.place_pallet_stack(
            Some((MeshKey::Textiles, MaterialSlot::Textiles)),
            Vec3::new(-8.0, GROUND_Y, -8.0),
            45.0,
        );

        // Upstairs bedroom.
        self.place(
            MeshKey::Bed,
            MaterialSlot::Bed,
            Vec3::new(-0.1, UPPER_Y + 0.1, 4.0),
            0.0,
        );
        self.place(
            MeshKey::Chest,
            MaterialSlot::Chest,
            Vec3::new(-0.1, UPPER_Y + 0.1, 6.5),
            180.0,
        );
        self.place(
            MeshKey::Banner,
            MaterialSlot::Banner,
            Vec3::new(4.0, UPPER_Y + 0.1, 2.1),
            0.0,
        );
        self.place(
            MeshKey::Stool,
            MaterialSlot::Stool,
            Vec3::new(-0.5, UPPER_Y + 0.1, 9.0),
            0.0,
        );
    }
}

/// Build the complete scene.
pub fn build_scene() -> Scene {
    let mut scene = Scene::default();
    scene.build_floors();
    scene.build_outer_walls();
    scene.build_upper_room();
    scene.build_terrain();
    scene.build_decorations();

    // Freestanding torch by the west window.
    let extra = Vec3::new(-9.6, 1.3, 6.0);
    scene
        .objects
        .push(SceneObject {
            mesh: MeshKey::Torch,
            slot: MaterialSlot::Torch,
            transform: Mat4::from_translation(extra)
                * Mat4::from_rotation_y(90.0_f32.to_radians()),
        });
    scene.torch_flames.push(extra + FLAME_OFFSET);

    scene
}

/// Default lights: sun in slot 0, moon in slot 1, then a flickering point
/// light per torch flame.
pub fn default_lights(scene: &Scene) -> Vec<Light> {
    let mut lights = Vec::with_capacity(2 + scene.torch_flames().len());

    lights.push(Light::directional(
        Vec3::new(0.0, -1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.984),
        1.0,
    ));
    let mut moon = Light::directional(
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.839, 0.863, 0.890),
        1.0,
    );
    moon.intensity = 0.0;
    lights.push(moon);

    for &flame in scene.torch_flames() {
        let mut torch = Light::point(flame, Vec3::new(1.0, 0.6, 0.2), 1.0);
        torch.is_static = true;
        torch.flicker = true;
        lights.push(torch);
    }

    lights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_is_deterministic() {
        let a = build_scene();
        let b = build_scene();
        assert_eq!(a.objects.len(), b.objects.len());
        assert_eq!(a.objects, b.objects);
        assert_eq!(a.torch_flames(), b.torch_flames());
    }

    #[test]
    fn scene_has_six_torches() {
        let scene = build_scene();
        assert_eq!(scene.torch_flames().len(), 6);
        let torch_meshes = scene
            .objects
            .iter()
            .filter(|o| o.mesh == MeshKey::Torch)
            .count();
        assert_eq!(torch_meshes, 6);
    }

    #[test]
    fn torch_flames_match_expected_positions() {
        let scene = build_scene();
        let expected = [
            Vec3::new(-6.0, 1.9, -9.6),
            Vec3::new(-9.6, 1.9, -6.0),
            Vec3::new(9.6, 1.9, 6.0),
            Vec3::new(6.0, 5.9, 9.6),
            Vec3::new(-1.6, 5.9, 6.0),
            Vec3::new(-9.6, 1.9, 6.0),
        ];
        for target in expected {
            assert!(
                scene
                    .torch_flames()
                    .iter()
                    .any(|f| (*f - target).length() < 1e-3),
                "missing flame at {target:?}"
            );
        }
    }

    #[test]
    fn terrain_stays_outside_the_building() {
        let scene = build_scene();
        for obj in scene.objects.iter().filter(|o| o.slot == MaterialSlot::Dirt) {
            let p = obj.transform.transform_point3(Vec3::ZERO);
            // Cells with both coordinates inside the footprint are skipped;
            // sub-tiles reach at most 2 units past their cell origin.
            assert!(
                p.x <= -12.0 + 1e-3 || p.x >= 10.0 - 1e-3 || p.z <= -12.0 + 1e-3 || p.z >= 10.0 - 1e-3,
                "terrain inside footprint at {p:?}"
            );
        }
    }

    #[test]
    fn default_lights_start_with_sun_and_moon() {
        let scene = build_scene();
        let lights = default_lights(&scene);
        assert_eq!(lights.len(), 8);
        assert!(lights[0].position().is_none());
        assert!(lights[1].position().is_none());
        assert_eq!(lights[1].intensity, 0.0);
        for torch in &lights[2..] {
            assert!(torch.flicker);
            assert!(torch.is_static);
        }
    }

    #[test]
    fn every_mesh_key_has_a_distinct_file() {
        let mut names: Vec<_> = MeshKey::ALL.iter().map(|k| k.file_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), MeshKey::ALL.len());
    }
}
