//! Shadow map management.
//!
//! Each of the first [`MAX_SHADOW_SLOTS`] lights owns one slot, identified
//! by its index in the light store. A slot holds either a 2D depth map
//! (directional/spot) or a six-layer cube depth map (point), reallocated
//! only when the light's kind or the configured resolution changes.
//! Static lights render their map once and reuse it until invalidated.

pub mod matrices;
pub mod slots;

pub use slots::{SlotAction, SlotKind, SlotState, MAX_SHADOW_SLOTS};

use glam::Mat4;

use cel_core::{LightKind, LightStore, ShadowParams};

/// Depth format shared by every shadow map.
pub const SHADOW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// One shadow slot: bookkeeping state plus its GPU resources.
pub struct ShadowSlot {
    pub state: SlotState,
    /// View bound for sampling in the lighting stage (D2 or Cube).
    pub sample_view: Option<wgpu::TextureView>,
    /// Views bound as depth attachments: one for flat maps, six for cubes.
    pub target_views: Vec<wgpu::TextureView>,
    /// Light-space matrix for flat maps.
    pub matrix: Mat4,
    /// Per-face matrices for cube maps.
    pub cube_matrices: [Mat4; 6],
}

impl ShadowSlot {
    fn empty() -> Self {
        Self {
            state: SlotState::default(),
            sample_view: None,
            target_views: Vec::new(),
            matrix: Mat4::IDENTITY,
            cube_matrices: [Mat4::IDENTITY; 6],
        }
    }

    fn release(&mut self) {
        self.state = SlotState::default();
        self.sample_view = None;
        self.target_views.clear();
    }
}

/// Owns all shadow slots plus the shared sampler and the dummy maps bound
/// for lights that do not cast shadows.
pub struct ShadowMaps {
    slots: Vec<ShadowSlot>,
    pub sampler: wgpu::Sampler,
    pub dummy_flat: wgpu::TextureView,
    pub dummy_cube: wgpu::TextureView,
}

impl ShadowMaps {
    pub fn new(device: &wgpu::Device) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let dummy_flat_tex = create_depth_texture(device, "Dummy Shadow Map", 1, 1);
        let dummy_flat = dummy_flat_tex.create_view(&wgpu::TextureViewDescriptor::default());

        let dummy_cube_tex = create_depth_texture(device, "Dummy Shadow Cube", 1, 6);
        let dummy_cube = dummy_cube_tex.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Dummy Shadow Cube View"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        Self {
            slots: (0..MAX_SHADOW_SLOTS).map(|_| ShadowSlot::empty()).collect(),
            sampler,
            dummy_flat,
            dummy_cube,
        }
    }

    pub fn slot(&self, index: usize) -> Option<&ShadowSlot> {
        self.slots.get(index)
    }

    /// Mark a slot's map as rendered, enabling the static-light skip.
    pub fn mark_rendered(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.state.has_rendered = true;
        }
    }

    /// Force the slot to re-render on the next frame. Called when the
    /// light or any geometry it shadows has changed.
    pub fn invalidate(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.state.has_rendered = false;
        }
    }

    /// Invalidate every slot, e.g. after a scene-wide change.
    pub fn invalidate_all(&mut self) {
        for slot in &mut self.slots {
            slot.state.has_rendered = false;
        }
    }

    /// Bring every slot in line with the current lights and parameters,
    /// then refresh the light-space matrices.
    pub fn reconcile(&mut self, device: &wgpu::Device, lights: &LightStore, params: &ShadowParams) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(light) = lights.get(index) else {
                if slot.state.active {
                    tracing::debug!("Releasing shadow slot {index} (no light)");
                    slot.release();
                }
                continue;
            };

            match slot.state.plan(light, params) {
                SlotAction::Keep => {}
                SlotAction::Release => {
                    tracing::debug!("Releasing shadow slot {index} (caster disabled)");
                    slot.release();
                }
                SlotAction::Allocate { kind, size } => {
                    tracing::debug!("Allocating {kind:?} shadow map {size}px in slot {index}");
                    allocate(device, slot, kind, size, index);
                }
            }

            if slot.state.active {
                match light.kind {
                    LightKind::Directional { direction } => {
                        slot.matrix = matrices::directional(direction, params);
                    }
                    LightKind::Spot {
                        position,
                        direction,
                        cone,
                        ..
                    } => {
                        slot.matrix = matrices::spot(position, direction, cone, params);
                    }
                    LightKind::Point { position, .. } => {
                        slot.cube_matrices = matrices::point_faces(position, params);
                    }
                }
            }
        }
    }
}

fn create_depth_texture(device: &wgpu::Device, label: &str, size: u32, layers: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: layers,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: SHADOW_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    })
}

fn allocate(device: &wgpu::Device, slot: &mut ShadowSlot, kind: SlotKind, size: u32, index: usize) {
    let layers = match kind {
        SlotKind::Flat => 1,
        SlotKind::Cube => 6,
    };
    let label = format!("Shadow Map {index}");
    let texture = create_depth_texture(device, &label, size, layers);

    let sample_view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some(&label),
        dimension: Some(match kind {
            SlotKind::Flat => wgpu::TextureViewDimension::D2,
            SlotKind::Cube => wgpu::TextureViewDimension::Cube,
        }),
        ..Default::default()
    });

    let target_views = (0..layers)
        .map(|layer| {
            texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some(&format!("{label} Layer {layer}")),
                dimension: Some(wgpu::TextureViewDimension::D2),
                base_array_layer: layer,
                array_layer_count: Some(1),
                ..Default::default()
            })
        })
        .collect();

    slot.sample_view = Some(sample_view);
    slot.target_views = target_views;
    slot.state = SlotState {
        active: true,
        kind: Some(kind),
        size,
        has_rendered: false,
    };
}
