//! Top-level renderer: owns the scene, lights, render stages and settings,
//! and drives a full frame through the deferred pipeline.

use std::path::PathBuf;

use cel_core::{Light, LightAnimator, LightStore, Preset, RenderSettings};

use crate::assets::{MeshLibrary, default_search_roots};
use crate::camera::Camera;
use crate::error::RendererError;
use crate::gbuffer::GBuffer;
use crate::scene::{Scene, build_scene, default_lights};
use crate::shadow::ShadowMaps;
use crate::stages::composite::CompositeStage;
use crate::stages::edge::EdgeStage;
use crate::stages::geometry::{GeometryStage, object_uniform};
use crate::stages::lighting::LightingStage;
use crate::stages::shadow::ShadowStage;
use crate::stages::{uniform_bind_group, uniform_layout};

/// Frame counters for the stats overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub vertex_count: u32,
    pub shadow_draw_calls: u32,
}

pub struct Renderer {
    pub camera: Camera,
    pub animator: LightAnimator,
    pub settings: RenderSettings,

    lights: LightStore,
    scene: Scene,
    meshes: MeshLibrary,

    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,

    gbuffer_layout: wgpu::BindGroupLayout,
    gbuffer: GBuffer,
    shadow_maps: ShadowMaps,

    geometry: GeometryStage,
    shadow: ShadowStage,
    lighting: LightingStage,
    edge: EdgeStage,
    composite: CompositeStage,

    preset_dir: PathBuf,
    stats: FrameStats,
}

impl Renderer {
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let scene = build_scene();
        let mut lights = LightStore::new();
        for light in default_lights(&scene) {
            lights.add(light);
        }
        tracing::info!(
            "Scene built: {} objects, {} lights",
            scene.objects.len(),
            lights.len()
        );

        let meshes = MeshLibrary::load(device, &default_search_roots());

        let camera = Camera::new(width as f32 / height.max(1) as f32);
        let camera_layout = uniform_layout(
            device,
            "Camera Bind Group Layout",
            wgpu::ShaderStages::VERTEX_FRAGMENT,
            false,
        );
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Uniform Buffer"),
            size: std::mem::size_of::<crate::camera::CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let camera_bind_group = uniform_bind_group(
            device,
            "Camera Bind Group",
            &camera_layout,
            &camera_buffer,
            None,
        );

        let gbuffer_layout = GBuffer::bind_group_layout(device);
        let gbuffer = GBuffer::new(device, &gbuffer_layout, width, height);
        let shadow_maps = ShadowMaps::new(device);

        let geometry = GeometryStage::new(device, &camera_layout);
        let shadow = ShadowStage::new(device, geometry.object_layout());
        let lighting = LightingStage::new(device, &camera_layout, &gbuffer_layout, width, height);
        let edge = EdgeStage::new(device, &gbuffer_layout, lighting.lit_view(), width, height);
        let composite = CompositeStage::new(
            device,
            output_format,
            lighting.lit_view(),
            edge.mask_view(),
        );

        Self {
            camera,
            animator: LightAnimator::new(),
            settings: RenderSettings::default(),
            lights,
            scene,
            meshes,
            camera_buffer,
            camera_bind_group,
            gbuffer_layout,
            gbuffer,
            shadow_maps,
            geometry,
            shadow,
            lighting,
            edge,
            composite,
            preset_dir: PathBuf::from("."),
            stats: FrameStats::default(),
        }
    }

    /// Recreate every size-dependent target.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.camera.update_aspect(width as f32 / height.max(1) as f32);
        self.gbuffer = GBuffer::new(device, &self.gbuffer_layout, width, height);
        self.lighting.resize(device, width, height);
        self.edge
            .resize(device, self.lighting.lit_view(), width, height);
        self.composite
            .resize(device, self.lighting.lit_view(), self.edge.mask_view());
    }

    /// Advance the day/night cycle and flicker animation.
    pub fn update(&mut self, dt: f32) {
        self.animator.update(dt, &mut self.lights);
    }

    // ----- lights -----

    pub fn lights(&self) -> &LightStore {
        &self.lights
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.add(light);
    }

    /// Remove a light; subsequent lights shift down one slot and their
    /// shadow maps reconcile on the next frame.
    pub fn remove_light(&mut self, index: usize) {
        self.lights.remove_at(index);
        // Shifted lights now occupy slots whose cached maps are stale.
        for slot in index..cel_core::MAX_LIGHTS {
            self.shadow_maps.invalidate(slot);
        }
    }

    /// Replace a light in place, invalidating its cached shadow map only
    /// when the light actually changed.
    pub fn update_light(&mut self, index: usize, light: Light) {
        if self.lights.update(index, light) {
            self.shadow_maps.invalidate(index);
        }
    }

    /// Re-render every cached shadow map, e.g. after editing geometry.
    pub fn invalidate_shadows(&mut self) {
        self.shadow_maps.invalidate_all();
    }

    // ----- presets -----

    /// Directory preset files are stored in.
    pub fn set_preset_dir(&mut self, dir: PathBuf) {
        self.preset_dir = dir;
    }

    /// Write the full settings state to `preset_<index>.json`.
    pub fn save_preset(&self, index: u32) -> Result<(), RendererError> {
        let path = self.preset_dir.join(Preset::file_name(index));
        Preset::capture(&self.settings).save(&path)?;
        tracing::info!("Saved preset {} to {}", index, path.display());
        Ok(())
    }

    /// Load `preset_<index>.json` and apply the fields it contains; lights
    /// are never part of the document and stay as they are. On any error
    /// the current settings are left untouched.
    pub fn load_preset(&mut self, index: u32) -> Result<(), RendererError> {
        let path = self.preset_dir.join(Preset::file_name(index));
        match Preset::load(&path) {
            Ok(preset) => {
                preset.apply(&mut self.settings);
                tracing::info!("Loaded preset {} from {}", index, path.display());
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Preset {} not applied: {e}", index);
                Err(e.into())
            }
        }
    }

    /// Restore every parameter to its default (keeping material display
    /// names) and re-seed the default scene lights.
    pub fn reset_to_defaults(&mut self) {
        self.settings.reset();
        self.lights.clear();
        for light in default_lights(&self.scene) {
            self.lights.add(light);
        }
        self.shadow_maps.invalidate_all();
        tracing::info!("Settings and lights reset to defaults");
    }

    /// Counters from the most recent frame.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Render one frame into `target`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
    ) {
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera.uniform()]),
        );

        let uniforms: Vec<_> = self
            .scene
            .objects
            .iter()
            .map(|object| {
                object_uniform(object, &self.settings, self.meshes.diffuse(object.mesh))
            })
            .collect();
        self.geometry.upload_objects(device, queue, &uniforms);

        self.shadow_maps
            .reconcile(device, &self.lights, &self.settings.shadow_params);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });

        let geometry_stats = self.geometry.render(
            &mut encoder,
            &self.gbuffer,
            &self.camera_bind_group,
            &self.meshes,
            &self.scene.objects,
        );

        let shadow_stats = self.shadow.render(
            &mut encoder,
            queue,
            &mut self.shadow_maps,
            &self.lights,
            &self.meshes,
            &self.scene.objects,
            self.geometry.object_bind_group(),
        );

        self.lighting.render(
            device,
            queue,
            &mut encoder,
            &self.gbuffer,
            &self.camera_bind_group,
            &self.lights,
            &self.shadow_maps,
            &self.settings,
        );

        let outline = self.settings.edge_params.enable_outlining
            && !self.settings.edge_techniques.is_empty();
        if outline {
            self.edge.render(
                queue,
                &mut encoder,
                &self.gbuffer,
                &self.settings.edge_params,
                self.settings.edge_techniques,
            );
        }

        // With outlining off, the stale mask is ignored via the uniform's
        // enable flag.
        self.composite
            .render(queue, &mut encoder, target, &self.settings.edge_params);

        queue.submit(std::iter::once(encoder.finish()));

        self.stats = FrameStats {
            draw_calls: geometry_stats.draw_calls + shadow_stats.draw_calls,
            vertex_count: geometry_stats.vertex_count,
            shadow_draw_calls: shadow_stats.draw_calls,
        };
    }
}
