//! Lighting stage: one additive fullscreen pass per light into diffuse and
//! specular accumulation targets, then a toon resolve pass that quantizes
//! the summed result and applies albedo.
//!
//! Every light binds both a flat and a cube shadow texture; lights without
//! a shadow map get dummy views and skip the lookup in the shader. This
//! keeps a single pipeline for all light kinds.

use bytemuck::{Pod, Zeroable};

use cel_core::{Light, LightKind, LightStore, RenderSettings, ShadowParams, MAX_LIGHTS};

use crate::gbuffer::{GBUFFER_FORMAT, GBuffer, create_target};
use crate::shadow::{ShadowMaps, SlotKind};
use crate::stages::{UNIFORM_STRIDE, uniform_bind_group, uniform_layout};

/// Ambient term applied in the resolve pass.
const AMBIENT: f32 = 0.1;

/// Per-light uniform, padded to [`UNIFORM_STRIDE`]. Field packing matches
/// `LightData` in `light_accum.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightUniform {
    pub position: [f32; 4],
    pub direction: [f32; 4],
    pub color: [f32; 4],
    pub attenuation: [f32; 4],
    pub cone: [f32; 4],
    pub shadow: [f32; 4],
    pub light_matrix: [[f32; 4]; 4],
    pub _pad: [f32; 24],
}

/// Pack one light for the accumulation shader.
pub fn light_uniform(
    light: &Light,
    light_matrix: glam::Mat4,
    has_shadow: bool,
    params: &ShadowParams,
) -> LightUniform {
    let (kind, position, direction, attenuation, cone) = match light.kind {
        LightKind::Directional { direction } => {
            (0.0, glam::Vec3::ZERO, direction, None, None)
        }
        LightKind::Point {
            position,
            attenuation,
        } => (1.0, position, glam::Vec3::ZERO, Some(attenuation), None),
        LightKind::Spot {
            position,
            direction,
            attenuation,
            cone,
        } => (2.0, position, direction, Some(attenuation), Some(cone)),
    };

    let att = attenuation.unwrap_or_default();
    let (cos_inner, cos_outer) = match cone {
        Some(c) => (
            c.inner_deg.to_radians().cos(),
            c.outer_deg.to_radians().cos(),
        ),
        // No cone: falloff factor stays at 1.
        None => (1.0, -1.0),
    };

    LightUniform {
        position: [position.x, position.y, position.z, kind],
        direction: [
            direction.x,
            direction.y,
            direction.z,
            if has_shadow { 1.0 } else { 0.0 },
        ],
        color: [
            light.color.x,
            light.color.y,
            light.color.z,
            light.intensity,
        ],
        attenuation: [att.constant, att.linear, att.quadratic, params.near],
        cone: [
            cos_inner,
            cos_outer,
            params.shadow_intensity,
            if params.enable_pcf { 1.0 } else { 0.0 },
        ],
        shadow: [
            params.bias,
            params.normal_bias,
            params.pcf_samples as f32,
            params.far,
        ],
        light_matrix: light_matrix.to_cols_array_2d(),
        _pad: [0.0; 24],
    }
}

/// Toon resolve uniform; packing matches `ToonParams` in
/// `toon_resolve.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ToonUniform {
    quantize: [f32; 4],
    extra: [f32; 4],
}

pub struct LightingStage {
    accum_pipeline: wgpu::RenderPipeline,
    resolve_pipeline: wgpu::RenderPipeline,

    light_layout: wgpu::BindGroupLayout,
    light_buffer: wgpu::Buffer,

    accum_layout: wgpu::BindGroupLayout,
    toon_buffer: wgpu::Buffer,
    toon_bind_group: wgpu::BindGroup,

    diffuse: wgpu::TextureView,
    specular: wgpu::TextureView,
    accum_bind_group: wgpu::BindGroup,
    lit: wgpu::TextureView,
}

impl LightingStage {
    pub fn new(
        device: &wgpu::Device,
        camera_layout: &wgpu::BindGroupLayout,
        gbuffer_layout: &wgpu::BindGroupLayout,
        width: u32,
        height: u32,
    ) -> Self {
        let accum_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Light Accum Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/light_accum.wgsl").into()),
        });
        let resolve_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Toon Resolve Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/toon_resolve.wgsl").into()),
        });

        // Light uniform + flat shadow + cube shadow + comparison sampler.
        let light_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Light Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let light_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Light Uniform Buffer"),
            size: MAX_LIGHTS as u64 * UNIFORM_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let accum_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Accum Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let toon_layout = uniform_layout(
            device,
            "Toon Bind Group Layout",
            wgpu::ShaderStages::FRAGMENT,
            false,
        );
        let toon_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Toon Uniform Buffer"),
            size: std::mem::size_of::<ToonUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let toon_bind_group =
            uniform_bind_group(device, "Toon Bind Group", &toon_layout, &toon_buffer, None);

        let accum_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Light Accum Pipeline Layout"),
                bind_group_layouts: &[camera_layout, gbuffer_layout, &light_layout],
                push_constant_ranges: &[],
            });

        let additive = Some(wgpu::ColorTargetState {
            format: GBUFFER_FORMAT,
            blend: Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent::REPLACE,
            }),
            write_mask: wgpu::ColorWrites::ALL,
        });

        let accum_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Light Accum Pipeline"),
            layout: Some(&accum_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &accum_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &accum_shader,
                entry_point: Some("fs_main"),
                targets: &[additive.clone(), additive],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let resolve_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Toon Resolve Pipeline Layout"),
                bind_group_layouts: &[gbuffer_layout, &accum_layout, &toon_layout],
                push_constant_ranges: &[],
            });

        let resolve_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Toon Resolve Pipeline"),
            layout: Some(&resolve_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &resolve_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &resolve_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: GBUFFER_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let (diffuse, specular, accum_bind_group, lit) =
            create_targets(device, &accum_layout, width, height);

        Self {
            accum_pipeline,
            resolve_pipeline,
            light_layout,
            light_buffer,
            accum_layout,
            toon_buffer,
            toon_bind_group,
            diffuse,
            specular,
            accum_bind_group,
            lit,
        }
    }

    /// The resolved, lit scene color. Consumed by the edge and composite
    /// stages.
    pub fn lit_view(&self) -> &wgpu::TextureView {
        &self.lit
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let (diffuse, specular, accum_bind_group, lit) =
            create_targets(device, &self.accum_layout, width, height);
        self.diffuse = diffuse;
        self.specular = specular;
        self.accum_bind_group = accum_bind_group;
        self.lit = lit;
    }

    /// Accumulate every enabled light, then resolve to the lit target.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        gbuffer: &GBuffer,
        camera_bind_group: &wgpu::BindGroup,
        lights: &LightStore,
        maps: &ShadowMaps,
        settings: &RenderSettings,
    ) {
        let params = &settings.shadow_params;

        // Upload uniforms and build one bind group per contributing light.
        let mut draws: Vec<(u32, wgpu::BindGroup)> = Vec::new();
        for (index, light) in lights.iter().enumerate() {
            if light.intensity <= 0.0 {
                continue;
            }

            let slot = maps.slot(index);
            let (matrix, sample_view, has_shadow, kind) = match slot {
                Some(s) if s.state.active => (
                    s.matrix,
                    s.sample_view.as_ref(),
                    true,
                    s.state.kind.unwrap_or(SlotKind::Flat),
                ),
                _ => (glam::Mat4::IDENTITY, None, false, SlotKind::Flat),
            };

            let uniform = light_uniform(light, matrix, has_shadow, params);
            let offset = index as u64 * UNIFORM_STRIDE;
            queue.write_buffer(&self.light_buffer, offset, bytemuck::cast_slice(&[uniform]));

            let (flat_view, cube_view) = match (kind, sample_view) {
                (SlotKind::Flat, Some(view)) => (view, &maps.dummy_cube),
                (SlotKind::Cube, Some(view)) => (&maps.dummy_flat, view),
                _ => (&maps.dummy_flat, &maps.dummy_cube),
            };

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Light Bind Group"),
                layout: &self.light_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: &self.light_buffer,
                            offset: 0,
                            size: std::num::NonZeroU64::new(UNIFORM_STRIDE),
                        }),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(flat_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(cube_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::Sampler(&maps.sampler),
                    },
                ],
            });
            draws.push((offset as u32, bind_group));
        }

        let toon = ToonUniform {
            quantize: [
                if settings.global_params.enable_quantization {
                    1.0
                } else {
                    0.0
                },
                settings.global_params.diffuse_quantization_bands as f32,
                settings.global_params.specular_threshold1,
                settings.global_params.specular_threshold2,
            ],
            extra: [AMBIENT, 0.0, 0.0, 0.0],
        };
        queue.write_buffer(&self.toon_buffer, 0, bytemuck::cast_slice(&[toon]));

        // Accumulation pass.
        {
            let attach = |view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Light Accum Pass"),
                color_attachments: &[attach(&self.diffuse), attach(&self.specular)],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.accum_pipeline);
            pass.set_bind_group(0, camera_bind_group, &[]);
            pass.set_bind_group(1, &gbuffer.bind_group, &[]);
            for (offset, bind_group) in &draws {
                pass.set_bind_group(2, bind_group, &[*offset]);
                pass.draw(0..3, 0..1);
            }
        }

        // Resolve pass.
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Toon Resolve Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.lit,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.resolve_pipeline);
            pass.set_bind_group(0, &gbuffer.bind_group, &[]);
            pass.set_bind_group(1, &self.accum_bind_group, &[]);
            pass.set_bind_group(2, &self.toon_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
    }
}

fn create_targets(
    device: &wgpu::Device,
    accum_layout: &wgpu::BindGroupLayout,
    width: u32,
    height: u32,
) -> (
    wgpu::TextureView,
    wgpu::TextureView,
    wgpu::BindGroup,
    wgpu::TextureView,
) {
    let width = width.max(1);
    let height = height.max(1);
    let diffuse = create_target(device, "Accum Diffuse", width, height, GBUFFER_FORMAT);
    let specular = create_target(device, "Accum Specular", width, height, GBUFFER_FORMAT);
    let lit = create_target(device, "Lit Color", width, height, GBUFFER_FORMAT);

    let accum_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Accum Bind Group"),
        layout: accum_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&diffuse),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&specular),
            },
        ],
    });

    (diffuse, specular, accum_bind_group, lit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn uniform_stride_holds_the_struct() {
        assert_eq!(std::mem::size_of::<LightUniform>() as u64, UNIFORM_STRIDE);
    }

    #[test]
    fn directional_light_packs_kind_zero() {
        let light = Light::directional(Vec3::NEG_Y, Vec3::ONE, 1.0);
        let u = light_uniform(&light, glam::Mat4::IDENTITY, true, &ShadowParams::default());
        assert_eq!(u.position[3], 0.0);
        assert_eq!(u.direction[3], 1.0);
        assert_eq!(u.color[3], 1.0);
    }

    #[test]
    fn spot_light_packs_cone_cosines() {
        let light = Light::spot(
            Vec3::ZERO,
            Vec3::NEG_Y,
            Vec3::ONE,
            cel_core::SpotCone::default(),
            1.0,
        );
        let u = light_uniform(&light, glam::Mat4::IDENTITY, false, &ShadowParams::default());
        assert_eq!(u.position[3], 2.0);
        assert_eq!(u.direction[3], 0.0);
        // Inner cosine exceeds outer cosine for a valid cone.
        assert!(u.cone[0] > u.cone[1]);
    }

    #[test]
    fn point_light_packs_attenuation() {
        let light = Light::point(Vec3::new(1.0, 2.0, 3.0), Vec3::ONE, 2.0);
        let params = ShadowParams::default();
        let u = light_uniform(&light, glam::Mat4::IDENTITY, true, &params);
        assert_eq!(u.position[..3], [1.0, 2.0, 3.0]);
        assert_eq!(u.attenuation[0], 1.0);
        assert_eq!(u.attenuation[1], 0.09);
        assert_eq!(u.attenuation[2], 0.032);
        assert_eq!(u.attenuation[3], params.near);
        assert_eq!(u.shadow[3], params.far);
    }
}
