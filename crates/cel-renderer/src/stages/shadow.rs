//! Shadow stage: depth-only passes filling each light's shadow map.
//!
//! Flat maps take one pass; cube maps take six, one per face. Static
//! lights whose map is already rendered are skipped entirely.

use cel_core::LightStore;

use crate::assets::MeshLibrary;
use crate::scene::SceneObject;
use crate::shadow::{MAX_SHADOW_SLOTS, SHADOW_FORMAT, ShadowMaps};
use crate::stages::geometry::DrawStats;
use crate::stages::{UNIFORM_STRIDE, uniform_bind_group, uniform_layout};
use crate::vertex::MeshVertex;

/// One matrix slot per potential cube face across all shadow slots.
const MATRIX_SLOTS: u64 = (MAX_SHADOW_SLOTS * 6) as u64;

pub struct ShadowStage {
    pipeline: wgpu::RenderPipeline,
    matrix_buffer: wgpu::Buffer,
    matrix_bind_group: wgpu::BindGroup,
}

impl ShadowStage {
    pub fn new(device: &wgpu::Device, object_layout: &wgpu::BindGroupLayout) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shadow Depth Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/shadow_depth.wgsl").into()),
        });

        let matrix_layout = uniform_layout(
            device,
            "Shadow Matrix Bind Group Layout",
            wgpu::ShaderStages::VERTEX,
            true,
        );

        let matrix_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Shadow Matrix Buffer"),
            size: MATRIX_SLOTS * UNIFORM_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let matrix_bind_group = uniform_bind_group(
            device,
            "Shadow Matrix Bind Group",
            &matrix_layout,
            &matrix_buffer,
            Some(UNIFORM_STRIDE),
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[&matrix_layout, object_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[MeshVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Front-face culling trades peter-panning for thicker
                // contact shadows, which the bias settings absorb.
                cull_mode: Some(wgpu::Face::Front),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: SHADOW_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            matrix_buffer,
            matrix_bind_group,
        }
    }

    /// Render every shadow map that needs it this frame.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        maps: &mut ShadowMaps,
        lights: &LightStore,
        meshes: &MeshLibrary,
        objects: &[SceneObject],
        object_bind_group: &wgpu::BindGroup,
    ) -> DrawStats {
        let mut stats = DrawStats::default();
        let mut rendered = Vec::new();

        for index in 0..MAX_SHADOW_SLOTS {
            let Some(light) = lights.get(index) else {
                continue;
            };
            let Some(slot) = maps.slot(index) else {
                continue;
            };
            if !slot.state.needs_render(light) {
                continue;
            }

            for (face, view) in slot.target_views.iter().enumerate() {
                let matrix = if slot.target_views.len() == 6 {
                    slot.cube_matrices[face]
                } else {
                    slot.matrix
                };
                let offset = (index * 6 + face) as u64 * UNIFORM_STRIDE;
                queue.write_buffer(
                    &self.matrix_buffer,
                    offset,
                    bytemuck::cast_slice(&[matrix.to_cols_array_2d()]),
                );

                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Shadow Pass"),
                    color_attachments: &[],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });

                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.matrix_bind_group, &[offset as u32]);
                for (i, object) in objects.iter().enumerate() {
                    let mesh = meshes.get(object.mesh);
                    let object_offset = (i as u64 * UNIFORM_STRIDE) as u32;
                    pass.set_bind_group(1, object_bind_group, &[object_offset]);
                    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                    stats.draw_calls += 1;
                    stats.vertex_count += mesh.vertex_count;
                }
            }

            rendered.push(index);
        }

        for index in rendered {
            maps.mark_rendered(index);
        }
        stats
    }
}
