//! Geometry stage: draws every scene object into the G-buffer.
//!
//! Per-object data lives in one dynamically-offset uniform buffer that is
//! rewritten each frame, so material edits and the global model override
//! take effect without any bind-group churn. The shadow stage reuses the
//! same buffer for its model matrices.

use bytemuck::{Pod, Zeroable};

use cel_core::RenderSettings;

use crate::assets::MeshLibrary;
use crate::gbuffer::{DEPTH_FORMAT, GBUFFER_FORMAT, GBuffer};
use crate::scene::SceneObject;
use crate::stages::{UNIFORM_STRIDE, uniform_bind_group, uniform_layout};
use crate::vertex::MeshVertex;

/// Per-object uniform, padded to [`UNIFORM_STRIDE`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    /// rgb = albedo, a = illumination model id.
    pub albedo_model: [f32; 4],
    /// x = primary param, y = secondary param, z = shininess,
    /// w = intensity correction.
    pub surface: [f32; 4],
    pub _pad: [f32; 40],
}

/// Resolve a scene object's material through the settings, honoring the
/// global model override. A diffuse color from the mesh's own material
/// library takes precedence over the slot albedo, mirroring how textured
/// assets override the configured base color.
pub fn object_uniform(
    object: &SceneObject,
    settings: &RenderSettings,
    mesh_diffuse: Option<glam::Vec3>,
) -> ObjectUniform {
    let material = settings.materials.get(object.slot);
    let model = if settings.use_global_model {
        settings.global_model
    } else {
        material.model
    };
    let params = &material.params;
    let albedo = mesh_diffuse.unwrap_or(params.albedo);

    ObjectUniform {
        model: object.transform.to_cols_array_2d(),
        albedo_model: [albedo.x, albedo.y, albedo.z, model.gpu_id() as f32],
        surface: [
            params.primary_param(model),
            params.secondary_param(model),
            params.specular_shininess,
            params.intensity_correction,
        ],
        _pad: [0.0; 40],
    }
}

/// Counters reported per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub draw_calls: u32,
    pub vertex_count: u32,
}

pub struct GeometryStage {
    pipeline: wgpu::RenderPipeline,
    object_layout: wgpu::BindGroupLayout,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    capacity: usize,
}

impl GeometryStage {
    pub fn new(device: &wgpu::Device, camera_layout: &wgpu::BindGroupLayout) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Geometry Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/geometry.wgsl").into()),
        });

        let object_layout = uniform_layout(
            device,
            "Object Bind Group Layout",
            wgpu::ShaderStages::VERTEX_FRAGMENT,
            true,
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Geometry Pipeline Layout"),
            bind_group_layouts: &[camera_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let color_target = |format| {
            Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Geometry Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[MeshVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[
                    color_target(GBUFFER_FORMAT),
                    color_target(GBUFFER_FORMAT),
                    color_target(GBUFFER_FORMAT),
                    color_target(GBUFFER_FORMAT),
                ],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let capacity = 16;
        let (object_buffer, object_bind_group) =
            create_object_buffer(device, &object_layout, capacity);

        Self {
            pipeline,
            object_layout,
            object_buffer,
            object_bind_group,
            capacity,
        }
    }

    /// Bind group over the per-object uniforms, shared with the shadow
    /// stage (group 1, one dynamic offset).
    pub fn object_bind_group(&self) -> &wgpu::BindGroup {
        &self.object_bind_group
    }

    pub fn object_layout(&self) -> &wgpu::BindGroupLayout {
        &self.object_layout
    }

    /// Upload this frame's object uniforms, growing the buffer if needed.
    pub fn upload_objects(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        uniforms: &[ObjectUniform],
    ) {
        if uniforms.len() > self.capacity {
            self.capacity = uniforms.len().next_power_of_two();
            let (buffer, bind_group) = create_object_buffer(device, &self.object_layout, self.capacity);
            self.object_buffer = buffer;
            self.object_bind_group = bind_group;
        }
        queue.write_buffer(&self.object_buffer, 0, bytemuck::cast_slice(uniforms));
    }

    /// Record the G-buffer pass. `objects[i]` uses uniform slot `i`.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        gbuffer: &GBuffer,
        camera_bind_group: &wgpu::BindGroup,
        meshes: &MeshLibrary,
        objects: &[SceneObject],
    ) -> DrawStats {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Geometry Pass"),
            color_attachments: &gbuffer.color_attachments(),
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &gbuffer.depth,
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
        pass.set_bind_group(0, camera_bind_group, &[]);

        let mut stats = DrawStats::default();
        for (i, object) in objects.iter().enumerate() {
            let mesh = meshes.get(object.mesh);
            let offset = (i as u64 * UNIFORM_STRIDE) as u32;
            pass.set_bind_group(1, &self.object_bind_group, &[offset]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            stats.draw_calls += 1;
            stats.vertex_count += mesh.vertex_count;
        }
        stats
    }
}

fn create_object_buffer(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    capacity: usize,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Object Uniform Buffer"),
        size: capacity as u64 * UNIFORM_STRIDE,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = uniform_bind_group(
        device,
        "Object Bind Group",
        layout,
        &buffer,
        Some(UNIFORM_STRIDE),
    );
    (buffer, bind_group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cel_core::{IlluminationModel, MaterialSlot};
    use glam::Mat4;

    fn object(slot: MaterialSlot) -> SceneObject {
        SceneObject {
            mesh: crate::scene::MeshKey::Barrel,
            slot,
            transform: Mat4::IDENTITY,
        }
    }

    #[test]
    fn uniform_stride_holds_the_struct() {
        assert!(std::mem::size_of::<ObjectUniform>() as u64 == UNIFORM_STRIDE);
    }

    #[test]
    fn global_override_replaces_slot_model() {
        let mut settings = RenderSettings::default();
        settings
            .materials
            .get_mut(MaterialSlot::Barrel)
            .model = IlluminationModel::CookTorrance;

        let per_slot = object_uniform(&object(MaterialSlot::Barrel), &settings, None);
        assert_eq!(
            per_slot.albedo_model[3],
            IlluminationModel::CookTorrance.gpu_id() as f32
        );

        settings.use_global_model = true;
        settings.global_model = IlluminationModel::Minnaert;
        let overridden = object_uniform(&object(MaterialSlot::Barrel), &settings, None);
        assert_eq!(
            overridden.albedo_model[3],
            IlluminationModel::Minnaert.gpu_id() as f32
        );
        // The override switches the packed parameters too.
        assert_eq!(
            overridden.surface[0],
            settings
                .materials
                .get(MaterialSlot::Barrel)
                .params
                .minnaert_k
        );
    }

    #[test]
    fn mesh_diffuse_overrides_slot_albedo() {
        let settings = RenderSettings::default();
        let slot_albedo = settings.materials.get(MaterialSlot::Barrel).params.albedo;

        let plain = object_uniform(&object(MaterialSlot::Barrel), &settings, None);
        assert_eq!(plain.albedo_model[..3], slot_albedo.to_array());

        let tinted = object_uniform(
            &object(MaterialSlot::Barrel),
            &settings,
            Some(glam::Vec3::new(0.9, 0.4, 0.1)),
        );
        assert_eq!(tinted.albedo_model[..3], [0.9, 0.4, 0.1]);
    }
}
