//! Edge stage: builds a single-channel outline mask from the G-buffer and
//! the lit image.

use bytemuck::{Pod, Zeroable};

use cel_core::{EdgeParams, EdgeTechniques};

use crate::gbuffer::{GBuffer, create_target};
use crate::stages::{uniform_bind_group, uniform_layout};

pub const EDGE_MASK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R16Float;

/// Packing matches `EdgeUniform` in `edge.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct EdgeUniform {
    thresholds: [f32; 4],
    shaping: [f32; 4],
    scaling: [f32; 4],
}

fn edge_uniform(params: &EdgeParams, techniques: EdgeTechniques) -> EdgeUniform {
    EdgeUniform {
        thresholds: [
            params.depth_threshold,
            params.normal_threshold,
            params.sobel_threshold,
            params.color_threshold,
        ],
        shaping: [
            params.laplacian_threshold,
            params.depth_exponent,
            params.normal_split,
            params.smooth_width,
        ],
        scaling: [
            params.sobel_scale,
            params.laplacian_scale,
            params.edge_width,
            techniques.bits() as f32,
        ],
    }
}

pub struct EdgeStage {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    lit_layout: wgpu::BindGroupLayout,
    lit_bind_group: wgpu::BindGroup,
    mask: wgpu::TextureView,
}

impl EdgeStage {
    pub fn new(
        device: &wgpu::Device,
        gbuffer_layout: &wgpu::BindGroupLayout,
        lit_view: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Edge Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/edge.wgsl").into()),
        });

        let lit_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Edge Lit Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });

        let uniform_layout_ = uniform_layout(
            device,
            "Edge Uniform Layout",
            wgpu::ShaderStages::FRAGMENT,
            false,
        );
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Edge Uniform Buffer"),
            size: std::mem::size_of::<EdgeUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = uniform_bind_group(
            device,
            "Edge Uniform Bind Group",
            &uniform_layout_,
            &uniform_buffer,
            None,
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Edge Pipeline Layout"),
            bind_group_layouts: &[gbuffer_layout, &lit_layout, &uniform_layout_],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Edge Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: EDGE_MASK_FORMAT,
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

        let mask = create_target(device, "Edge Mask", width.max(1), height.max(1), EDGE_MASK_FORMAT);
        let lit_bind_group = create_lit_bind_group(device, &lit_layout, lit_view);

        Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            lit_layout,
            lit_bind_group,
            mask,
        }
    }

    pub fn mask_view(&self) -> &wgpu::TextureView {
        &self.mask
    }

    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        lit_view: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) {
        self.mask = create_target(device, "Edge Mask", width.max(1), height.max(1), EDGE_MASK_FORMAT);
        self.lit_bind_group = create_lit_bind_group(device, &self.lit_layout, lit_view);
    }

    pub fn render(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        gbuffer: &GBuffer,
        params: &EdgeParams,
        techniques: EdgeTechniques,
    ) {
        let uniform = edge_uniform(params, techniques);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Edge Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.mask,
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
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &gbuffer.bind_group, &[]);
        pass.set_bind_group(1, &self.lit_bind_group, &[]);
        pass.set_bind_group(2, &self.uniform_bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

fn create_lit_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    lit_view: &wgpu::TextureView,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Edge Lit Bind Group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::TextureView(lit_view),
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_packs_technique_bits() {
        let mut techniques = EdgeTechniques::NONE;
        techniques.insert(EdgeTechniques::DEPTH);
        techniques.insert(EdgeTechniques::LAPLACIAN);
        let u = edge_uniform(&EdgeParams::default(), techniques);
        assert_eq!(u.scaling[3], 17.0);
    }

    #[test]
    fn uniform_packs_default_thresholds() {
        let params = EdgeParams::default();
        let u = edge_uniform(&params, EdgeTechniques::default());
        assert_eq!(u.thresholds, [0.1, 0.5, 0.3, 0.2]);
        assert_eq!(u.shaping[0], 0.5);
        assert_eq!(u.scaling[2], 1.0);
    }
}
