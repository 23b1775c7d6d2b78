//! Composite stage: blends the outline mask over the lit image onto the
//! output target.

use bytemuck::{Pod, Zeroable};

use cel_core::EdgeParams;

use crate::stages::{uniform_bind_group, uniform_layout};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct CompositeUniform {
    edge_color: [f32; 4],
}

pub struct CompositeStage {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    input_layout: wgpu::BindGroupLayout,
    input_bind_group: wgpu::BindGroup,
}

impl CompositeStage {
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        lit_view: &wgpu::TextureView,
        mask_view: &wgpu::TextureView,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Composite Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/composite.wgsl").into()),
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let input_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Composite Input Layout"),
            entries: &[texture_entry(0), texture_entry(1)],
        });

        let uniform_layout_ = uniform_layout(
            device,
            "Composite Uniform Layout",
            wgpu::ShaderStages::FRAGMENT,
            false,
        );
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Composite Uniform Buffer"),
            size: std::mem::size_of::<CompositeUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = uniform_bind_group(
            device,
            "Composite Uniform Bind Group",
            &uniform_layout_,
            &uniform_buffer,
            None,
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Composite Pipeline Layout"),
            bind_group_layouts: &[&input_layout, &uniform_layout_],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Composite Pipeline"),
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
                    format: output_format,
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

        let input_bind_group = create_input_bind_group(device, &input_layout, lit_view, mask_view);

        Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            input_layout,
            input_bind_group,
        }
    }

    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        lit_view: &wgpu::TextureView,
        mask_view: &wgpu::TextureView,
    ) {
        self.input_bind_group = create_input_bind_group(device, &self.input_layout, lit_view, mask_view);
    }

    pub fn render(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        params: &EdgeParams,
    ) {
        let uniform = CompositeUniform {
            edge_color: [
                params.edge_color.x,
                params.edge_color.y,
                params.edge_color.z,
                if params.enable_outlining { 1.0 } else { 0.0 },
            ],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Composite Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
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
        pass.set_bind_group(0, &self.input_bind_group, &[]);
        pass.set_bind_group(1, &self.uniform_bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

fn create_input_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    lit_view: &wgpu::TextureView,
    mask_view: &wgpu::TextureView,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Composite Input Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(lit_view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(mask_view),
            },
        ],
    })
}
