//! Render stages, executed in order each frame:
//!
//! 1. [`geometry`] - scene meshes into the G-buffer
//! 2. [`shadow`] - depth maps for every shadow-casting light
//! 3. [`lighting`] - per-light accumulation, then toon resolve
//! 4. [`edge`] - edge mask from depth/normal/color discontinuities
//! 5. [`composite`] - lit color and outlines onto the output target

pub mod composite;
pub mod edge;
pub mod geometry;
pub mod lighting;
pub mod shadow;

/// Uniform-buffer stride for dynamically-offset bind groups. Matches the
/// 256-byte alignment required by `min_uniform_buffer_offset_alignment`
/// on all targeted backends.
pub const UNIFORM_STRIDE: u64 = 256;

/// Bind group layout with a single uniform buffer entry.
pub fn uniform_layout(
    device: &wgpu::Device,
    label: &str,
    visibility: wgpu::ShaderStages,
    has_dynamic_offset: bool,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// Bind group over a whole uniform buffer.
pub fn uniform_bind_group(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
    binding_size: Option<u64>,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer,
                offset: 0,
                size: binding_size.and_then(std::num::NonZeroU64::new),
            }),
        }],
    })
}
