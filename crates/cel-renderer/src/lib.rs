//! wgpu-based deferred cel-shading renderer.
//!
//! A frame runs through five stages:
//!
//! 1. **Geometry** — rasterize the scene into the G-buffer.
//! 2. **Shadow** — depth-only passes into per-light shadow maps, with
//!    cached maps for static lights.
//! 3. **Lighting** — accumulate every light additively, then quantize the
//!    summed diffuse/specular into toon bands.
//! 4. **Edge** — detect outlines from depth, normals and color.
//! 5. **Composite** — blend the outline mask over the lit image.
//!
//! [`Renderer`] owns all of it; hosts call [`Renderer::update`] and
//! [`Renderer::render`] once per frame.

pub mod assets;
pub mod camera;
pub mod error;
pub mod gbuffer;
pub mod renderer;
pub mod scene;
pub mod shadow;
pub mod stages;
pub mod vertex;

pub use camera::Camera;
pub use error::RendererError;
pub use renderer::{FrameStats, Renderer};
pub use scene::{MeshKey, Scene, SceneObject, build_scene, default_lights};
