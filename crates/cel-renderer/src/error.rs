//! Renderer error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("mesh load failed for '{path}': {source}")]
    MeshLoad {
        path: String,
        #[source]
        source: tobj::LoadError,
    },

    #[error("preset: {0}")]
    Preset(#[from] cel_core::PresetError),
}
