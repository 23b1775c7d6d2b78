//! Mesh asset loading.
//!
//! Meshes are OBJ files looked up across a list of search roots. A missing
//! or unparsable file is not fatal: the slot falls back to a unit cube so
//! the scene still renders, and the failure is logged once at load time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::error::RendererError;
use crate::scene::MeshKey;
use crate::vertex::MeshVertex;

/// CPU-side mesh data.
#[derive(Debug, Clone)]
pub struct MeshCpu {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    /// Diffuse color from the OBJ's material library, if it carries one.
    pub diffuse: Option<Vec3>,
}

impl MeshCpu {
    /// Load an OBJ file, merging all its models into one mesh.
    pub fn from_obj(path: &Path) -> Result<Self, RendererError> {
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|source| RendererError::MeshLoad {
            path: path.display().to_string(),
            source,
        })?;

        let mut vertices: Vec<MeshVertex> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();

        for model in &models {
            let mesh = &model.mesh;
            let vertex_offset = vertices.len() as u32;
            let has_normals = !mesh.normals.is_empty();

            for (i, chunk) in mesh.positions.chunks(3).enumerate() {
                if chunk.len() != 3 {
                    continue;
                }
                let normal = if has_normals {
                    [
                        mesh.normals[i * 3],
                        mesh.normals[i * 3 + 1],
                        mesh.normals[i * 3 + 2],
                    ]
                } else {
                    [0.0, 0.0, 0.0]
                };
                vertices.push(MeshVertex {
                    position: [chunk[0], chunk[1], chunk[2]],
                    normal,
                });
            }

            for &idx in &mesh.indices {
                indices.push(vertex_offset + idx);
            }

            if !has_normals {
                accumulate_smooth_normals(&mut vertices, &indices[..], vertex_offset as usize);
            }
        }

        // A missing or unparsable MTL is not an error; the material slot's
        // albedo is used instead.
        let diffuse = materials.ok().and_then(|mats| {
            models
                .iter()
                .find_map(|model| model.mesh.material_id)
                .and_then(|id| mats.get(id).and_then(|mat| mat.diffuse))
                .map(Vec3::from)
        });

        Ok(Self {
            vertices,
            indices,
            diffuse,
        })
    }

    /// Axis-aligned cube used as a stand-in for missing assets.
    pub fn cube(half: f32) -> Self {
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        let faces: [(Vec3, Vec3, Vec3); 6] = [
            (Vec3::X, Vec3::Y, Vec3::Z),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::Z, Vec3::X),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::Y, Vec3::X),
        ];
        for (normal, u, v) in faces {
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let pos = (normal + u * su + v * sv) * half;
                vertices.push(MeshVertex {
                    position: pos.to_array(),
                    normal: normal.to_array(),
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self {
            vertices,
            indices,
            diffuse: None,
        }
    }
}

/// Smooth per-vertex normals from face normals, for OBJ files without `vn`.
fn accumulate_smooth_normals(vertices: &mut [MeshVertex], indices: &[u32], from_vertex: usize) {
    let mut accum: Vec<Vec3> = vec![Vec3::ZERO; vertices.len()];

    for tri in indices.chunks(3) {
        if tri.len() != 3 {
            continue;
        }
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a < from_vertex {
            continue;
        }
        let pa = Vec3::from(vertices[a].position);
        let pb = Vec3::from(vertices[b].position);
        let pc = Vec3::from(vertices[c].position);
        let face = (pb - pa).cross(pc - pa);
        accum[a] += face;
        accum[b] += face;
        accum[c] += face;
    }

    for (vertex, n) in vertices.iter_mut().zip(accum).skip(from_vertex) {
        vertex.normal = n.normalize_or_zero().to_array();
    }
}

/// Mesh uploaded to the GPU.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub vertex_count: u32,
    pub diffuse: Option<Vec3>,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, cpu: &MeshCpu, label: &str) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(&cpu.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(&cpu.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: cpu.indices.len() as u32,
            vertex_count: cpu.vertices.len() as u32,
            diffuse: cpu.diffuse,
        }
    }
}

/// All scene meshes, keyed by [`MeshKey`].
pub struct MeshLibrary {
    meshes: HashMap<MeshKey, GpuMesh>,
}

impl MeshLibrary {
    /// Load every mesh the scene can reference, substituting a cube for
    /// anything that fails to load.
    pub fn load(device: &wgpu::Device, search_roots: &[PathBuf]) -> Self {
        let fallback = MeshCpu::cube(0.5);
        let mut meshes = HashMap::with_capacity(MeshKey::ALL.len());

        for key in MeshKey::ALL {
            let cpu = match find_in_roots(search_roots, key.file_name()) {
                Some(path) => match MeshCpu::from_obj(&path) {
                    Ok(cpu) => {
                        tracing::debug!(
                            "Loaded mesh {:?}: {} vertices from {}",
                            key,
                            cpu.vertices.len(),
                            path.display()
                        );
                        cpu
                    }
                    Err(e) => {
                        tracing::warn!("Mesh {:?} failed to load, using cube: {e}", key);
                        fallback.clone()
                    }
                },
                None => {
                    tracing::warn!(
                        "Mesh file '{}' not found in any search root, using cube",
                        key.file_name()
                    );
                    fallback.clone()
                }
            };
            meshes.insert(key, GpuMesh::upload(device, &cpu, key.file_name()));
        }

        Self { meshes }
    }

    pub fn get(&self, key: MeshKey) -> &GpuMesh {
        // `load` populates every key.
        &self.meshes[&key]
    }

    /// Diffuse color carried by a mesh's material library, if any.
    pub fn diffuse(&self, key: MeshKey) -> Option<Vec3> {
        self.get(key).diffuse
    }
}

fn find_in_roots(roots: &[PathBuf], file_name: &str) -> Option<PathBuf> {
    roots
        .iter()
        .map(|root| root.join(file_name))
        .find(|candidate| candidate.is_file())
}

/// Default asset search roots relative to the working directory.
pub fn default_search_roots() -> Vec<PathBuf> {
    vec![
        PathBuf::from("assets"),
        PathBuf::from("../assets"),
        PathBuf::from("../../assets"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_is_a_closed_mesh() {
        let cube = MeshCpu::cube(0.5);
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        for v in &cube.vertices {
            let n = Vec3::from(v.normal);
            assert!((n.length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn smooth_normals_are_unit_length() {
        let mut vertices = vec![
            MeshVertex {
                position: [0.0, 0.0, 0.0],
                normal: [0.0; 3],
            },
            MeshVertex {
                position: [1.0, 0.0, 0.0],
                normal: [0.0; 3],
            },
            MeshVertex {
                position: [0.0, 1.0, 0.0],
                normal: [0.0; 3],
            },
        ];
        accumulate_smooth_normals(&mut vertices, &[0, 1, 2], 0);
        for v in &vertices {
            assert!((Vec3::from(v.normal).length() - 1.0).abs() < 1e-5);
        }
        assert!(vertices[0].normal[2] > 0.99);
    }

    #[test]
    fn missing_file_is_not_found() {
        let roots = vec![PathBuf::from("/nonexistent")];
        assert!(find_in_roots(&roots, "floor_tile.obj").is_none());
    }

    #[test]
    fn obj_material_diffuse_is_propagated() {
        let dir = std::env::temp_dir().join("cel_renderer_obj_diffuse");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("tri.mtl"), "newmtl painted\nKd 0.9 0.4 0.1\n").unwrap();
        std::fs::write(
            dir.join("tri.obj"),
            "mtllib tri.mtl\nusemtl painted\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n",
        )
        .unwrap();

        let mesh = MeshCpu::from_obj(&dir.join("tri.obj")).unwrap();
        let diffuse = mesh.diffuse.expect("MTL diffuse should be picked up");
        assert!((diffuse - Vec3::new(0.9, 0.4, 0.1)).length() < 1e-6);
    }

    #[test]
    fn fallback_cube_has_no_diffuse() {
        assert!(MeshCpu::cube(0.5).diffuse.is_none());
    }
}
