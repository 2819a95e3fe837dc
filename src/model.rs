use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use id_arena::{Arena, Id};

use crate::math::Aabb;

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to import {path}: {source}")]
    Import {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
    #[error("{0} contains no scenes")]
    NoScene(PathBuf),
    #[error("unsupported primitive mode {mode:?} in {path}")]
    UnsupportedMode {
        path: PathBuf,
        mode: gltf::mesh::Mode,
    },
    #[error("primitive without positions in {0}")]
    MissingPositions(PathBuf),
    #[error("{0} has no geometry")]
    Empty(PathBuf),
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub color: [f32; 4],
}

/// Invisible box used for overlap tests and picking. Never rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl Collider {
    pub fn from_bounds(bounds: &Aabb) -> Self {
        Self {
            center: bounds.center(),
            half_extents: bounds.half_extents(),
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_half_extents(self.center, self.half_extents)
    }
}

/// Flattened triangle mesh of a whole asset, in asset space.
#[derive(Debug)]
pub struct Model {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub bounds: Aabb,
}

pub type ModelId = Id<Model>;

impl Model {
    pub fn load(path: &Path) -> Result<Model, ModelError> {
        let (document, buffers, _images) =
            gltf::import(path).map_err(|source| ModelError::Import {
                path: path.to_path_buf(),
                source,
            })?;

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| ModelError::NoScene(path.to_path_buf()))?;

        let mut builder = MeshBuilder {
            path,
            buffers: &buffers,
            vertices: Vec::new(),
            indices: Vec::new(),
        };

        for node in scene.nodes() {
            builder.visit(&node, Mat4::IDENTITY)?;
        }

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Model::from_geometry(name, builder.vertices, builder.indices)
            .ok_or_else(|| ModelError::Empty(path.to_path_buf()))
    }

    /// Returns `None` when there are no vertices to bound.
    pub fn from_geometry(name: String, vertices: Vec<Vertex>, indices: Vec<u32>) -> Option<Model> {
        let bounds = Aabb::from_points(vertices.iter().map(|vertex| vertex.position))?;

        Some(Model {
            name,
            vertices,
            indices,
            bounds,
        })
    }

    /// Axis-aligned box resting on the ground plane. Stands in for assets that
    /// fail to load.
    pub fn cube(name: impl Into<String>, half_extent: f32, color: [f32; 4]) -> Model {
        let faces = [
            (Vec3::X, Vec3::Y),
            (Vec3::NEG_X, Vec3::Y),
            (Vec3::Y, Vec3::Z),
            (Vec3::NEG_Y, Vec3::Z),
            (Vec3::Z, Vec3::Y),
            (Vec3::NEG_Z, Vec3::Y),
        ];

        let lift = Vec3::new(0.0, half_extent, 0.0);
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (normal, up) in faces {
            let right = up.cross(normal);
            let base = vertices.len() as u32;

            for (u, v) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let position = (normal + right * u + up * v) * half_extent + lift;
                vertices.push(Vertex {
                    position,
                    normal,
                    color,
                });
            }

            indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        let bounds = Aabb::new(
            Vec3::new(-half_extent, 0.0, -half_extent),
            Vec3::new(half_extent, 2.0 * half_extent, half_extent),
        );

        Model {
            name: name.into(),
            vertices,
            indices,
            bounds,
        }
    }

    pub fn collider(&self) -> Collider {
        Collider::from_bounds(&self.bounds)
    }
}

struct MeshBuilder<'a> {
    path: &'a Path,
    buffers: &'a [gltf::buffer::Data],
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl MeshBuilder<'_> {
    fn visit(&mut self, node: &gltf::Node, parent_matrix: Mat4) -> Result<(), ModelError> {
        let world_matrix = parent_matrix * Mat4::from_cols_array_2d(&node.transform().matrix());

        if let Some(mesh) = node.mesh() {
            let normal_matrix = Mat3::from_mat4(world_matrix).inverse().transpose();

            for primitive in mesh.primitives() {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    return Err(ModelError::UnsupportedMode {
                        path: self.path.to_path_buf(),
                        mode: primitive.mode(),
                    });
                }

                let buffers = self.buffers;
                let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
                let positions = reader
                    .read_positions()
                    .ok_or_else(|| ModelError::MissingPositions(self.path.to_path_buf()))?;
                let normals: Vec<[f32; 3]> = reader
                    .read_normals()
                    .map(|normals| normals.collect())
                    .unwrap_or_default();
                let color = primitive
                    .material()
                    .pbr_metallic_roughness()
                    .base_color_factor();

                let base = self.vertices.len() as u32;

                for (index, position) in positions.enumerate() {
                    let normal = normals.get(index).map_or(Vec3::Y, |n| Vec3::from(*n));
                    self.vertices.push(Vertex {
                        position: world_matrix.transform_point3(Vec3::from(position)),
                        normal: (normal_matrix * normal).normalize_or_zero(),
                        color,
                    });
                }

                let end = self.vertices.len() as u32;

                match reader.read_indices() {
                    Some(indices) => self
                        .indices
                        .extend(indices.into_u32().map(|index| base + index)),
                    None => self.indices.extend(base..end),
                }
            }
        }

        for child in node.children() {
            self.visit(&child, world_matrix)?;
        }

        Ok(())
    }
}

/// Models keyed by asset path so each asset is imported and measured once.
pub struct ModelLibrary {
    models: Arena<Model>,
    by_path: HashMap<PathBuf, ModelId>,
}

impl ModelLibrary {
    pub fn new() -> Self {
        Self {
            models: Arena::new(),
            by_path: HashMap::new(),
        }
    }

    pub fn load(&mut self, path: &Path) -> Result<ModelId, ModelError> {
        if let Some(id) = self.by_path.get(path) {
            return Ok(*id);
        }

        let model = Model::load(path)?;
        log::debug!(
            "Loaded model {} ({} vertices, {} indices)",
            model.name,
            model.vertices.len(),
            model.indices.len()
        );

        let id = self.models.alloc(model);
        self.by_path.insert(path.to_path_buf(), id);
        Ok(id)
    }

    /// Like [`ModelLibrary::load`], but substitutes a placeholder cube when the
    /// asset cannot be read so the scene still mounts.
    pub fn load_or_placeholder(&mut self, path: &Path) -> ModelId {
        match self.load(path) {
            Ok(id) => id,
            Err(err) => {
                log::warn!("Using placeholder for {}: {err}", path.display());
                let id = self.insert(Model::cube(
                    format!("{} (Placeholder)", path.display()),
                    0.5,
                    [0.95, 0.8, 0.2, 1.0],
                ));
                self.by_path.insert(path.to_path_buf(), id);
                id
            }
        }
    }

    pub fn insert(&mut self, model: Model) -> ModelId {
        self.models.alloc(model)
    }

    pub fn get(&self, id: ModelId) -> Option<&Model> {
        self.models.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelId, &Model)> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.models.len() == 0
    }
}
