//! Wavefront OBJ import
//!
//! Loads an OBJ (and its MTL library) through `tobj`, triangulated and with a single
//! index stream per mesh. Texture coordinates are flipped to GL's bottom-left origin
//! and per-vertex tangents are accumulated from triangle UV gradients. The result is
//! CPU-only; [`crate::scene::Model::load`] uploads it.

use std::path::{Path, PathBuf};

use crate::assets::AssetError;
use crate::foundation::math::{Vec2, Vec3};
use crate::render::primitives::{TextureKind, Vertex};

/// Material texture referenced by an imported mesh, path resolved against the model file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRef {
    /// Semantic role
    pub kind: TextureKind,
    /// Absolute or working-directory-relative path
    pub path: PathBuf,
}

/// One imported mesh
#[derive(Debug, Clone)]
pub struct ImportedMesh {
    /// Object or group name from the file
    pub name: String,
    /// Interleaved vertices
    pub vertices: Vec<Vertex>,
    /// Triangle list
    pub indices: Vec<u32>,
    /// Textures in diffuse, specular, normal order
    pub textures: Vec<TextureRef>,
}

/// Every mesh in a model file, in file order
#[derive(Debug, Clone)]
pub struct ImportedModel {
    /// File the model came from
    pub path: PathBuf,
    /// Flattened meshes
    pub meshes: Vec<ImportedMesh>,
}

/// Import an OBJ file
///
/// A missing or malformed MTL library is logged and the meshes are returned untextured.
pub fn import_obj(path: impl AsRef<Path>) -> Result<ImportedModel, AssetError> {
    let path = path.as_ref();
    let import_error = |message: String| AssetError::Import {
        path: path.display().to_string(),
        message,
    };

    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, materials) =
        tobj::load_obj(path, &options).map_err(|e| import_error(e.to_string()))?;
    if models.is_empty() {
        return Err(import_error("file contains no geometry".to_string()));
    }

    let materials = materials.unwrap_or_else(|e| {
        log::warn!("Material library for {:?} not loaded: {}", path, e);
        Vec::new()
    });
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

    let meshes = models
        .into_iter()
        .map(|model| {
            let material = model.mesh.material_id.and_then(|id| materials.get(id));
            let textures = material
                .map(|m| material_textures(m, base_dir))
                .unwrap_or_default();
            let vertices = build_vertices(&model.mesh);
            ImportedMesh {
                name: model.name,
                vertices,
                indices: model.mesh.indices,
                textures,
            }
        })
        .collect::<Vec<_>>();

    log::debug!("Imported {} mesh(es) from {:?}", meshes.len(), path);
    Ok(ImportedModel {
        path: path.to_path_buf(),
        meshes,
    })
}

fn material_textures(material: &tobj::Material, base_dir: &Path) -> Vec<TextureRef> {
    [
        (TextureKind::Diffuse, &material.diffuse_texture),
        (TextureKind::Specular, &material.specular_texture),
        (TextureKind::Normal, &material.normal_texture),
    ]
    .into_iter()
    .filter_map(|(kind, file)| {
        file.as_ref()
            .filter(|file| !file.trim().is_empty())
            .map(|file| TextureRef {
                kind,
                path: base_dir.join(file.trim()),
            })
    })
    .collect()
}

fn build_vertices(mesh: &tobj::Mesh) -> Vec<Vertex> {
    let mut vertices = (0..mesh.positions.len() / 3)
        .map(|i| Vertex {
            position: [
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ],
            normal: [
                mesh.normals.get(i * 3).copied().unwrap_or(0.0),
                mesh.normals.get(i * 3 + 1).copied().unwrap_or(0.0),
                mesh.normals.get(i * 3 + 2).copied().unwrap_or(0.0),
            ],
            tex_coord: [
                mesh.texcoords.get(i * 2).copied().unwrap_or(0.0),
                1.0 - mesh.texcoords.get(i * 2 + 1).copied().unwrap_or(0.0),
            ],
            tangent: [0.0; 3],
        })
        .collect::<Vec<_>>();

    if !mesh.texcoords.is_empty() {
        compute_tangents(&mut vertices, &mesh.indices);
    }
    vertices
}

/// Accumulate per-triangle tangents onto vertices and normalise the sums
pub fn compute_tangents(vertices: &mut [Vertex], indices: &[u32]) {
    let mut sums = vec![Vec3::zeros(); vertices.len()];

    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        if a >= vertices.len() || b >= vertices.len() || c >= vertices.len() {
            continue;
        }

        let p0 = Vec3::from(vertices[a].position);
        let p1 = Vec3::from(vertices[b].position);
        let p2 = Vec3::from(vertices[c].position);
        let uv0 = Vec2::from(vertices[a].tex_coord);
        let uv1 = Vec2::from(vertices[b].tex_coord);
        let uv2 = Vec2::from(vertices[c].tex_coord);

        let (edge1, edge2) = (p1 - p0, p2 - p0);
        let (duv1, duv2) = (uv1 - uv0, uv2 - uv0);
        let det = duv1.x * duv2.y - duv1.y * duv2.x;
        if det.abs() <= f32::EPSILON {
            continue;
        }

        let tangent = (edge1 * duv2.y - edge2 * duv1.y) / det;
        for index in [a, b, c] {
            sums[index] += tangent;
        }
    }

    for (vertex, sum) in vertices.iter_mut().zip(sums) {
        if let Some(tangent) = sum.try_normalize(f32::EPSILON) {
            vertex.tangent = tangent.into();
        }
    }
}
