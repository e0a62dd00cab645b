//! Mesh representation for 3D models
//!
//! A [`Mesh`] is GPU-resident indexed geometry plus the ordered list of material
//! textures it samples. Vertices are interleaved with a fixed attribute layout:
//!
//! | location | attribute | components |
//! |----------|-----------|------------|
//! | 0        | position  | 3          |
//! | 1        | normal    | 3          |
//! | 2        | texcoord  | 2          |
//! | 3        | tangent   | 3          |
//!
//! Shaders written against the renderer declare their inputs with these locations.

use std::path::PathBuf;

use bytemuck::{Pod, Zeroable};

use crate::render::backend::{
    GpuGeometry, GraphicsBackend, TextureId, TextureTarget, VertexAttribute, VertexLayout,
};
use crate::render::shader::ShaderProgram;
use crate::render::{RenderError, RenderResult, SHADOW_TEXTURE_UNIT};

/// Interleaved vertex as uploaded to the GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Unit normal
    pub normal: [f32; 3],
    /// Texture coordinates, V already flipped for GL
    pub tex_coord: [f32; 2],
    /// Tangent for normal mapping, zero when the mesh has no UVs
    pub tangent: [f32; 3],
}

impl Vertex {
    /// Create a vertex with a zero tangent
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
            tangent: [0.0; 3],
        }
    }

    /// Attribute layout matching the field order above
    pub const LAYOUT: VertexLayout = VertexLayout {
        stride: std::mem::size_of::<Self>() as i32,
        attributes: &[
            VertexAttribute {
                location: 0,
                components: 3,
                offset: 0,
            },
            VertexAttribute {
                location: 1,
                components: 3,
                offset: 12,
            },
            VertexAttribute {
                location: 2,
                components: 2,
                offset: 24,
            },
            VertexAttribute {
                location: 3,
                components: 3,
                offset: 32,
            },
        ],
    };
}

/// Semantic role of a material texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    /// Albedo
    Diffuse,
    /// Specular intensity
    Specular,
    /// Tangent-space normals
    Normal,
}

impl TextureKind {
    /// Lower-case name used in sampler uniforms
    pub fn name(self) -> &'static str {
        match self {
            Self::Diffuse => "diffuse",
            Self::Specular => "specular",
            Self::Normal => "normal",
        }
    }
}

/// Material texture referenced by a mesh
///
/// `id` is `None` when decoding failed; drawing then binds no texture to the unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    /// GPU texture, absent if the image could not be loaded
    pub id: Option<TextureId>,
    /// Semantic role
    pub kind: TextureKind,
    /// File the texture was loaded from
    pub path: PathBuf,
}

/// Indexed triangle mesh on the GPU
#[derive(Debug)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    textures: Vec<Texture>,
    geometry: GpuGeometry,
}

impl Mesh {
    /// Upload vertices and indices
    ///
    /// Every index must address an existing vertex.
    pub fn create(
        backend: &mut dyn GraphicsBackend,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        textures: Vec<Texture>,
    ) -> RenderResult<Self> {
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(RenderError::ResourceCreationFailed(format!(
                "index {bad} out of range for {} vertices",
                vertices.len()
            )));
        }
        if indices.len() % 3 != 0 {
            return Err(RenderError::ResourceCreationFailed(format!(
                "{} indices do not form whole triangles",
                indices.len()
            )));
        }

        let geometry = backend.create_geometry(
            bytemuck::cast_slice(&vertices),
            &Vertex::LAYOUT,
            Some(&indices),
        )?;

        Ok(Self {
            vertices,
            indices,
            textures,
            geometry,
        })
    }

    /// Bind textures and draw
    ///
    /// Texture `i` goes to unit `i` and its sampler is named `texture_{kind}{n}`, where
    /// `n` counts textures of the same kind starting at 1.
    pub fn draw(&self, backend: &mut dyn GraphicsBackend, program: &ShaderProgram) {
        let mut counters = [0u32; 3];
        for (unit, texture) in (0u32..).zip(&self.textures) {
            if unit >= SHADOW_TEXTURE_UNIT {
                log::warn!(
                    "Mesh has more than {SHADOW_TEXTURE_UNIT} textures, skipping {:?}",
                    texture.path
                );
                break;
            }
            let counter = &mut counters[texture.kind as usize];
            *counter += 1;

            let sampler = format!("texture_{}{}", texture.kind.name(), counter);
            program.set_int(backend, &sampler, unit as i32);
            backend.bind_texture(unit, TextureTarget::Texture2D, texture.id);
        }

        backend.draw_geometry(&self.geometry);
    }

    /// Vertex data
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Triangle list indices
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Material textures in binding order
    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    /// Free the geometry; textures belong to the owning model
    pub fn release(self, backend: &mut dyn GraphicsBackend) {
        backend.delete_geometry(self.geometry);
    }
}
