//! Loaded model: meshes, material textures and placement

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::assets::{import_obj, AssetError, ImportedModel};
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::render::backend::{CullMode, GraphicsBackend, TextureId};
use crate::render::primitives::{Mesh, Texture, TextureKind};
use crate::render::shader::ShaderProgram;
use crate::render::texture::load_material;

/// A set of meshes drawn with one transform
///
/// Material textures are shared between meshes that reference the same file and are
/// owned by the model. The texture flags record which kinds the materials declare,
/// whether or not the file decoded, and are fixed at load time.
#[derive(Debug)]
pub struct Model {
    meshes: Vec<Mesh>,
    textures: Vec<TextureId>,
    position: Vec3,
    rotation_angle: f32,
    rotation_axis: Vec3,
    scale: Vec3,
    color: Vec3,
    has_diffuse_texture: bool,
    has_specular_texture: bool,
    casts_shadows: bool,
    capture_cull: CullMode,
}

impl Model {
    /// Import an OBJ file and upload it
    pub fn load(backend: &mut dyn GraphicsBackend, path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let imported = import_obj(path)?;
        Self::from_import(backend, imported)
    }

    /// Upload an already imported model
    pub fn from_import(backend: &mut dyn GraphicsBackend, imported: ImportedModel) -> Result<Self, AssetError> {
        let mut cache: HashMap<PathBuf, Option<TextureId>> = HashMap::new();
        let mut meshes = Vec::with_capacity(imported.meshes.len());

        for mesh in imported.meshes {
            let textures = mesh
                .textures
                .into_iter()
                .map(|texture_ref| {
                    let id = *cache
                        .entry(texture_ref.path.clone())
                        .or_insert_with(|| load_material(backend, &texture_ref.path));
                    Texture {
                        id,
                        kind: texture_ref.kind,
                        path: texture_ref.path,
                    }
                })
                .collect::<Vec<_>>();

            match Mesh::create(backend, mesh.vertices, mesh.indices, textures) {
                Ok(uploaded) => meshes.push(uploaded),
                Err(e) => {
                    for uploaded in meshes {
                        uploaded.release(backend);
                    }
                    for id in cache.into_values().flatten() {
                        backend.delete_texture(id);
                    }
                    return Err(AssetError::Upload(e));
                }
            }
        }

        let declares = |kind: TextureKind| meshes.iter().flat_map(Mesh::textures).any(|t| t.kind == kind);
        let has_diffuse_texture = declares(TextureKind::Diffuse);
        let has_specular_texture = declares(TextureKind::Specular);

        log::info!(
            "Model {:?}: {} meshes, {} textures",
            imported.path,
            meshes.len(),
            cache.len()
        );

        Ok(Self {
            meshes,
            textures: cache.into_values().flatten().collect(),
            position: Vec3::zeros(),
            rotation_angle: 0.0,
            rotation_axis: Vec3::new(0.0, 1.0, 0.0),
            scale: Vec3::repeat(1.0),
            color: Vec3::repeat(0.5),
            has_diffuse_texture,
            has_specular_texture,
            casts_shadows: true,
            capture_cull: CullMode::Default,
        })
    }

    /// Draw every mesh in order
    pub fn draw(&self, backend: &mut dyn GraphicsBackend, program: &ShaderProgram) {
        for mesh in &self.meshes {
            mesh.draw(backend, program);
        }
    }

    /// `T · R · S` from the current placement
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::model_matrix(&self.position, self.rotation_angle, &self.rotation_axis, &self.scale)
    }

    /// World position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Set the world position
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Add `offset` to the position
    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }

    /// Rotation as (angle in degrees, axis)
    pub fn rotation(&self) -> (f32, Vec3) {
        (self.rotation_angle, self.rotation_axis)
    }

    /// Set the rotation
    pub fn set_rotation(&mut self, angle_degrees: f32, axis: Vec3) {
        self.rotation_angle = angle_degrees;
        self.rotation_axis = axis;
    }

    /// Per-axis scale
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Set the per-axis scale
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Flat tint
    pub fn color(&self) -> Vec3 {
        self.color
    }

    /// Set the flat tint
    pub fn set_color(&mut self, color: Vec3) {
        self.color = color;
    }

    /// Whether any material declares a diffuse texture
    pub fn has_diffuse_texture(&self) -> bool {
        self.has_diffuse_texture
    }

    /// Whether any material declares a specular texture
    pub fn has_specular_texture(&self) -> bool {
        self.has_specular_texture
    }

    /// Whether shadow passes draw this model
    pub fn casts_shadows(&self) -> bool {
        self.casts_shadows
    }

    /// Include or exclude the model from shadow passes
    pub fn set_casts_shadows(&mut self, casts_shadows: bool) {
        self.casts_shadows = casts_shadows;
    }

    /// Culling policy used while capturing shadows
    pub fn capture_cull(&self) -> CullMode {
        self.capture_cull
    }

    /// Set the capture culling policy
    pub fn set_capture_cull(&mut self, mode: CullMode) {
        self.capture_cull = mode;
    }

    /// Meshes in draw order
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// Total index count across meshes
    pub fn index_count(&self) -> usize {
        self.meshes.iter().map(|m| m.indices().len()).sum()
    }

    /// Free meshes and the textures they share
    pub fn release(self, backend: &mut dyn GraphicsBackend) {
        for mesh in self.meshes {
            mesh.release(backend);
        }
        for id in self.textures {
            backend.delete_texture(id);
        }
    }
}
