//! Environment cube drawn behind the scene

use std::path::Path;

use crate::assets::AssetError;
use crate::foundation::math::{Mat4, Mat4Ext};
use crate::render::backend::{
    CullMode, GpuGeometry, GraphicsBackend, TextureId, TextureTarget, VertexAttribute,
    VertexLayout,
};
use crate::render::shader::ShaderProgram;
use crate::render::texture::load_cube_map;
use crate::render::RenderResult;

const SKYBOX_LAYOUT: VertexLayout = VertexLayout {
    stride: 12,
    attributes: &[VertexAttribute {
        location: 0,
        components: 3,
        offset: 0,
    }],
};

#[rustfmt::skip]
const SKYBOX_VERTICES: [f32; 108] = [
    -1.0,  1.0, -1.0,  -1.0, -1.0, -1.0,   1.0, -1.0, -1.0,
     1.0, -1.0, -1.0,   1.0,  1.0, -1.0,  -1.0,  1.0, -1.0,

    -1.0, -1.0,  1.0,  -1.0, -1.0, -1.0,  -1.0,  1.0, -1.0,
    -1.0,  1.0, -1.0,  -1.0,  1.0,  1.0,  -1.0, -1.0,  1.0,

     1.0, -1.0, -1.0,   1.0, -1.0,  1.0,   1.0,  1.0,  1.0,
     1.0,  1.0,  1.0,   1.0,  1.0, -1.0,   1.0, -1.0, -1.0,

    -1.0, -1.0,  1.0,  -1.0,  1.0,  1.0,   1.0,  1.0,  1.0,
     1.0,  1.0,  1.0,   1.0, -1.0,  1.0,  -1.0, -1.0,  1.0,

    -1.0,  1.0, -1.0,   1.0,  1.0, -1.0,   1.0,  1.0,  1.0,
     1.0,  1.0,  1.0,  -1.0,  1.0,  1.0,  -1.0,  1.0, -1.0,

    -1.0, -1.0, -1.0,  -1.0, -1.0,  1.0,   1.0, -1.0, -1.0,
     1.0, -1.0, -1.0,  -1.0, -1.0,  1.0,   1.0, -1.0,  1.0,
];

/// Unit cube plus the cube map it samples
#[derive(Debug)]
pub struct Skybox {
    geometry: GpuGeometry,
    cube_map: TextureId,
}

impl Skybox {
    /// Load six face images (+X, -X, +Y, -Y, +Z, -Z) and upload the cube
    pub fn load<P: AsRef<Path>>(
        backend: &mut dyn GraphicsBackend,
        faces: &[P; 6],
    ) -> Result<Self, AssetError> {
        let cube_map = load_cube_map(backend, faces)?;
        match Self::from_cube_map(backend, cube_map) {
            Ok(skybox) => Ok(skybox),
            Err(e) => {
                backend.delete_texture(cube_map);
                Err(e.into())
            }
        }
    }

    /// Wrap an existing cube map; the skybox takes ownership of it
    pub fn from_cube_map(backend: &mut dyn GraphicsBackend, cube_map: TextureId) -> RenderResult<Self> {
        let geometry =
            backend.create_geometry(bytemuck::cast_slice(&SKYBOX_VERTICES), &SKYBOX_LAYOUT, None)?;
        Ok(Self { geometry, cube_map })
    }

    /// Draw with depth writes off so everything drawn afterwards lands in front
    ///
    /// The view matrix loses its translation so the box stays centred on the camera.
    pub fn draw(&self, backend: &mut dyn GraphicsBackend, program: &ShaderProgram, view: &Mat4, projection: &Mat4) {
        backend.set_depth_mask(false);
        backend.set_cull_mode(CullMode::Disabled);

        program.activate(backend);
        program.set_mat4(backend, "mat_view", &view.without_translation());
        program.set_mat4(backend, "mat_proj", projection);
        program.set_int(backend, "skybox", 0);
        backend.bind_texture(0, TextureTarget::CubeMap, Some(self.cube_map));
        backend.draw_geometry(&self.geometry);

        backend.set_cull_mode(CullMode::Default);
        backend.set_depth_mask(true);
    }

    /// Cube map texture
    pub fn cube_map(&self) -> TextureId {
        self.cube_map
    }

    /// Delete the geometry and the cube map
    pub fn release(self, backend: &mut dyn GraphicsBackend) {
        backend.delete_geometry(self.geometry);
        backend.delete_texture(self.cube_map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::backend::UniformValue;
    use crate::render::backends::{GpuCall, RecordingBackend};
    use crate::render::shader::ShaderSources;

    fn write_face(dir: &Path, name: &str, size: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        image::RgbImage::from_pixel(size, size, image::Rgb([40, 80, 160]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_load_and_draw() {
        let dir = tempfile::tempdir().unwrap();
        let faces = ["px", "nx", "py", "ny", "pz", "nz"]
            .map(|name| write_face(dir.path(), &format!("{name}.png"), 2));

        let mut backend = RecordingBackend::new();
        let program = ShaderProgram::compile(&mut backend, ShaderSources::new("vs", "fs")).unwrap();
        let skybox = Skybox::load(&mut backend, &faces).unwrap();
        backend.clear_calls();

        let view = Mat4::new_translation(&Vec3::new(3.0, 0.0, 0.0));
        skybox.draw(&mut backend, &program, &view, &Mat4::identity());

        assert_eq!(backend.calls().first(), Some(&GpuCall::DepthMask(false)));
        assert_eq!(backend.calls().last(), Some(&GpuCall::DepthMask(true)));
        assert_eq!(
            backend.uniform(program.id(), "mat_view"),
            Some(UniformValue::Mat4(Mat4::identity()))
        );
        assert_eq!(backend.draws().len(), 1);

        skybox.release(&mut backend);
        program.release(&mut backend);
        assert!(backend.live_objects().is_empty());
    }

    #[test]
    fn test_mismatched_faces_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut faces = ["a", "b", "c", "d", "e", "f"]
            .map(|name| write_face(dir.path(), &format!("{name}.png"), 2));
        faces[5] = write_face(dir.path(), "big.png", 4);

        let mut backend = RecordingBackend::new();
        assert!(Skybox::load(&mut backend, &faces).is_err());
        assert!(backend.live_objects().is_empty());
    }
}
