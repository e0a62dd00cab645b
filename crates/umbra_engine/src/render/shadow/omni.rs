//! Omnidirectional shadow cube for a point light
//!
//! All six faces are captured in one pass: the depth cube texture is attached as a
//! layered target and the capture program's geometry stage emits each triangle once
//! per face using `mat_shadow[0..6]`. The fragment stage writes linear distance to the
//! light divided by `far_plane`.

use crate::foundation::math::{utils::deg_to_rad, Mat4, Mat4Ext, Vec3};
use crate::render::backend::{
    Attachment, ClearMask, FramebufferId, GraphicsBackend, PixelFormat, TextureDesc,
    TextureFilter, TextureId, TextureTarget, TextureWrap, Viewport,
};
use crate::render::shader::ShaderProgram;
use crate::render::{ensure_complete, RenderResult, SHADOW_TEXTURE_UNIT};

/// Cube map face, in GL layer order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    /// +X
    PositiveX,
    /// -X
    NegativeX,
    /// +Y
    PositiveY,
    /// -Y
    NegativeY,
    /// +Z
    PositiveZ,
    /// -Z
    NegativeZ,
}

impl CubeFace {
    /// All faces in layer order
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Direction the face looks along
    pub fn direction(self) -> Vec3 {
        match self {
            CubeFace::PositiveX => Vec3::new(1.0, 0.0, 0.0),
            CubeFace::NegativeX => Vec3::new(-1.0, 0.0, 0.0),
            CubeFace::PositiveY => Vec3::new(0.0, 1.0, 0.0),
            CubeFace::NegativeY => Vec3::new(0.0, -1.0, 0.0),
            CubeFace::PositiveZ => Vec3::new(0.0, 0.0, 1.0),
            CubeFace::NegativeZ => Vec3::new(0.0, 0.0, -1.0),
        }
    }

    /// Up vector matching the cube map texel orientation of this face
    pub fn up(self) -> Vec3 {
        match self {
            CubeFace::PositiveY => Vec3::new(0.0, 0.0, 1.0),
            CubeFace::NegativeY => Vec3::new(0.0, 0.0, -1.0),
            _ => Vec3::new(0.0, -1.0, 0.0),
        }
    }
}

/// View-projection for every face of a cube centred on `light_position`
pub fn face_matrices(light_position: Vec3, near: f32, far: f32) -> [Mat4; 6] {
    let projection = Mat4::perspective_gl(deg_to_rad(90.0), 1.0, near, far);
    CubeFace::ALL.map(|face| {
        projection * Mat4::look_at(light_position, light_position + face.direction(), face.up())
    })
}

/// Cube capture size and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeShadowSettings {
    /// Face resolution in texels
    pub resolution: u32,
    /// Near plane
    pub near: f32,
    /// Far plane, also the normaliser for stored distances
    pub far: f32,
}

impl Default for CubeShadowSettings {
    fn default() -> Self {
        Self {
            resolution: 1024,
            near: 1.0,
            far: 25.0,
        }
    }
}

/// Depth-only framebuffer with a layered depth cube map
#[derive(Debug)]
pub struct CubeShadowMap {
    framebuffer: FramebufferId,
    depth_cube: TextureId,
    settings: CubeShadowSettings,
}

impl CubeShadowMap {
    /// Create the depth cube and its framebuffer
    pub fn create(backend: &mut dyn GraphicsBackend, settings: CubeShadowSettings) -> RenderResult<Self> {
        let desc = TextureDesc {
            width: settings.resolution,
            height: settings.resolution,
            format: PixelFormat::Depth,
            min_filter: TextureFilter::Nearest,
            mag_filter: TextureFilter::Nearest,
            wrap: TextureWrap::ClampToEdge,
            mipmaps: false,
        };
        let framebuffer = backend.create_framebuffer()?;
        let depth_cube = backend.create_texture_cube(&desc, [None; 6])?;
        backend.attach_texture(framebuffer, Attachment::Depth, TextureTarget::CubeMap, depth_cube);
        backend.disable_color_buffers(framebuffer);

        let map = Self {
            framebuffer,
            depth_cube,
            settings,
        };
        if let Err(e) = ensure_complete(backend, framebuffer, "point shadow cube") {
            map.release(backend);
            return Err(e);
        }
        log::info!(
            "Point shadow cube {}x{} ready (far plane {})",
            settings.resolution,
            settings.resolution,
            settings.far
        );
        Ok(map)
    }

    /// Bind the cube for writing and clear its depth
    pub fn begin_capture(&self, backend: &mut dyn GraphicsBackend) {
        backend.bind_texture(SHADOW_TEXTURE_UNIT, TextureTarget::CubeMap, None);
        backend.set_viewport(Viewport::sized(self.settings.resolution, self.settings.resolution));
        backend.bind_framebuffer(Some(self.framebuffer));
        backend.clear(ClearMask::DEPTH);
        backend.set_depth_test(true);
    }

    /// Activate a capture program and load the six face matrices, `lightPos` and `far_plane`
    pub fn upload_capture_uniforms(
        &self,
        backend: &mut dyn GraphicsBackend,
        capture_program: &ShaderProgram,
        light_position: Vec3,
    ) {
        capture_program.activate(backend);
        let matrices = face_matrices(light_position, self.settings.near, self.settings.far);
        for (i, matrix) in matrices.iter().enumerate() {
            capture_program.set_mat4(backend, &format!("mat_shadow[{i}]"), matrix);
        }
        capture_program.set_vec3(backend, "lightPos", &light_position);
        capture_program.set_float(backend, "far_plane", self.settings.far);
    }

    /// Bind the cube to the reserved shadow unit for the lit pass
    pub fn bind_for_sampling(&self, backend: &mut dyn GraphicsBackend) {
        backend.bind_texture(SHADOW_TEXTURE_UNIT, TextureTarget::CubeMap, Some(self.depth_cube));
    }

    /// Settings the cube was created with
    pub fn settings(&self) -> &CubeShadowSettings {
        &self.settings
    }

    /// Depth cube texture
    pub fn depth_texture(&self) -> TextureId {
        self.depth_cube
    }

    /// Framebuffer handle
    pub fn framebuffer(&self) -> FramebufferId {
        self.framebuffer
    }

    /// Delete the framebuffer and cube texture
    pub fn release(self, backend: &mut dyn GraphicsBackend) {
        backend.delete_framebuffer(self.framebuffer);
        backend.delete_texture(self.depth_cube);
    }
}
