//! Orthographic shadow map for a directional light

use crate::foundation::math::{constants, Mat4, Mat4Ext, Vec3};
use crate::render::backend::{
    Attachment, ClearMask, FramebufferId, GraphicsBackend, TextureDesc, TextureId, TextureTarget,
    TextureWrap, Viewport,
};
use crate::render::shader::ShaderProgram;
use crate::render::{ensure_complete, RenderResult, SHADOW_TEXTURE_UNIT};

/// Light frustum and map size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalShadowSettings {
    /// Square map resolution in texels
    pub resolution: u32,
    /// Half extent of the symmetric orthographic frustum
    pub extent: f32,
    /// Near plane
    pub near: f32,
    /// Far plane
    pub far: f32,
    /// Where the light looks from; it always looks at the origin
    pub light_position: Vec3,
}

impl Default for DirectionalShadowSettings {
    fn default() -> Self {
        Self {
            resolution: 1024,
            extent: 10.0,
            near: 1.0,
            far: 7.5,
            light_position: Vec3::new(-2.0, 4.0, -1.0),
        }
    }
}

impl DirectionalShadowSettings {
    /// `ortho(±extent, near, far) · look_at(light_position → origin)`
    pub fn light_space_matrix(&self) -> Mat4 {
        let e = self.extent;
        let projection = Mat4::orthographic_gl(-e, e, -e, e, self.near, self.far);
        let view = Mat4::look_at(
            self.light_position,
            Vec3::zeros(),
            Vec3::from(constants::WORLD_UP),
        );
        projection * view
    }
}

/// Depth-only framebuffer with a 2D depth texture
#[derive(Debug)]
pub struct DirectionalShadowMap {
    framebuffer: FramebufferId,
    depth: TextureId,
    settings: DirectionalShadowSettings,
}

impl DirectionalShadowMap {
    /// Create the depth texture and framebuffer
    ///
    /// Samples outside the map read as depth 1.0 so geometry beyond the frustum is lit.
    pub fn create(
        backend: &mut dyn GraphicsBackend,
        settings: DirectionalShadowSettings,
    ) -> RenderResult<Self> {
        let framebuffer = backend.create_framebuffer()?;
        let depth = backend.create_texture_2d(
            &TextureDesc::depth(
                settings.resolution,
                settings.resolution,
                TextureWrap::ClampToBorder([1.0; 4]),
            ),
            None,
        )?;
        backend.attach_texture(framebuffer, Attachment::Depth, TextureTarget::Texture2D, depth);
        backend.disable_color_buffers(framebuffer);

        let map = Self {
            framebuffer,
            depth,
            settings,
        };
        if let Err(e) = ensure_complete(backend, framebuffer, "directional shadow map") {
            map.release(backend);
            return Err(e);
        }
        log::info!(
            "Directional shadow map {}x{} ready",
            settings.resolution,
            settings.resolution
        );
        Ok(map)
    }

    /// Bind the map for writing and clear its depth
    ///
    /// The shadow unit is unbound first so the map is never sampled while it is written.
    pub fn begin_capture(&self, backend: &mut dyn GraphicsBackend) {
        backend.bind_texture(SHADOW_TEXTURE_UNIT, TextureTarget::Texture2D, None);
        backend.set_viewport(Viewport::sized(self.settings.resolution, self.settings.resolution));
        backend.bind_framebuffer(Some(self.framebuffer));
        backend.clear(ClearMask::DEPTH);
        backend.set_depth_test(true);
    }

    /// Activate a depth program and load `lightSpaceMatrix`
    pub fn upload_capture_uniforms(&self, backend: &mut dyn GraphicsBackend, depth_program: &ShaderProgram) {
        depth_program.activate(backend);
        depth_program.set_mat4(backend, "lightSpaceMatrix", &self.light_space_matrix());
    }

    /// Light-space transform for this map
    pub fn light_space_matrix(&self) -> Mat4 {
        self.settings.light_space_matrix()
    }

    /// Bind the depth texture to the reserved shadow unit
    pub fn bind_for_sampling(&self, backend: &mut dyn GraphicsBackend) {
        backend.bind_texture(SHADOW_TEXTURE_UNIT, TextureTarget::Texture2D, Some(self.depth));
    }

    /// Settings the map was created with
    pub fn settings(&self) -> &DirectionalShadowSettings {
        &self.settings
    }

    /// Depth texture
    pub fn depth_texture(&self) -> TextureId {
        self.depth
    }

    /// Framebuffer handle
    pub fn framebuffer(&self) -> FramebufferId {
        self.framebuffer
    }

    /// Delete the framebuffer and depth texture
    pub fn release(self, backend: &mut dyn GraphicsBackend) {
        backend.delete_framebuffer(self.framebuffer);
        backend.delete_texture(self.depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Point3;
    use crate::render::backend::UniformValue;
    use crate::render::backends::{GpuCall, RecordingBackend};
    use crate::render::shader::ShaderSources;
    use approx::assert_relative_eq;

    #[test]
    fn test_origin_projects_inside_light_frustum() {
        let settings = DirectionalShadowSettings::default();
        let clip = settings.light_space_matrix().transform_point(&Point3::origin());

        // The origin sits on the light's view axis at distance |(-2, 4, -1)|.
        assert_relative_eq!(clip.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y, 0.0, epsilon = 1e-5);
        assert!((-1.0..=1.0).contains(&clip.z));
    }

    #[test]
    fn test_map_is_depth_only() {
        let mut backend = RecordingBackend::new();
        let map = DirectionalShadowMap::create(&mut backend, DirectionalShadowSettings::default()).unwrap();

        assert!(backend.calls().contains(&GpuCall::DisableColorBuffers(map.framebuffer())));
        assert!(backend.calls().contains(&GpuCall::AttachTexture {
            framebuffer: map.framebuffer(),
            attachment: Attachment::Depth,
            target: TextureTarget::Texture2D,
            texture: map.depth_texture(),
        }));
    }

    #[test]
    fn test_begin_capture_sets_state() {
        let mut backend = RecordingBackend::new();
        let depth = ShaderProgram::compile(&mut backend, ShaderSources::new("vs", "fs")).unwrap();
        let map = DirectionalShadowMap::create(&mut backend, DirectionalShadowSettings::default()).unwrap();
        backend.clear_calls();

        map.begin_capture(&mut backend);
        map.upload_capture_uniforms(&mut backend, &depth);

        assert_eq!(
            backend.calls()[..4],
            [
                GpuCall::BindTexture {
                    unit: SHADOW_TEXTURE_UNIT,
                    target: TextureTarget::Texture2D,
                    texture: None,
                },
                GpuCall::Viewport(Viewport::sized(1024, 1024)),
                GpuCall::BindFramebuffer(Some(map.framebuffer())),
                GpuCall::Clear(ClearMask::DEPTH),
            ]
        );
        assert_eq!(
            backend.uniform(depth.id(), "lightSpaceMatrix"),
            Some(UniformValue::Mat4(map.light_space_matrix()))
        );
    }

    #[test]
    fn test_incomplete_map_is_fatal() {
        let mut backend = RecordingBackend::new().incomplete_framebuffers();
        assert!(DirectionalShadowMap::create(&mut backend, DirectionalShadowSettings::default()).is_err());
        assert!(backend.live_objects().is_empty());
    }
}
