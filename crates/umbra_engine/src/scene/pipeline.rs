//! Multi-pass frame: shadow capture, lit offscreen pass, presentation
//!
//! One frame runs:
//!
//! 1. **Shadow capture** into a directional depth map or a point-light depth cube,
//!    drawing every shadow caster with its pass shader or the depth fallback.
//! 2. **Lit pass** into the offscreen target: skybox first, then camera, light and
//!    shadow uniforms on every program, then every model with its lit shader while the
//!    shadow texture sits on the reserved unit.
//! 3. **Presentation** of the offscreen colour (or the shadow map, for debugging)
//!    through a full-screen quad on the default framebuffer.

use crate::core::config::{ApplicationConfig, PresentSource, ShadowConfig, ShadowTechnique};
use crate::foundation::math::Vec3;
use crate::render::backend::{GraphicsBackend, TextureId, Viewport};
use crate::render::shader::ShaderProgram;
use crate::render::shadow::{
    CubeShadowMap, CubeShadowSettings, DirectionalShadowMap, DirectionalShadowSettings,
};
use crate::render::skybox::Skybox;
use crate::render::targets::{OffscreenTarget, ScreenQuad};
use crate::render::SHADOW_TEXTURE_UNIT;
use crate::scene::{Scene, SceneError, SceneResult};

/// Pass a model is drawn in, used as the second half of a shader assignment key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPassKind {
    /// Lit colour pass
    Lit,
    /// Directional depth capture
    DirectionalShadow,
    /// Point-light cube capture
    PointShadow,
}

enum ShadowStage {
    Disabled,
    Directional {
        map: DirectionalShadowMap,
        shader: String,
    },
    Omni {
        map: CubeShadowMap,
        shader: String,
        light: Option<String>,
    },
}

impl ShadowStage {
    fn technique(&self) -> ShadowTechnique {
        match self {
            ShadowStage::Disabled => ShadowTechnique::None,
            ShadowStage::Directional { .. } => ShadowTechnique::Directional,
            ShadowStage::Omni { .. } => ShadowTechnique::Omnidirectional,
        }
    }
}

/// Render targets and pass configuration for shadowed frames
pub struct ShadowPipeline {
    shadow: ShadowStage,
    target: OffscreenTarget,
    quad: ScreenQuad,
    skybox: Option<(Skybox, String)>,
    present_shader: String,
    present_depth_shader: Option<String>,
    clear_color: [f32; 4],
    viewport: Viewport,
}

fn directional_settings(config: &ShadowConfig) -> DirectionalShadowSettings {
    DirectionalShadowSettings {
        resolution: config.resolution,
        extent: config.ortho_extent,
        near: config.near,
        far: config.far,
        light_position: Vec3::from(config.light_position),
    }
}

fn cube_settings(config: &ShadowConfig) -> CubeShadowSettings {
    CubeShadowSettings {
        resolution: config.resolution,
        near: config.cube_near,
        far: config.cube_far,
    }
}

impl ShadowPipeline {
    /// Create targets for a `width` x `height` drawable
    ///
    /// Shaders are looked up in `scene`, so the shader list must be loaded first. A
    /// missing presentation shader is an error. A missing depth or skybox shader turns
    /// that feature off with a warning. Incomplete framebuffers are fatal.
    pub fn new(
        backend: &mut dyn GraphicsBackend,
        config: &ApplicationConfig,
        scene: &Scene,
        width: u32,
        height: u32,
    ) -> SceneResult<Self> {
        if scene.shader(&config.present.shader).is_none() {
            return Err(SceneError::NotFound {
                kind: "shader",
                name: config.present.shader.clone(),
            });
        }

        let shadow = Self::create_shadow_stage(backend, &config.shadows, scene)?;

        let present_depth_shader = match (config.present.source, &shadow) {
            (PresentSource::Color, _) => None,
            (PresentSource::ShadowDepth, ShadowStage::Directional { .. })
                if scene.shader(&config.present.depth_shader).is_some() =>
            {
                Some(config.present.depth_shader.clone())
            }
            (PresentSource::ShadowDepth, _) => {
                log::warn!(
                    "Shadow depth presentation needs a directional map and shader '{}'; presenting colour",
                    config.present.depth_shader
                );
                None
            }
        };

        let skybox = match &config.skybox.faces {
            Some(_) if scene.shader(&config.skybox.shader).is_none() => {
                log::warn!("Skybox shader '{}' unavailable, skybox disabled", config.skybox.shader);
                None
            }
            Some(faces) => match Skybox::load(backend, faces) {
                Ok(skybox) => Some((skybox, config.skybox.shader.clone())),
                Err(e) => {
                    log::warn!("Skybox disabled: {e}");
                    None
                }
            },
            None => None,
        };

        let target = OffscreenTarget::create(backend, width, height)?;
        let quad = ScreenQuad::create(backend)?;

        Ok(Self {
            shadow,
            target,
            quad,
            skybox,
            present_shader: config.present.shader.clone(),
            present_depth_shader,
            clear_color: config.engine.clear_color,
            viewport: Viewport::sized(width, height),
        })
    }

    fn create_shadow_stage(
        backend: &mut dyn GraphicsBackend,
        config: &ShadowConfig,
        scene: &Scene,
    ) -> SceneResult<ShadowStage> {
        let shader = match config.technique {
            ShadowTechnique::None => return Ok(ShadowStage::Disabled),
            ShadowTechnique::Directional => &config.depth_shader,
            ShadowTechnique::Omnidirectional => &config.cube_depth_shader,
        };
        if scene.shader(shader).is_none() {
            log::warn!("Depth shader '{shader}' unavailable, shadows disabled");
            return Ok(ShadowStage::Disabled);
        }

        let stage = match config.technique {
            ShadowTechnique::Omnidirectional => ShadowStage::Omni {
                map: CubeShadowMap::create(backend, cube_settings(config))?,
                shader: shader.clone(),
                light: config.point_light.clone(),
            },
            _ => ShadowStage::Directional {
                map: DirectionalShadowMap::create(backend, directional_settings(config))?,
                shader: shader.clone(),
            },
        };
        Ok(stage)
    }

    /// Shadow technique actually running
    pub fn technique(&self) -> ShadowTechnique {
        self.shadow.technique()
    }

    /// Whether a skybox is drawn
    pub fn has_skybox(&self) -> bool {
        self.skybox.is_some()
    }

    /// Current presentation viewport
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Offscreen colour target
    pub fn target(&self) -> &OffscreenTarget {
        &self.target
    }

    /// Follow a drawable resize; zero-sized (minimised) frames are ignored
    pub fn resize(&mut self, backend: &mut dyn GraphicsBackend, width: u32, height: u32) -> SceneResult<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.viewport = Viewport::sized(width, height);
        self.target.resize(backend, width, height)?;
        log::debug!("Pipeline resized to {width}x{height}");
        Ok(())
    }

    /// Render one frame
    ///
    /// Lit-pass lookup errors are returned after the frame has been presented, so one
    /// unassigned model does not blank the screen.
    pub fn render_frame(
        &self,
        backend: &mut dyn GraphicsBackend,
        scene: &mut Scene,
        elapsed_seconds: f32,
    ) -> SceneResult<()> {
        scene.update_cameras(elapsed_seconds);
        let scene = &*scene;

        let point_light = self.capture_shadows(backend, scene)?;

        self.target.begin(backend, self.clear_color);
        if let Some((skybox, shader)) = &self.skybox {
            let program = lookup(scene, shader)?;
            let camera = scene.active_camera()?;
            skybox.draw(backend, program, &camera.view(), &camera.projection());
        }

        match &self.shadow {
            ShadowStage::Disabled => scene.prepare_shaders(backend)?,
            ShadowStage::Directional { map, .. } => {
                map.bind_for_sampling(backend);
                let light_space = map.light_space_matrix();
                scene.prepare_shaders_with(backend, &|backend, program| {
                    program.set_mat4(backend, "mat_light", &light_space);
                    program.set_int(backend, "shadowMap", SHADOW_TEXTURE_UNIT as i32);
                })?;
            }
            ShadowStage::Omni { map, .. } => {
                map.bind_for_sampling(backend);
                let far = map.settings().far;
                scene.prepare_shaders_with(backend, &|backend, program| {
                    program.set_int(backend, "depthMap", SHADOW_TEXTURE_UNIT as i32);
                    program.set_float(backend, "far_plane", far);
                    if let Some(position) = point_light {
                        program.set_vec3(backend, "lightPos", &position);
                    }
                })?;
            }
        }
        let lit = scene.render_models(backend);

        self.present(backend, scene)?;
        lit
    }

    /// Run the configured capture; returns the light position used by a cube capture
    fn capture_shadows(&self, backend: &mut dyn GraphicsBackend, scene: &Scene) -> SceneResult<Option<Vec3>> {
        match &self.shadow {
            ShadowStage::Disabled => Ok(None),
            ShadowStage::Directional { map, shader } => {
                let depth = lookup(scene, shader)?;
                map.begin_capture(backend);
                scene.render_shadow_casters(
                    backend,
                    RenderPassKind::DirectionalShadow,
                    depth,
                    &|backend, program| map.upload_capture_uniforms(backend, program),
                );
                Ok(None)
            }
            ShadowStage::Omni { map, shader, light } => {
                let position = match light {
                    Some(name) => scene
                        .point_light(name)
                        .map(|l| l.position)
                        .ok_or_else(|| SceneError::NotFound {
                            kind: "point light",
                            name: name.clone(),
                        })?,
                    None => match scene.point_lights().next() {
                        Some((_, l)) => l.position,
                        None => {
                            log::trace!("No point light, skipping cube capture");
                            return Ok(None);
                        }
                    },
                };

                let depth = lookup(scene, shader)?;
                map.begin_capture(backend);
                scene.render_shadow_casters(
                    backend,
                    RenderPassKind::PointShadow,
                    depth,
                    &|backend, program| map.upload_capture_uniforms(backend, program, position),
                );
                Ok(Some(position))
            }
        }
    }

    fn present(&self, backend: &mut dyn GraphicsBackend, scene: &Scene) -> SceneResult<()> {
        let (program, texture): (&ShaderProgram, TextureId) =
            match (&self.present_depth_shader, &self.shadow) {
                (Some(shader), ShadowStage::Directional { map, .. }) => {
                    let program = lookup(scene, shader)?;
                    program.activate(backend);
                    program.set_float(backend, "near_plane", map.settings().near);
                    program.set_float(backend, "far_plane", map.settings().far);
                    (program, map.depth_texture())
                }
                _ => (lookup(scene, &self.present_shader)?, self.target.color_texture()),
            };
        self.quad.present(backend, program, texture, self.viewport);
        Ok(())
    }

    /// Delete every target, map and the skybox
    pub fn release(self, backend: &mut dyn GraphicsBackend) {
        match self.shadow {
            ShadowStage::Disabled => {}
            ShadowStage::Directional { map, .. } => map.release(backend),
            ShadowStage::Omni { map, .. } => map.release(backend),
        }
        self.target.release(backend);
        self.quad.release(backend);
        if let Some((skybox, _)) = self.skybox {
            skybox.release(backend);
        }
    }
}

fn lookup<'a>(scene: &'a Scene, shader: &str) -> SceneResult<&'a ShaderProgram> {
    scene.shader(shader).ok_or_else(|| SceneError::NotFound {
        kind: "shader",
        name: shader.to_string(),
    })
}
