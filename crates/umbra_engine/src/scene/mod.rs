//! # Scene
//!
//! The scene is the aggregate root: named registries of models, shader programs,
//! cameras and lights, plus the table that says which program draws which model in
//! which pass. Registries keep insertion order, which fixes the light array slots and
//! the model draw order.
//!
//! ## Frame Flow
//!
//! ```text
//! update_cameras(elapsed)
//!   → render_shadow_casters(pass, depth program)   per shadow pass
//!   → prepare_shaders()                            camera + light uniforms
//!   → render_models()                              lit pass
//! ```
//!
//! [`ShadowPipeline`] drives that sequence together with the render targets;
//! [`Scene::render_scene`] is the plain unshadowed version.
//!
//! ## Failure Handling
//!
//! A shader that fails to build is recorded by name. Models assigned to it are skipped
//! without further errors so the rest of the scene keeps rendering. Lookups that find
//! nothing return [`SceneError::NotFound`] or [`SceneError::Unassigned`].

pub mod loader;
pub mod model;
pub mod pipeline;

#[cfg(test)]
mod tests;

pub use loader::{apply_model_entries, load_scene_files, load_shader_list, SceneLoadReport};
pub use model::Model;
pub use pipeline::{RenderPassKind, ShadowPipeline};

use std::collections::{HashMap, HashSet};
use std::path::Path;

use thiserror::Error;

use crate::assets::{AssetError, ImportedModel};
use crate::config::ConfigError;
use crate::foundation::collections::NamedRegistry;
use crate::render::backend::{CullMode, GraphicsBackend};
use crate::render::lighting::{upload_lights, DirectionalLight, PointLight};
use crate::render::primitives::Camera;
use crate::render::shader::{ShaderError, ShaderProgram, ShaderSources};
use crate::render::RenderError;

/// Scene errors
#[derive(Error, Debug)]
pub enum SceneError {
    /// A named entry does not exist
    #[error("No {kind} named '{name}'")]
    NotFound {
        /// Registry searched
        kind: &'static str,
        /// Requested name
        name: String,
    },

    /// A model has no shader for the pass being drawn
    #[error("Model '{model}' has no shader assigned")]
    Unassigned {
        /// Model name
        model: String,
    },

    /// Camera-dependent work was requested before any camera was added
    #[error("Scene has no active camera")]
    NoActiveCamera,

    /// A shader could not be built
    #[error("Shader '{name}' unavailable: {source}")]
    Shader {
        /// Shader name
        name: String,
        /// Build failure
        #[source]
        source: ShaderError,
    },

    /// Asset import or upload failed
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// GPU resource failure
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Scene list or configuration failure
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SceneError {
    /// Whether the error only names a missing model, shader or assignment
    ///
    /// Frames that hit these still present everything else, so a caller can keep running.
    pub const fn is_missing_entry(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Unassigned { .. })
    }
}

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;

fn not_found(kind: &'static str, name: &str) -> SceneError {
    SceneError::NotFound {
        kind,
        name: name.to_string(),
    }
}

/// Registries and shader assignments for everything that gets drawn
#[derive(Default)]
pub struct Scene {
    models: NamedRegistry<Model>,
    shaders: NamedRegistry<ShaderProgram>,
    failed_shaders: HashSet<String>,
    cameras: NamedRegistry<Camera>,
    directional_lights: NamedRegistry<DirectionalLight>,
    point_lights: NamedRegistry<PointLight>,
    assignments: HashMap<(String, RenderPassKind), String>,
    active_camera: Option<String>,
}

impl Scene {
    /// Empty scene
    pub fn new() -> Self {
        Self::default()
    }

    // Models

    /// Load an OBJ file as `name`, replacing and releasing any model of that name
    pub fn add_model(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        name: &str,
        path: impl AsRef<Path>,
    ) -> SceneResult<&mut Model> {
        let model = Model::load(backend, path)?;
        self.insert_model(backend, name, model)
    }

    /// Upload an already imported model as `name`
    pub fn add_model_from_import(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        name: &str,
        imported: ImportedModel,
    ) -> SceneResult<&mut Model> {
        let model = Model::from_import(backend, imported)?;
        self.insert_model(backend, name, model)
    }

    fn insert_model(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        name: &str,
        model: Model,
    ) -> SceneResult<&mut Model> {
        if let Some(previous) = self.models.insert(name, model) {
            log::debug!("Replacing model '{name}'");
            previous.release(backend);
        }
        self.models.get_mut(name).ok_or_else(|| not_found("model", name))
    }

    /// Release one model and drop its shader assignments
    pub fn remove_model(&mut self, backend: &mut dyn GraphicsBackend, name: &str) -> SceneResult<()> {
        let model = self.models.remove(name).ok_or_else(|| not_found("model", name))?;
        model.release(backend);
        self.assignments.retain(|(model_name, _), _| model_name != name);
        Ok(())
    }

    /// Model by name
    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    /// Mutable model by name
    pub fn model_mut(&mut self, name: &str) -> Option<&mut Model> {
        self.models.get_mut(name)
    }

    /// Models in draw order
    pub fn models(&self) -> impl Iterator<Item = (&str, &Model)> {
        self.models.iter()
    }

    // Shaders

    /// Compile and register a program
    ///
    /// On failure the name is recorded as failed, the diagnostic is logged and returned,
    /// and models assigned to it are skipped when drawing.
    pub fn add_shader(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        name: &str,
        sources: ShaderSources,
    ) -> SceneResult<()> {
        match ShaderProgram::compile(backend, sources) {
            Ok(program) => {
                self.register_shader(backend, name, program);
                Ok(())
            }
            Err(e) => Err(self.record_shader_failure(name, e)),
        }
    }

    /// Read stage files, then compile and register as [`Scene::add_shader`] does
    pub fn add_shader_from_files(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        name: &str,
        vertex: &Path,
        fragment: &Path,
        geometry: Option<&Path>,
    ) -> SceneResult<()> {
        match ShaderSources::from_files(vertex, fragment, geometry) {
            Ok(sources) => self.add_shader(backend, name, sources),
            Err(e) => Err(self.record_shader_failure(name, e)),
        }
    }

    fn register_shader(&mut self, backend: &mut dyn GraphicsBackend, name: &str, program: ShaderProgram) {
        self.failed_shaders.remove(name);
        if let Some(previous) = self.shaders.insert(name, program) {
            previous.release(backend);
        }
        log::info!("Shader '{name}' ready");
    }

    fn record_shader_failure(&mut self, name: &str, source: ShaderError) -> SceneError {
        log::error!("Shader '{name}' failed to build: {source}");
        self.failed_shaders.insert(name.to_string());
        SceneError::Shader {
            name: name.to_string(),
            source,
        }
    }

    /// Program by name
    pub fn shader(&self, name: &str) -> Option<&ShaderProgram> {
        self.shaders.get(name)
    }

    /// Whether `name` failed to build
    pub fn is_shader_failed(&self, name: &str) -> bool {
        self.failed_shaders.contains(name)
    }

    /// Set the lit-pass shader of a model
    ///
    /// Neither name is checked here; drawing reports what is missing.
    pub fn assign_shader(&mut self, model: &str, shader: &str) {
        self.assign_pass_shader(model, RenderPassKind::Lit, shader);
    }

    /// Set the shader a model is drawn with in `pass`, overwriting any earlier choice
    pub fn assign_pass_shader(&mut self, model: &str, pass: RenderPassKind, shader: &str) {
        self.assignments
            .insert((model.to_string(), pass), shader.to_string());
    }

    /// Shader name assigned to a model for `pass`
    pub fn assigned_shader(&self, model: &str, pass: RenderPassKind) -> Option<&str> {
        self.assignments
            .get(&(model.to_string(), pass))
            .map(String::as_str)
    }

    // Cameras

    /// Register a camera; the first one becomes active
    pub fn add_camera(&mut self, name: &str, camera: Camera) {
        self.cameras.insert(name, camera);
        if self.active_camera.is_none() {
            self.active_camera = Some(name.to_string());
        }
    }

    /// Make `name` the active camera
    pub fn set_active_camera(&mut self, name: &str) -> SceneResult<()> {
        if !self.cameras.contains(name) {
            return Err(not_found("camera", name));
        }
        self.active_camera = Some(name.to_string());
        Ok(())
    }

    /// Camera by name
    pub fn camera(&self, name: &str) -> Option<&Camera> {
        self.cameras.get(name)
    }

    /// Mutable camera by name
    pub fn camera_mut(&mut self, name: &str) -> Option<&mut Camera> {
        self.cameras.get_mut(name)
    }

    /// Name of the active camera
    pub fn active_camera_name(&self) -> Option<&str> {
        self.active_camera.as_deref()
    }

    /// The active camera
    pub fn active_camera(&self) -> SceneResult<&Camera> {
        self.active_camera
            .as_deref()
            .and_then(|name| self.cameras.get(name))
            .ok_or(SceneError::NoActiveCamera)
    }

    /// The active camera, mutably
    pub fn active_camera_mut(&mut self) -> SceneResult<&mut Camera> {
        match self.active_camera.as_deref() {
            Some(name) => self.cameras.get_mut(name).ok_or(SceneError::NoActiveCamera),
            None => Err(SceneError::NoActiveCamera),
        }
    }

    /// Recompute every camera's matrices for this frame
    pub fn update_cameras(&mut self, elapsed_seconds: f32) {
        for (_, camera) in self.cameras.iter_mut() {
            camera.update(elapsed_seconds);
        }
    }

    // Lights

    /// Register a directional light; insertion order fixes its `dLights` slot
    pub fn add_directional_light(&mut self, name: &str, light: DirectionalLight) {
        self.directional_lights.insert(name, light);
    }

    /// Register a point light; insertion order fixes its `pLights` slot
    pub fn add_point_light(&mut self, name: &str, light: PointLight) {
        self.point_lights.insert(name, light);
    }

    /// Directional light by name
    pub fn directional_light(&self, name: &str) -> Option<&DirectionalLight> {
        self.directional_lights.get(name)
    }

    /// Mutable directional light by name
    pub fn directional_light_mut(&mut self, name: &str) -> Option<&mut DirectionalLight> {
        self.directional_lights.get_mut(name)
    }

    /// Point light by name
    pub fn point_light(&self, name: &str) -> Option<&PointLight> {
        self.point_lights.get(name)
    }

    /// Mutable point light by name
    pub fn point_light_mut(&mut self, name: &str) -> Option<&mut PointLight> {
        self.point_lights.get_mut(name)
    }

    /// Point lights in slot order
    pub fn point_lights(&self) -> impl Iterator<Item = (&str, &PointLight)> {
        self.point_lights.iter()
    }

    // Drawing

    /// Upload camera and light uniforms to every program
    pub fn prepare_shaders(&self, backend: &mut dyn GraphicsBackend) -> SceneResult<()> {
        self.prepare_shaders_with(backend, &|_, _| {})
    }

    /// [`Scene::prepare_shaders`] plus extra per-program uniforms
    pub fn prepare_shaders_with(
        &self,
        backend: &mut dyn GraphicsBackend,
        extra: &dyn Fn(&mut dyn GraphicsBackend, &ShaderProgram),
    ) -> SceneResult<()> {
        let camera = self.active_camera()?;
        for (_, program) in self.shaders.iter() {
            program.activate(backend);
            program.set_vec3(backend, "cameraPos", &camera.position());
            program.set_mat4(backend, "mat_view", &camera.view());
            program.set_mat4(backend, "mat_proj", &camera.projection());
            self.upload_lights_to(backend, program);
            extra(backend, program);
        }
        Ok(())
    }

    /// Upload every directional light, then every point light, to one program
    pub fn prepare_lights(&self, backend: &mut dyn GraphicsBackend, shader: &str) -> SceneResult<()> {
        let program = self.shaders.get(shader).ok_or_else(|| not_found("shader", shader))?;
        program.activate(backend);
        self.upload_lights_to(backend, program);
        Ok(())
    }

    fn upload_lights_to(&self, backend: &mut dyn GraphicsBackend, program: &ShaderProgram) {
        upload_lights(
            backend,
            program,
            self.directional_lights.iter().map(|(_, light)| light),
            self.point_lights.iter().map(|(_, light)| light),
        );
    }

    /// Draw every model with its lit-pass shader
    ///
    /// Models whose shader failed to build are skipped. A missing assignment or shader
    /// does not stop the other models from drawing; the first such error is returned
    /// once all models have been visited.
    pub fn render_models(&self, backend: &mut dyn GraphicsBackend) -> SceneResult<()> {
        let mut first_error = None;

        for (name, model) in self.models.iter() {
            let program = match self.resolve_shader(name, RenderPassKind::Lit) {
                Ok(Some(program)) => program,
                Ok(None) => continue,
                Err(e) => {
                    log::trace!("Skipping model '{name}': {e}");
                    first_error.get_or_insert(e);
                    continue;
                }
            };

            program.activate(backend);
            program.set_int(backend, "material.diffuse", 0);
            program.set_int(backend, "material.specular", 1);
            program.set_float(backend, "material.shininess", 256.0);
            program.set_vec3(backend, "output_color", &model.color());
            program.set(backend, "has_diffuse", model.has_diffuse_texture());
            program.set(backend, "has_specular", model.has_specular_texture());
            program.set_mat4(backend, "mat_model", &model.model_matrix());

            backend.set_cull_mode(CullMode::Default);
            model.draw(backend, program);
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Draw shadow casters into the bound depth target
    ///
    /// Each model uses its shader for `pass` when one is assigned and built, otherwise
    /// `fallback`. `pass_uniforms` runs after every program switch. Models apply their
    /// capture culling policy for their own draw only. Returns the number of models drawn.
    pub fn render_shadow_casters(
        &self,
        backend: &mut dyn GraphicsBackend,
        pass: RenderPassKind,
        fallback: &ShaderProgram,
        pass_uniforms: &dyn Fn(&mut dyn GraphicsBackend, &ShaderProgram),
    ) -> usize {
        let mut drawn = 0;
        let mut current = None;

        for (name, model) in self.models.iter().filter(|(_, m)| m.casts_shadows()) {
            let program = match self.resolve_shader(name, pass) {
                Ok(Some(program)) => program,
                Ok(None) | Err(SceneError::Unassigned { .. }) => fallback,
                Err(e) => {
                    log::warn!("Shadow caster '{name}' drawn with the fallback shader: {e}");
                    fallback
                }
            };

            if current != Some(program.id()) {
                pass_uniforms(backend, program);
                current = Some(program.id());
            }
            program.set_mat4(backend, "mat_model", &model.model_matrix());

            backend.set_cull_mode(model.capture_cull());
            model.draw(backend, program);
            backend.set_cull_mode(CullMode::Default);
            drawn += 1;
        }

        log::trace!("{drawn} shadow casters drawn for {pass:?}");
        drawn
    }

    /// Program for a model in `pass`
    ///
    /// `Ok(None)` means the assigned shader failed to build and the model is skipped.
    fn resolve_shader(&self, model: &str, pass: RenderPassKind) -> SceneResult<Option<&ShaderProgram>> {
        let shader = self
            .assigned_shader(model, pass)
            .ok_or_else(|| SceneError::Unassigned {
                model: model.to_string(),
            })?;
        if self.failed_shaders.contains(shader) {
            return Ok(None);
        }
        self.shaders
            .get(shader)
            .map(Some)
            .ok_or_else(|| not_found("shader", shader))
    }

    /// Update cameras, then draw every model with its lit-pass shader
    pub fn render_scene(&mut self, backend: &mut dyn GraphicsBackend, elapsed_seconds: f32) -> SceneResult<()> {
        self.update_cameras(elapsed_seconds);
        backend.set_depth_test(true);
        self.render_models(backend)
    }

    // Teardown

    /// Release everything: shaders, then models, then cameras, then lights
    pub fn clear_all(&mut self, backend: &mut dyn GraphicsBackend) {
        self.clear_shaders(backend);
        self.clear_models(backend);
        self.clear_cameras();
        self.clear_lights();
    }

    /// Release every program and forget recorded failures
    pub fn clear_shaders(&mut self, backend: &mut dyn GraphicsBackend) {
        for (_, program) in self.shaders.drain() {
            program.release(backend);
        }
        self.failed_shaders.clear();
    }

    /// Release every model and its assignments
    pub fn clear_models(&mut self, backend: &mut dyn GraphicsBackend) {
        for (_, model) in self.models.drain() {
            model.release(backend);
        }
        self.assignments.clear();
    }

    /// Drop every camera
    pub fn clear_cameras(&mut self) {
        self.cameras.drain().for_each(drop);
        self.active_camera = None;
    }

    /// Drop every light
    pub fn clear_lights(&mut self) {
        self.directional_lights.drain().for_each(drop);
        self.point_lights.drain().for_each(drop);
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        if !self.models.is_empty() || !self.shaders.is_empty() {
            log::warn!(
                "Scene dropped with {} models and {} shaders still on the GPU; call clear_all first",
                self.models.len(),
                self.shaders.len()
            );
        }
    }
}
