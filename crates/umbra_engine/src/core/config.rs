//! # Application Configuration
//!
//! Structured settings loaded through the [`Config`] trait from TOML or RON. Scene
//! content itself (models, lights, shader names) lives in the tab-separated lists
//! referenced by [`SceneFilesConfig`].
//!
//! ## Configuration Categories
//!
//! - **Window**: title, size, vsync
//! - **Engine**: log level and clear colour
//! - **Scene files**: where the model, light and shader lists live
//! - **Shader list**: how a shader base name maps to stage files
//! - **Shadows**: technique, map resolution and light frustum
//! - **Presentation**: full-screen quad shader and what it shows
//! - **Skybox**: optional cube-map faces
//!
//! Every section has defaults, so a partial file only overrides what it names.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

/// # Window Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial width in screen coordinates
    pub width: u32,
    /// Initial height in screen coordinates
    pub height: u32,
    /// Wait for vertical sync when presenting
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Umbra".to_string(),
            width: 800,
            height: 600,
            vsync: true,
        }
    }
}

/// # Engine Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fallback log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Clear colour of the offscreen target
    pub clear_color: [f32; 4],
}

impl EngineConfig {
    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            clear_color: [0.1, 0.1, 0.1, 1.0],
        }
    }
}

/// # Scene List Files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneFilesConfig {
    /// Model list
    pub models: PathBuf,
    /// Point-light list
    pub point_lights: PathBuf,
    /// Directional-light list
    pub directional_lights: PathBuf,
    /// Shader name list
    pub shaders: PathBuf,
    /// Lit-pass shader for model rows that do not name one
    pub default_shader: String,
}

impl Default for SceneFilesConfig {
    fn default() -> Self {
        Self {
            models: PathBuf::from("resources/models.tsv"),
            point_lights: PathBuf::from("resources/point_lights.tsv"),
            directional_lights: PathBuf::from("resources/directional_lights.tsv"),
            shaders: PathBuf::from("resources/shaders.txt"),
            default_shader: "standard".to_string(),
        }
    }
}

/// Stage files resolved for one shader name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderPaths {
    /// Vertex stage file
    pub vertex: PathBuf,
    /// Fragment stage file
    pub fragment: PathBuf,
    /// Geometry stage file, when one exists on disk
    pub geometry: Option<PathBuf>,
}

/// # Shader File Naming
///
/// A base name `standard` resolves to `{directory}/{vertex_prefix}_standard.{extension}`
/// and the matching fragment file. A geometry file following the same pattern is
/// attached only if it exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderListConfig {
    /// Directory holding the stage files
    pub directory: PathBuf,
    /// Vertex file prefix
    pub vertex_prefix: String,
    /// Fragment file prefix
    pub fragment_prefix: String,
    /// Geometry file prefix
    pub geometry_prefix: String,
    /// File extension without the dot
    pub extension: String,
}

impl ShaderListConfig {
    fn stage_path(&self, prefix: &str, name: &str) -> PathBuf {
        self.directory
            .join(format!("{prefix}_{name}.{}", self.extension))
    }

    /// Resolve stage files for `name`
    pub fn resolve(&self, name: &str) -> ShaderPaths {
        let geometry = self.stage_path(&self.geometry_prefix, name);
        ShaderPaths {
            vertex: self.stage_path(&self.vertex_prefix, name),
            fragment: self.stage_path(&self.fragment_prefix, name),
            geometry: geometry.is_file().then_some(geometry),
        }
    }
}

impl Default for ShaderListConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("shaders"),
            vertex_prefix: "vertex".to_string(),
            fragment_prefix: "fragment".to_string(),
            geometry_prefix: "geometry".to_string(),
            extension: "glsl".to_string(),
        }
    }
}

/// Shadow technique for the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowTechnique {
    /// No shadow pass
    None,
    /// Orthographic shadow map from a fixed light position
    #[default]
    Directional,
    /// Cube shadow map around a point light
    Omnidirectional,
}

/// # Shadow Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Which capture runs each frame
    pub technique: ShadowTechnique,
    /// Square map resolution in texels
    pub resolution: u32,
    /// Half extent of the orthographic light frustum
    pub ortho_extent: f32,
    /// Directional near plane
    pub near: f32,
    /// Directional far plane
    pub far: f32,
    /// Position the directional shadow is cast from, looking at the origin
    pub light_position: [f32; 3],
    /// Cube capture near plane
    pub cube_near: f32,
    /// Cube capture far plane, also the distance normaliser
    pub cube_far: f32,
    /// Point light whose position drives the cube capture; the first point light when unset
    pub point_light: Option<String>,
    /// Depth-only shader for the directional capture
    pub depth_shader: String,
    /// Three-stage depth shader for the cube capture
    pub cube_depth_shader: String,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            technique: ShadowTechnique::Directional,
            resolution: 1024,
            ortho_extent: 10.0,
            near: 1.0,
            far: 7.5,
            light_position: [-2.0, 4.0, -1.0],
            cube_near: 1.0,
            cube_far: 25.0,
            point_light: None,
            depth_shader: "depth".to_string(),
            cube_depth_shader: "depth_cube".to_string(),
        }
    }
}

/// What the final full-screen pass shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentSource {
    /// The lit offscreen colour target
    #[default]
    Color,
    /// The directional shadow map, for debugging the capture
    ShadowDepth,
}

/// # Presentation Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentConfig {
    /// Full-screen quad shader
    pub shader: String,
    /// Depth visualisation shader used with [`PresentSource::ShadowDepth`]
    pub depth_shader: String,
    /// What to present
    pub source: PresentSource,
}

impl Default for PresentConfig {
    fn default() -> Self {
        Self {
            shader: "quad".to_string(),
            depth_shader: "quad_depth".to_string(),
            source: PresentSource::Color,
        }
    }
}

/// # Skybox Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyboxConfig {
    /// Faces in +X, -X, +Y, -Y, +Z, -Z order; no skybox when unset
    pub faces: Option<[PathBuf; 6]>,
    /// Skybox shader name
    pub shader: String,
}

impl Default for SkyboxConfig {
    fn default() -> Self {
        Self {
            faces: None,
            shader: "skybox".to_string(),
        }
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all subsystems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Window settings
    pub window: WindowConfig,
    /// Engine core settings
    pub engine: EngineConfig,
    /// Scene list locations
    pub scene: SceneFilesConfig,
    /// Shader file naming
    pub shaders: ShaderListConfig,
    /// Shadow settings
    pub shadows: ShadowConfig,
    /// Presentation settings
    pub present: PresentConfig,
    /// Skybox settings
    pub skybox: SkyboxConfig,
}

impl ApplicationConfig {
    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No configuration at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid(message));

        if self.window.width == 0 || self.window.height == 0 {
            return invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            ));
        }
        if self.engine.log_level.parse::<log::LevelFilter>().is_err() {
            return invalid(format!("unknown log level '{}'", self.engine.log_level));
        }

        let shadows = &self.shadows;
        if shadows.resolution == 0 {
            return invalid("shadow resolution must be non-zero".to_string());
        }
        if shadows.ortho_extent <= 0.0 {
            return invalid("shadow ortho_extent must be positive".to_string());
        }
        if !(0.0 < shadows.near && shadows.near < shadows.far) {
            return invalid(format!(
                "shadow planes must satisfy 0 < near < far, got {} and {}",
                shadows.near, shadows.far
            ));
        }
        if !(0.0 < shadows.cube_near && shadows.cube_near < shadows.cube_far) {
            return invalid(format!(
                "cube shadow planes must satisfy 0 < near < far, got {} and {}",
                shadows.cube_near, shadows.cube_far
            ));
        }
        if self.shaders.extension.is_empty() {
            return invalid("shader extension must not be empty".to_string());
        }
        Ok(())
    }
}

impl Config for ApplicationConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ApplicationConfig::default();
        config.validate().unwrap();
        assert_eq!((config.window.width, config.window.height), (800, 600));
        assert_eq!(config.shadows.resolution, 1024);
        assert_eq!(config.shadows.light_position, [-2.0, 4.0, -1.0]);
        assert_eq!(config.shadows.cube_far, 25.0);
    }

    #[test]
    fn test_partial_toml_overrides_only_named_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.toml");
        std::fs::write(
            &path,
            "[shadows]\ntechnique = \"omnidirectional\"\nresolution = 2048\n\n[window]\ntitle = \"test\"\n",
        )
        .unwrap();

        let config = ApplicationConfig::load_or_default(&path).unwrap();
        assert_eq!(config.shadows.technique, ShadowTechnique::Omnidirectional);
        assert_eq!(config.shadows.resolution, 2048);
        assert_eq!(config.shadows.far, 7.5);
        assert_eq!(config.window.title, "test");
        assert_eq!(config.window.width, 800);
    }

    #[test]
    fn test_invalid_planes_are_rejected() {
        let mut config = ApplicationConfig::default();
        config.shadows.near = 10.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ApplicationConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.present.source, PresentSource::Color);
    }

    #[test]
    fn test_shader_paths_attach_geometry_only_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let config = ShaderListConfig {
            directory: dir.path().to_path_buf(),
            ..Default::default()
        };
        std::fs::write(dir.path().join("geometry_depth_cube.glsl"), "").unwrap();

        let standard = config.resolve("standard");
        assert_eq!(standard.vertex, dir.path().join("vertex_standard.glsl"));
        assert_eq!(standard.fragment, dir.path().join("fragment_standard.glsl"));
        assert_eq!(standard.geometry, None);

        let cube = config.resolve("depth_cube");
        assert_eq!(cube.geometry, Some(dir.path().join("geometry_depth_cube.glsl")));
    }
}
