//! # Core Engine Module
//!
//! Application-level configuration shared by the engine and the driver binary.

pub mod config;

pub use config::{
    ApplicationConfig, Config, ConfigError, EngineConfig, PresentConfig, PresentSource,
    SceneFilesConfig, ShaderListConfig, ShaderPaths, ShadowConfig, ShadowTechnique, SkyboxConfig,
    WindowConfig,
};
