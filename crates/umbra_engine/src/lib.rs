//! # Umbra Engine
//!
//! Scene composition and shadow-mapped multi-pass rendering on OpenGL 3.3.
//!
//! ## Features
//!
//! - **Scene registries**: named models, shaders, cameras and lights in insertion order
//! - **Shadows**: directional depth maps and omnidirectional depth cubes
//! - **Multi-pass frames**: shadow capture, lit offscreen pass, full-screen presentation
//! - **Asset loading**: Wavefront OBJ/MTL through `tobj`, textures through `image`
//! - **Data-driven scenes**: tab-separated model and light lists, TOML or RON settings
//!
//! All GPU work goes through [`render::GraphicsBackend`], so everything above the
//! OpenGL backend can be driven by the recording backend in tests.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use umbra_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApplicationConfig::load_or_default("app.toml")?;
//!     let mut window = Window::new(&config.window)?;
//!     let mut backend = window.create_backend()?;
//!
//!     let mut scene = Scene::new();
//!     load_scene_files(&mut scene, &mut backend, &config.scene, &config.shaders)?;
//!     scene.add_camera("main", Camera::new());
//!
//!     let (width, height) = window.framebuffer_size();
//!     let pipeline = ShadowPipeline::new(&mut backend, &config, &scene, width, height)?;
//!     while !window.should_close() {
//!         window.poll_events();
//!         pipeline.render_frame(&mut backend, &mut scene, 0.016)?;
//!         window.swap_buffers();
//!     }
//!
//!     pipeline.release(&mut backend);
//!     scene.clear_all(&mut backend);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss
)]

pub mod core;

pub mod assets;
pub mod config;
pub mod foundation;
pub mod input;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{import_obj, ImportedModel},
        core::config::{ApplicationConfig, Config, PresentSource, ShadowTechnique},
        foundation::{
            math::{Mat4, Vec3},
            time::Timer,
        },
        input::{InputAction, InputManager, KeyCode},
        render::{
            backends::GlBackend, Camera, CullMode, DirectionalLight, GraphicsBackend, PointLight,
            ShaderSources, Window,
        },
        scene::{load_scene_files, Model, RenderPassKind, Scene, SceneError, ShadowPipeline},
    };
}
