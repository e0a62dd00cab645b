//! Umbra scene viewer
//!
//! Loads the shader, model and light lists named in `resources/app.toml`, then flies a
//! camera through the shadowed scene. W/A/S/D move, Space and Left Ctrl rise and sink,
//! the mouse looks around, the wheel zooms and Escape quits.

use std::path::PathBuf;

use thiserror::Error;
use umbra_engine::core::config::{ApplicationConfig, ConfigError};
use umbra_engine::foundation::{logging, time::Timer};
use umbra_engine::input::{InputAction, InputManager};
use umbra_engine::render::backends::GlBackend;
use umbra_engine::render::primitives::Camera;
use umbra_engine::render::{RenderError, Window, WindowError};
use umbra_engine::scene::{load_scene_files, Scene, SceneError, ShadowPipeline};

const DEFAULT_CONFIG: &str = "resources/app.toml";
const FPS_LOG_INTERVAL: u64 = 600;

/// Setup and frame failures that end the program
#[derive(Error, Debug)]
enum AppError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("window: {0}")]
    Window(#[from] WindowError),

    #[error("render: {0}")]
    Render(#[from] RenderError),

    #[error("scene: {0}")]
    Scene(#[from] SceneError),
}

/// Everything the frame loop touches
struct App {
    window: Window,
    backend: GlBackend,
    scene: Scene,
    pipeline: ShadowPipeline,
    input: InputManager,
    timer: Timer,
    reported_missing: bool,
}

impl App {
    fn new(config: &ApplicationConfig) -> Result<Self, AppError> {
        log::info!("Creating window...");
        let mut window = Window::new(&config.window)?;
        let mut backend = window.create_backend()?;

        let mut scene = Scene::new();
        let (width, height) = window.framebuffer_size();
        let mut camera = Camera::new();
        camera.set_viewport_size(width, height);
        scene.add_camera("main", camera);

        let report = match load_scene_files(&mut scene, &mut backend, &config.scene, &config.shaders) {
            Ok(report) => report,
            Err(e) => {
                scene.clear_all(&mut backend);
                return Err(e.into());
            }
        };
        if !report.shaders_failed.is_empty() || !report.models_failed.is_empty() {
            log::warn!(
                "Running degraded: shaders {:?}, models {:?} failed",
                report.shaders_failed,
                report.models_failed
            );
        }

        let pipeline = match ShadowPipeline::new(&mut backend, config, &scene, width, height) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                scene.clear_all(&mut backend);
                return Err(e.into());
            }
        };
        log::info!("Shadow technique: {:?}", pipeline.technique());

        Ok(Self {
            window,
            backend,
            scene,
            pipeline,
            input: InputManager::new(),
            timer: Timer::new(),
            reported_missing: false,
        })
    }

    fn run(&mut self) -> Result<(), AppError> {
        log::info!("Entering frame loop");

        while !self.window.should_close() {
            self.timer.update();
            let elapsed = self.timer.delta_time();

            self.window.poll_events();
            let events: Vec<_> = self.window.flush_events().collect();
            for event in &events {
                match self.input.handle_window_event(event) {
                    InputAction::None => {}
                    InputAction::Quit => self.window.set_should_close(true),
                    InputAction::Resize(width, height) => self.resize(width, height)?,
                }
            }

            self.input
                .apply_to_camera(self.scene.active_camera_mut()?, elapsed);

            match self
                .pipeline
                .render_frame(&mut self.backend, &mut self.scene, elapsed)
            {
                Ok(()) => {}
                Err(e) if e.is_missing_entry() => {
                    if !self.reported_missing {
                        log::warn!("Frame drawn without some models: {e}");
                        self.reported_missing = true;
                    }
                }
                Err(e) => return Err(e.into()),
            }
            self.window.swap_buffers();

            if self.timer.frame_count() % FPS_LOG_INTERVAL == 0 {
                log::debug!("{:.1} fps", self.timer.average_fps());
            }
        }

        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), AppError> {
        self.pipeline.resize(&mut self.backend, width, height)?;
        self.scene.active_camera_mut()?.set_viewport_size(width, height);
        Ok(())
    }

    /// Release every GPU object while the context is still current
    fn shutdown(self) {
        let Self {
            window,
            mut backend,
            mut scene,
            pipeline,
            ..
        } = self;
        pipeline.release(&mut backend);
        scene.clear_all(&mut backend);
        log::info!("Released all GPU resources");
        drop(window);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);
    let config = ApplicationConfig::load_or_default(&config_path)?;

    logging::init(&config.engine.log_level);
    log::info!("Starting Umbra with {:?}", config_path);

    let mut app = App::new(&config)?;
    let result = app.run();
    app.shutdown();

    match result {
        Ok(()) => {
            log::info!("Umbra exited cleanly");
            Ok(())
        }
        Err(e) => {
            log::error!("Umbra failed: {e}");
            Err(e.into())
        }
    }
}
