//! Window management using GLFW
//!
//! Creates an OpenGL 3.3 core context and exposes the event stream and key state the
//! input layer consumes.

#![allow(unsafe_code)]

use glfw::Context;
use thiserror::Error;

use crate::core::config::WindowConfig;
use crate::render::backends::GlBackend;
use crate::render::RenderResult;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not be initialised
    #[error("GLFW initialization failed: {0}")]
    InitializationFailed(String),

    /// The window or its context could not be created
    #[error("Window creation failed")]
    CreationFailed,
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// GLFW window owning the current GL context
pub struct Window {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

impl Window {
    /// Open a window, make its context current and capture the cursor
    pub fn new(config: &WindowConfig) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|e| WindowError::InitializationFailed(e.to_string()))?;

        glfw.window_hint(glfw::WindowHint::ContextVersion(3, 3));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(config.width, config.height, &config.title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.make_current();
        glfw.set_swap_interval(if config.vsync {
            glfw::SwapInterval::Sync(1)
        } else {
            glfw::SwapInterval::None
        });

        window.set_cursor_mode(glfw::CursorMode::Disabled);
        window.set_key_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_scroll_polling(true);
        window.set_framebuffer_size_polling(true);
        window.set_close_polling(true);

        log::info!("Window '{}' {}x{} created", config.title, config.width, config.height);
        Ok(Self {
            glfw,
            window,
            events,
        })
    }

    /// Load GL entry points through this window's context
    pub fn create_backend(&mut self) -> RenderResult<GlBackend> {
        let window = &mut self.window;
        // SAFETY: the context was made current in `new` and lives as long as `self`.
        unsafe { GlBackend::from_loader(|name| window.get_proc_address(name) as *const _) }
    }

    /// Whether a close was requested
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Request or cancel closing
    pub fn set_should_close(&mut self, should_close: bool) {
        self.window.set_should_close(should_close);
    }

    /// Pump the platform event queue
    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
    }

    /// Drain events gathered by the last poll
    pub fn flush_events(&self) -> impl Iterator<Item = glfw::WindowEvent> + '_ {
        glfw::flush_messages(&self.events).map(|(_, event)| event)
    }

    /// Present the back buffer
    pub fn swap_buffers(&mut self) {
        self.window.swap_buffers();
    }

    /// Drawable size in pixels
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width.max(0) as u32, height.max(0) as u32)
    }
}
