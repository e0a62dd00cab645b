//! # Rendering System
//!
//! GPU-facing building blocks for the scene renderer.
//!
//! ## Architecture
//!
//! - **Backend**: [`GraphicsBackend`] is the only seam to the GPU. [`backends::opengl`]
//!   drives a real OpenGL 3.3 core context through `glow`, [`backends::recording`]
//!   captures the same command stream for tests.
//! - **Primitives**: [`Mesh`] and [`Camera`], the smallest drawable and viewing units.
//! - **Programs and textures**: [`ShaderProgram`] wraps a linked program with name-based
//!   uniform writes, [`texture`] turns decoded images into GPU textures.
//! - **Lights**: [`DirectionalLight`] and [`PointLight`] plus the array upload helpers.
//! - **Targets and passes**: [`targets`] holds the offscreen colour target and the
//!   full-screen quad, [`shadow`] the directional and omnidirectional depth captures,
//!   [`skybox`] the environment cube.
//! - **Window**: GLFW window and context creation.
//!
//! ## Resource Lifetime
//!
//! Every GPU object is created with an explicit backend argument and released through a
//! `release(&mut dyn GraphicsBackend)` call. Nothing is freed on drop because dropping
//! happens without access to the context.

pub mod backend;
pub mod backends;
pub mod lighting;
pub mod primitives;
pub mod shader;
pub mod shadow;
pub mod skybox;
pub mod targets;
pub mod texture;
pub mod window;

pub use backend::{
    Attachment, ClearMask, CullMode, FramebufferId, FramebufferStatus, GraphicsBackend,
    ProgramId, ShaderStage, TextureId, TextureTarget, UniformValue, Viewport,
};
pub use lighting::{DirectionalLight, PointLight};
pub use primitives::{Camera, Mesh, Texture, TextureKind, Vertex};
pub use shader::{ShaderError, ShaderProgram, ShaderSources};
pub use window::{Window, WindowError};

/// Texture unit reserved for shadow maps so material units never collide with it
pub const SHADOW_TEXTURE_UNIT: u32 = 8;

/// Rendering errors
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Renderer initialization failed during setup
    ///
    /// Raised when the GL function loader or the context cannot be brought up.
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// Resource creation or management failed
    ///
    /// The driver refused to allocate a buffer, texture, framebuffer or renderbuffer,
    /// or the data handed to it was inconsistent with the requested layout.
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// A framebuffer was incomplete after its attachments were set up
    ///
    /// Always fatal: every pass after it would render into an unusable target.
    #[error("Framebuffer '{target}' is incomplete (status 0x{status:04X})")]
    IncompleteFramebuffer {
        /// Which render target failed
        target: String,
        /// Driver status code
        status: u32,
    },

    /// Backend-specific error occurred
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Check a framebuffer and convert an incomplete status into a fatal error
pub fn ensure_complete(
    backend: &mut dyn GraphicsBackend,
    framebuffer: FramebufferId,
    target: &str,
) -> RenderResult<()> {
    match backend.framebuffer_status(framebuffer) {
        FramebufferStatus::Complete => {
            log::debug!("Framebuffer '{target}' complete");
            Ok(())
        }
        FramebufferStatus::Incomplete(status) => {
            log::error!("Framebuffer '{target}' incomplete: 0x{status:04X}");
            Err(RenderError::IncompleteFramebuffer {
                target: target.to_string(),
                status,
            })
        }
    }
}
