//! Offscreen render target and full-screen presentation
//!
//! The lit pass renders into an [`OffscreenTarget`] (RGB colour texture plus a
//! depth/stencil renderbuffer). [`ScreenQuad`] then draws that colour texture, or any
//! other 2D texture, over the whole default framebuffer.

use crate::render::backend::{
    Attachment, ClearMask, FramebufferId, GpuGeometry, GraphicsBackend, PixelFormat,
    RenderbufferFormat, RenderbufferId, TextureDesc, TextureId, TextureTarget, VertexAttribute,
    VertexLayout, Viewport,
};
use crate::render::shader::ShaderProgram;
use crate::render::{ensure_complete, RenderResult};

/// Colour framebuffer the lit pass renders into
#[derive(Debug)]
pub struct OffscreenTarget {
    framebuffer: FramebufferId,
    color: TextureId,
    depth_stencil: RenderbufferId,
    width: u32,
    height: u32,
}

impl OffscreenTarget {
    /// Create a complete target of the given size
    ///
    /// An incomplete framebuffer is fatal and is reported after releasing the partial target.
    pub fn create(backend: &mut dyn GraphicsBackend, width: u32, height: u32) -> RenderResult<Self> {
        let framebuffer = backend.create_framebuffer()?;
        let color = backend.create_texture_2d(
            &TextureDesc::render_target(width, height, PixelFormat::Rgb),
            None,
        )?;
        let depth_stencil =
            backend.create_renderbuffer(RenderbufferFormat::Depth24Stencil8, width, height)?;

        backend.attach_texture(framebuffer, Attachment::Color0, TextureTarget::Texture2D, color);
        backend.attach_renderbuffer(framebuffer, Attachment::DepthStencil, depth_stencil);

        let target = Self {
            framebuffer,
            color,
            depth_stencil,
            width,
            height,
        };
        if let Err(e) = ensure_complete(backend, framebuffer, "offscreen colour") {
            target.release(backend);
            return Err(e);
        }

        log::info!("Offscreen target {}x{} ready", width, height);
        Ok(target)
    }

    /// Recreate at a new size; a zero-sized request keeps the current target
    pub fn resize(&mut self, backend: &mut dyn GraphicsBackend, width: u32, height: u32) -> RenderResult<()> {
        if width == 0 || height == 0 || (width, height) == (self.width, self.height) {
            return Ok(());
        }
        let replacement = Self::create(backend, width, height)?;
        let old = std::mem::replace(self, replacement);
        old.release(backend);
        Ok(())
    }

    /// Bind, set the viewport to the full target and clear colour and depth
    pub fn begin(&self, backend: &mut dyn GraphicsBackend, clear_color: [f32; 4]) {
        backend.bind_framebuffer(Some(self.framebuffer));
        backend.set_viewport(self.viewport());
        backend.set_clear_color(clear_color);
        backend.clear(ClearMask::COLOR | ClearMask::DEPTH);
        backend.set_depth_test(true);
    }

    /// Full-target viewport
    pub fn viewport(&self) -> Viewport {
        Viewport::sized(self.width, self.height)
    }

    /// Framebuffer handle
    pub fn framebuffer(&self) -> FramebufferId {
        self.framebuffer
    }

    /// Colour texture
    pub fn color_texture(&self) -> TextureId {
        self.color
    }

    /// Size in pixels
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Delete the framebuffer and its attachments
    pub fn release(self, backend: &mut dyn GraphicsBackend) {
        backend.delete_framebuffer(self.framebuffer);
        backend.delete_texture(self.color);
        backend.delete_renderbuffer(self.depth_stencil);
    }
}

const QUAD_LAYOUT: VertexLayout = VertexLayout {
    stride: 16,
    attributes: &[
        VertexAttribute {
            location: 0,
            components: 2,
            offset: 0,
        },
        VertexAttribute {
            location: 1,
            components: 2,
            offset: 8,
        },
    ],
};

// Two triangles in NDC, interleaved as x, y, u, v.
#[rustfmt::skip]
const QUAD_VERTICES: [f32; 24] = [
    -1.0,  1.0,  0.0, 1.0,
    -1.0, -1.0,  0.0, 0.0,
     1.0, -1.0,  1.0, 0.0,

    -1.0,  1.0,  0.0, 1.0,
     1.0, -1.0,  1.0, 0.0,
     1.0,  1.0,  1.0, 1.0,
];

/// Full-screen textured quad
#[derive(Debug)]
pub struct ScreenQuad {
    geometry: GpuGeometry,
}

impl ScreenQuad {
    /// Upload the quad
    pub fn create(backend: &mut dyn GraphicsBackend) -> RenderResult<Self> {
        let geometry =
            backend.create_geometry(bytemuck::cast_slice(&QUAD_VERTICES), &QUAD_LAYOUT, None)?;
        Ok(Self { geometry })
    }

    /// Draw `texture` over the default framebuffer with `program`
    ///
    /// The program samples unit 0 through `screenTexture`. Depth testing is disabled
    /// for the draw and re-enabled afterwards.
    pub fn present(
        &self,
        backend: &mut dyn GraphicsBackend,
        program: &ShaderProgram,
        texture: TextureId,
        viewport: Viewport,
    ) {
        backend.bind_framebuffer(None);
        backend.set_viewport(viewport);
        backend.set_clear_color([1.0, 1.0, 1.0, 1.0]);
        backend.clear(ClearMask::COLOR);
        backend.set_depth_test(false);

        program.activate(backend);
        program.set_int(backend, "screenTexture", 0);
        backend.bind_texture(0, TextureTarget::Texture2D, Some(texture));
        backend.draw_geometry(&self.geometry);

        backend.set_depth_test(true);
    }

    /// Delete the quad geometry
    pub fn release(self, backend: &mut dyn GraphicsBackend) {
        backend.delete_geometry(self.geometry);
    }
}
