//! Graphics backend abstraction
//!
//! Everything the scene and the render passes need from the GPU goes through
//! [`GraphicsBackend`]. The trait mirrors the OpenGL object model (programs, vertex
//! arrays, textures, framebuffers and renderbuffers addressed by opaque handles) so the
//! production implementation in [`super::backends::opengl`] stays a thin translation
//! layer, while [`super::backends::recording`] captures the same calls for headless tests.
//!
//! Handles are plain `Copy` ids. Whoever created an object is responsible for handing it
//! back to the matching `delete_*` call; nothing here is reference counted.

use std::num::NonZeroU32;

use bitflags::bitflags;

use super::RenderError;
use crate::foundation::math::{Mat4, Vec3};

macro_rules! gpu_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub NonZeroU32);

        impl $name {
            /// Raw driver id
            pub fn raw(self) -> u32 {
                self.0.get()
            }
        }
    };
}

gpu_handle!(
    /// Handle to a single compiled shader stage
    ShaderStageId
);
gpu_handle!(
    /// Handle to a linked shader program
    ProgramId
);
gpu_handle!(
    /// Handle to a 2D or cube-map texture
    TextureId
);
gpu_handle!(
    /// Handle to a vertex or index buffer
    BufferId
);
gpu_handle!(
    /// Handle to a vertex array object
    VertexArrayId
);
gpu_handle!(
    /// Handle to a framebuffer object
    FramebufferId
);
gpu_handle!(
    /// Handle to a renderbuffer object
    RenderbufferId
);

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex stage
    Vertex,
    /// Geometry stage
    Geometry,
    /// Fragment stage
    Fragment,
}

impl ShaderStage {
    /// Upper-case stage name used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            Self::Vertex => "VERTEX",
            Self::Geometry => "GEOMETRY",
            Self::Fragment => "FRAGMENT",
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Value written to a named uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `int` or sampler unit
    Int(i32),
    /// `float`
    Float(f32),
    /// `vec3`
    Vec3(Vec3),
    /// `mat4`, column-major
    Mat4(Mat4),
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        Self::Int(i32::from(value))
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<Vec3> for UniformValue {
    fn from(value: Vec3) -> Self {
        Self::Vec3(value)
    }
}

impl From<Mat4> for UniformValue {
    fn from(value: Mat4) -> Self {
        Self::Mat4(value)
    }
}

/// One float attribute inside an interleaved vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader input location
    pub location: u32,
    /// Number of `f32` components
    pub components: i32,
    /// Byte offset inside the vertex
    pub offset: i32,
}

/// Interleaved vertex layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    /// Size of one vertex in bytes
    pub stride: i32,
    /// Attributes enabled on the vertex array
    pub attributes: &'static [VertexAttribute],
}

/// GPU-resident geometry created by [`GraphicsBackend::create_geometry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuGeometry {
    /// Vertex array holding the attribute bindings
    pub vertex_array: VertexArrayId,
    /// Vertex buffer
    pub vertex_buffer: BufferId,
    /// Element buffer, absent for non-indexed geometry
    pub index_buffer: Option<BufferId>,
    /// Number of vertices uploaded
    pub vertex_count: u32,
    /// Number of indices uploaded
    pub index_count: u32,
}

/// Texture binding target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    /// `GL_TEXTURE_2D`
    Texture2D,
    /// `GL_TEXTURE_CUBE_MAP`
    CubeMap,
}

/// Texel storage format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Single 8-bit channel
    Red,
    /// Three 8-bit channels
    Rgb,
    /// Four 8-bit channels
    Rgba,
    /// Floating point depth component
    Depth,
}

impl PixelFormat {
    /// Format matching a decoded image's channel count
    pub fn from_channels(channels: u8) -> Option<Self> {
        match channels {
            1 => Some(Self::Red),
            3 => Some(Self::Rgb),
            4 => Some(Self::Rgba),
            _ => None,
        }
    }
}

/// Sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    /// Nearest texel
    Nearest,
    /// Bilinear
    Linear,
    /// Trilinear, only meaningful when mipmaps are generated
    LinearMipmapLinear,
}

/// Addressing outside [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextureWrap {
    /// Tile
    Repeat,
    /// Clamp to the edge texel
    ClampToEdge,
    /// Clamp to a constant border colour
    ClampToBorder([f32; 4]),
}

/// Texture allocation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureDesc {
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Storage format
    pub format: PixelFormat,
    /// Minification filter
    pub min_filter: TextureFilter,
    /// Magnification filter
    pub mag_filter: TextureFilter,
    /// Wrap mode on every axis
    pub wrap: TextureWrap,
    /// Generate a mip chain after upload
    pub mipmaps: bool,
}

impl TextureDesc {
    /// Repeating, mipmapped colour texture as used for material maps
    pub fn material(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            min_filter: TextureFilter::LinearMipmapLinear,
            mag_filter: TextureFilter::Linear,
            wrap: TextureWrap::Repeat,
            mipmaps: true,
        }
    }

    /// Edge-clamped colour target without mipmaps
    pub fn render_target(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
            wrap: TextureWrap::ClampToEdge,
            mipmaps: false,
        }
    }

    /// Nearest-sampled depth texture
    pub fn depth(width: u32, height: u32, wrap: TextureWrap) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Depth,
            min_filter: TextureFilter::Nearest,
            mag_filter: TextureFilter::Nearest,
            wrap,
            mipmaps: false,
        }
    }
}

/// Framebuffer attachment point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    /// First colour attachment
    Color0,
    /// Depth only
    Depth,
    /// Combined depth and stencil
    DepthStencil,
}

/// Renderbuffer storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderbufferFormat {
    /// 24-bit depth with 8-bit stencil
    Depth24Stencil8,
}

/// Result of a framebuffer completeness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
    /// Ready to render into
    Complete,
    /// Driver status code explaining what is missing
    Incomplete(u32),
}

/// Pixel rectangle for `glViewport`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Left edge
    pub x: i32,
    /// Bottom edge
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl Viewport {
    /// Viewport anchored at the origin
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width: width as i32,
            height: height as i32,
        }
    }
}

bitflags! {
    /// Buffers cleared by [`GraphicsBackend::clear`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearMask: u32 {
        /// Colour buffer
        const COLOR = 1 << 0;
        /// Depth buffer
        const DEPTH = 1 << 1;
        /// Stencil buffer
        const STENCIL = 1 << 2;
    }
}

/// Face culling policy for a single draw
///
/// Passed with each draw and restored afterwards so culling never leaks into the
/// following draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CullMode {
    /// Back faces culled
    #[default]
    Default,
    /// No culling
    Disabled,
    /// Front faces culled, for geometry that encloses the light or camera
    Reversed,
}

impl std::str::FromStr for CullMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" | "" => Ok(Self::Default),
            "disabled" | "none" => Ok(Self::Disabled),
            "reversed" | "front" => Ok(Self::Reversed),
            other => Err(format!("unknown cull mode '{other}'")),
        }
    }
}

/// Low-level GPU command interface
pub trait GraphicsBackend {
    // Shader programs

    /// Compile one stage; the error string is the driver's info log
    fn compile_stage(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderStageId, String>;

    /// Release a compiled stage
    fn delete_stage(&mut self, stage: ShaderStageId);

    /// Link stages into a program; the error string is the driver's info log
    fn link_program(&mut self, stages: &[ShaderStageId]) -> Result<ProgramId, String>;

    /// Release a program
    fn delete_program(&mut self, program: ProgramId);

    /// Make a program current, or unbind with `None`
    fn use_program(&mut self, program: Option<ProgramId>);

    /// Write a uniform of `program` by name.
    ///
    /// The location is looked up on every call. Names the program does not declare are
    /// ignored.
    fn set_uniform(&mut self, program: ProgramId, name: &str, value: UniformValue);

    // Geometry

    /// Upload interleaved vertices and optional `u32` indices
    fn create_geometry(
        &mut self,
        vertices: &[u8],
        layout: &VertexLayout,
        indices: Option<&[u32]>,
    ) -> Result<GpuGeometry, RenderError>;

    /// Draw a triangle list, indexed when the geometry has indices
    fn draw_geometry(&mut self, geometry: &GpuGeometry);

    /// Release all buffers of a geometry
    fn delete_geometry(&mut self, geometry: GpuGeometry);

    // Textures

    /// Allocate a 2D texture, uploading `pixels` when given
    fn create_texture_2d(
        &mut self,
        desc: &TextureDesc,
        pixels: Option<&[u8]>,
    ) -> Result<TextureId, RenderError>;

    /// Allocate a cube map; faces are ordered +X, -X, +Y, -Y, +Z, -Z
    fn create_texture_cube(
        &mut self,
        desc: &TextureDesc,
        faces: [Option<&[u8]>; 6],
    ) -> Result<TextureId, RenderError>;

    /// Bind a texture to a unit, or unbind with `None`
    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: Option<TextureId>);

    /// Release a texture
    fn delete_texture(&mut self, texture: TextureId);

    // Framebuffers

    /// Allocate renderbuffer storage
    fn create_renderbuffer(
        &mut self,
        format: RenderbufferFormat,
        width: u32,
        height: u32,
    ) -> Result<RenderbufferId, RenderError>;

    /// Release a renderbuffer
    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferId);

    /// Create an empty framebuffer
    fn create_framebuffer(&mut self) -> Result<FramebufferId, RenderError>;

    /// Attach a texture; cube maps are attached layered (all six faces)
    fn attach_texture(
        &mut self,
        framebuffer: FramebufferId,
        attachment: Attachment,
        target: TextureTarget,
        texture: TextureId,
    );

    /// Attach a renderbuffer
    fn attach_renderbuffer(
        &mut self,
        framebuffer: FramebufferId,
        attachment: Attachment,
        renderbuffer: RenderbufferId,
    );

    /// Set draw and read buffers to none, for depth-only targets
    fn disable_color_buffers(&mut self, framebuffer: FramebufferId);

    /// Completeness check
    fn framebuffer_status(&mut self, framebuffer: FramebufferId) -> FramebufferStatus;

    /// Bind a framebuffer, or the default framebuffer with `None`
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);

    /// Release a framebuffer
    fn delete_framebuffer(&mut self, framebuffer: FramebufferId);

    // Fixed-function state

    /// Set the viewport rectangle
    fn set_viewport(&mut self, viewport: Viewport);

    /// Set the clear colour
    fn set_clear_color(&mut self, rgba: [f32; 4]);

    /// Clear the selected buffers of the bound framebuffer
    fn clear(&mut self, mask: ClearMask);

    /// Toggle depth testing
    fn set_depth_test(&mut self, enabled: bool);

    /// Toggle depth writes
    fn set_depth_mask(&mut self, enabled: bool);

    /// Apply a culling policy
    fn set_cull_mode(&mut self, mode: CullMode);
}
