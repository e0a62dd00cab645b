//! Headless backend that records every command
//!
//! [`RecordingBackend`] hands out fresh ids for every created object and keeps an
//! ordered log of [`GpuCall`]s. Scene and pipeline tests drive it exactly like the GL
//! backend and then assert on the command stream: which program drew what, which
//! uniforms were written, which framebuffer was bound. It also counts live objects so
//! teardown paths can be checked for leaks, and can be told to fail compilation, linking
//! or framebuffer completeness to exercise error paths.

use std::collections::HashMap;
use std::num::NonZeroU32;

use crate::render::backend::{
    Attachment, BufferId, ClearMask, CullMode, FramebufferId, FramebufferStatus, GpuGeometry,
    GraphicsBackend, ProgramId, RenderbufferFormat, RenderbufferId, ShaderStage, ShaderStageId,
    TextureDesc, TextureId, TextureTarget, UniformValue, VertexArrayId, VertexLayout, Viewport,
};
use crate::render::RenderError;

/// `GL_FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT`, reported when completeness is forced to fail
pub const INCOMPLETE_MISSING_ATTACHMENT: u32 = 0x8CD7;

/// One recorded backend command
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    /// Stage compiled, `None` when compilation was made to fail
    CompileStage(ShaderStage, Option<ShaderStageId>),
    /// Stage deleted
    DeleteStage(ShaderStageId),
    /// Program linked, `None` when linking was made to fail
    LinkProgram(Option<ProgramId>),
    /// Program deleted
    DeleteProgram(ProgramId),
    /// Program bound
    UseProgram(Option<ProgramId>),
    /// Uniform written
    SetUniform {
        /// Target program
        program: ProgramId,
        /// Uniform name
        name: String,
        /// Written value
        value: UniformValue,
    },
    /// Geometry uploaded
    CreateGeometry(GpuGeometry),
    /// Draw submitted
    Draw(DrawRecord),
    /// Geometry released
    DeleteGeometry(VertexArrayId),
    /// Texture created
    CreateTexture {
        /// New handle
        texture: TextureId,
        /// 2D or cube
        target: TextureTarget,
        /// Allocation parameters
        desc: TextureDesc,
    },
    /// Texture bound to a unit
    BindTexture {
        /// Texture unit
        unit: u32,
        /// Binding target
        target: TextureTarget,
        /// Bound texture, `None` unbinds
        texture: Option<TextureId>,
    },
    /// Texture released
    DeleteTexture(TextureId),
    /// Renderbuffer created
    CreateRenderbuffer(RenderbufferId),
    /// Renderbuffer released
    DeleteRenderbuffer(RenderbufferId),
    /// Framebuffer created
    CreateFramebuffer(FramebufferId),
    /// Texture attached to a framebuffer
    AttachTexture {
        /// Framebuffer
        framebuffer: FramebufferId,
        /// Attachment point
        attachment: Attachment,
        /// Texture kind
        target: TextureTarget,
        /// Attached texture
        texture: TextureId,
    },
    /// Renderbuffer attached to a framebuffer
    AttachRenderbuffer {
        /// Framebuffer
        framebuffer: FramebufferId,
        /// Attachment point
        attachment: Attachment,
        /// Attached renderbuffer
        renderbuffer: RenderbufferId,
    },
    /// Draw and read buffers disabled
    DisableColorBuffers(FramebufferId),
    /// Framebuffer bound, `None` is the default framebuffer
    BindFramebuffer(Option<FramebufferId>),
    /// Framebuffer released
    DeleteFramebuffer(FramebufferId),
    /// Viewport changed
    Viewport(Viewport),
    /// Clear colour changed
    ClearColor([f32; 4]),
    /// Buffers cleared
    Clear(ClearMask),
    /// Depth test toggled
    DepthTest(bool),
    /// Depth writes toggled
    DepthMask(bool),
    /// Culling policy changed
    CullMode(CullMode),
}

/// State captured at the moment of a draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRecord {
    /// Program bound when the draw was issued
    pub program: Option<ProgramId>,
    /// Framebuffer bound when the draw was issued
    pub framebuffer: Option<FramebufferId>,
    /// Geometry drawn
    pub vertex_array: VertexArrayId,
    /// Index count, zero for non-indexed draws
    pub index_count: u32,
    /// Culling policy in effect
    pub cull_mode: CullMode,
    /// Whether depth testing was enabled
    pub depth_test: bool,
}

/// Count of objects created and not yet deleted, per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveObjects {
    /// Compiled stages
    pub stages: usize,
    /// Linked programs
    pub programs: usize,
    /// Vertex arrays with their buffers
    pub geometries: usize,
    /// 2D and cube textures
    pub textures: usize,
    /// Framebuffers
    pub framebuffers: usize,
    /// Renderbuffers
    pub renderbuffers: usize,
}

impl LiveObjects {
    /// Whether everything created has been released
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Backend that records commands instead of executing them
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<GpuCall>,
    allocated: u32,
    live: LiveObjects,
    bound_program: Option<ProgramId>,
    bound_framebuffer: Option<FramebufferId>,
    cull_mode: CullMode,
    depth_test: bool,
    uniforms: HashMap<(ProgramId, String), UniformValue>,
    fail_compile_marker: Option<String>,
    fail_link: bool,
    incomplete_framebuffers: bool,
}

impl RecordingBackend {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail compilation of any stage whose source contains `marker`
    pub fn fail_compile_containing(mut self, marker: impl Into<String>) -> Self {
        self.fail_compile_marker = Some(marker.into());
        self
    }

    /// Fail every link
    pub fn fail_link(mut self) -> Self {
        self.fail_link = true;
        self
    }

    /// Report every framebuffer as incomplete
    pub fn incomplete_framebuffers(mut self) -> Self {
        self.incomplete_framebuffers = true;
        self
    }

    /// All recorded calls in submission order
    pub fn calls(&self) -> &[GpuCall] {
        &self.calls
    }

    /// Forget recorded calls, keeping objects and bindings
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Recorded draws in submission order
    pub fn draws(&self) -> Vec<DrawRecord> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                GpuCall::Draw(record) => Some(*record),
                _ => None,
            })
            .collect()
    }

    /// Uniform writes to `program` in submission order
    pub fn uniform_writes(&self, program: ProgramId) -> Vec<(&str, UniformValue)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                GpuCall::SetUniform {
                    program: target,
                    name,
                    value,
                } if *target == program => Some((name.as_str(), *value)),
                _ => None,
            })
            .collect()
    }

    /// Last value written to `name` on `program`
    pub fn uniform(&self, program: ProgramId, name: &str) -> Option<UniformValue> {
        self.uniforms.get(&(program, name.to_string())).copied()
    }

    /// Objects currently alive
    pub fn live_objects(&self) -> LiveObjects {
        self.live
    }

    fn next_handle(&mut self) -> NonZeroU32 {
        self.allocated += 1;
        NonZeroU32::MIN.saturating_add(self.allocated - 1)
    }
}

impl GraphicsBackend for RecordingBackend {
    fn compile_stage(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderStageId, String> {
        let failed = self
            .fail_compile_marker
            .as_deref()
            .is_some_and(|marker| source.contains(marker));
        if failed {
            self.calls.push(GpuCall::CompileStage(stage, None));
            return Err(format!("0:1(1): error: {} stage rejected", stage.name()));
        }
        let id = ShaderStageId(self.next_handle());
        self.live.stages += 1;
        self.calls.push(GpuCall::CompileStage(stage, Some(id)));
        Ok(id)
    }

    fn delete_stage(&mut self, stage: ShaderStageId) {
        self.live.stages = self.live.stages.saturating_sub(1);
        self.calls.push(GpuCall::DeleteStage(stage));
    }

    fn link_program(&mut self, _stages: &[ShaderStageId]) -> Result<ProgramId, String> {
        if self.fail_link {
            self.calls.push(GpuCall::LinkProgram(None));
            return Err("error: linking failed".to_string());
        }
        let id = ProgramId(self.next_handle());
        self.live.programs += 1;
        self.calls.push(GpuCall::LinkProgram(Some(id)));
        Ok(id)
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.live.programs = self.live.programs.saturating_sub(1);
        self.calls.push(GpuCall::DeleteProgram(program));
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.bound_program = program;
        self.calls.push(GpuCall::UseProgram(program));
    }

    fn set_uniform(&mut self, program: ProgramId, name: &str, value: UniformValue) {
        self.uniforms.insert((program, name.to_string()), value);
        self.calls.push(GpuCall::SetUniform {
            program,
            name: name.to_string(),
            value,
        });
    }

    fn create_geometry(
        &mut self,
        vertices: &[u8],
        layout: &VertexLayout,
        indices: Option<&[u32]>,
    ) -> Result<GpuGeometry, RenderError> {
        if layout.stride <= 0 || vertices.len() % layout.stride as usize != 0 {
            return Err(RenderError::ResourceCreationFailed(format!(
                "geometry: {} bytes is not a whole number of {}-byte vertices",
                vertices.len(),
                layout.stride
            )));
        }
        let geometry = GpuGeometry {
            vertex_array: VertexArrayId(self.next_handle()),
            vertex_buffer: BufferId(self.next_handle()),
            index_buffer: indices.map(|_| BufferId(self.next_handle())),
            vertex_count: (vertices.len() / layout.stride as usize) as u32,
            index_count: indices.map_or(0, |i| i.len() as u32),
        };
        self.live.geometries += 1;
        self.calls.push(GpuCall::CreateGeometry(geometry));
        Ok(geometry)
    }

    fn draw_geometry(&mut self, geometry: &GpuGeometry) {
        self.calls.push(GpuCall::Draw(DrawRecord {
            program: self.bound_program,
            framebuffer: self.bound_framebuffer,
            vertex_array: geometry.vertex_array,
            index_count: geometry.index_count,
            cull_mode: self.cull_mode,
            depth_test: self.depth_test,
        }));
    }

    fn delete_geometry(&mut self, geometry: GpuGeometry) {
        self.live.geometries = self.live.geometries.saturating_sub(1);
        self.calls.push(GpuCall::DeleteGeometry(geometry.vertex_array));
    }

    fn create_texture_2d(
        &mut self,
        desc: &TextureDesc,
        _pixels: Option<&[u8]>,
    ) -> Result<TextureId, RenderError> {
        let texture = TextureId(self.next_handle());
        self.live.textures += 1;
        self.calls.push(GpuCall::CreateTexture {
            texture,
            target: TextureTarget::Texture2D,
            desc: *desc,
        });
        Ok(texture)
    }

    fn create_texture_cube(
        &mut self,
        desc: &TextureDesc,
        _faces: [Option<&[u8]>; 6],
    ) -> Result<TextureId, RenderError> {
        let texture = TextureId(self.next_handle());
        self.live.textures += 1;
        self.calls.push(GpuCall::CreateTexture {
            texture,
            target: TextureTarget::CubeMap,
            desc: *desc,
        });
        Ok(texture)
    }

    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: Option<TextureId>) {
        self.calls.push(GpuCall::BindTexture {
            unit,
            target,
            texture,
        });
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.live.textures = self.live.textures.saturating_sub(1);
        self.calls.push(GpuCall::DeleteTexture(texture));
    }

    fn create_renderbuffer(
        &mut self,
        _format: RenderbufferFormat,
        _width: u32,
        _height: u32,
    ) -> Result<RenderbufferId, RenderError> {
        let renderbuffer = RenderbufferId(self.next_handle());
        self.live.renderbuffers += 1;
        self.calls.push(GpuCall::CreateRenderbuffer(renderbuffer));
        Ok(renderbuffer)
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferId) {
        self.live.renderbuffers = self.live.renderbuffers.saturating_sub(1);
        self.calls.push(GpuCall::DeleteRenderbuffer(renderbuffer));
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferId, RenderError> {
        let framebuffer = FramebufferId(self.next_handle());
        self.live.framebuffers += 1;
        self.calls.push(GpuCall::CreateFramebuffer(framebuffer));
        Ok(framebuffer)
    }

    fn attach_texture(
        &mut self,
        framebuffer: FramebufferId,
        attachment: Attachment,
        target: TextureTarget,
        texture: TextureId,
    ) {
        self.calls.push(GpuCall::AttachTexture {
            framebuffer,
            attachment,
            target,
            texture,
        });
    }

    fn attach_renderbuffer(
        &mut self,
        framebuffer: FramebufferId,
        attachment: Attachment,
        renderbuffer: RenderbufferId,
    ) {
        self.calls.push(GpuCall::AttachRenderbuffer {
            framebuffer,
            attachment,
            renderbuffer,
        });
    }

    fn disable_color_buffers(&mut self, framebuffer: FramebufferId) {
        self.calls.push(GpuCall::DisableColorBuffers(framebuffer));
    }

    fn framebuffer_status(&mut self, _framebuffer: FramebufferId) -> FramebufferStatus {
        if self.incomplete_framebuffers {
            FramebufferStatus::Incomplete(INCOMPLETE_MISSING_ATTACHMENT)
        } else {
            FramebufferStatus::Complete
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.bound_framebuffer = framebuffer;
        self.calls.push(GpuCall::BindFramebuffer(framebuffer));
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        self.live.framebuffers = self.live.framebuffers.saturating_sub(1);
        self.calls.push(GpuCall::DeleteFramebuffer(framebuffer));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.calls.push(GpuCall::Viewport(viewport));
    }

    fn set_clear_color(&mut self, rgba: [f32; 4]) {
        self.calls.push(GpuCall::ClearColor(rgba));
    }

    fn clear(&mut self, mask: ClearMask) {
        self.calls.push(GpuCall::Clear(mask));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
        self.calls.push(GpuCall::DepthTest(enabled));
    }

    fn set_depth_mask(&mut self, enabled: bool) {
        self.calls.push(GpuCall::DepthMask(enabled));
    }

    fn set_cull_mode(&mut self, mode: CullMode) {
        self.cull_mode = mode;
        self.calls.push(GpuCall::CullMode(mode));
    }
}
