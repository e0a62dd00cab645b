//! OpenGL 3.3 core backend built on `glow`
//!
//! Translates [`GraphicsBackend`] calls one-to-one into GL commands. All handles are the
//! driver's own object names, so [`ProgramId`] and friends convert to and from
//! `glow::Native*` without a lookup table.

#![allow(unsafe_code)]

use glow::HasContext;

use crate::render::backend::{
    Attachment, BufferId, ClearMask, CullMode, FramebufferId, FramebufferStatus, GpuGeometry,
    GraphicsBackend, PixelFormat, ProgramId, RenderbufferFormat, RenderbufferId, ShaderStage,
    ShaderStageId, TextureDesc, TextureFilter, TextureId, TextureTarget, TextureWrap,
    UniformValue, VertexArrayId, VertexLayout, Viewport,
};
use crate::render::{RenderError, RenderResult};

/// Face targets in the order cube-map faces are passed to the backend
const CUBE_FACES: [u32; 6] = [
    glow::TEXTURE_CUBE_MAP_POSITIVE_X,
    glow::TEXTURE_CUBE_MAP_NEGATIVE_X,
    glow::TEXTURE_CUBE_MAP_POSITIVE_Y,
    glow::TEXTURE_CUBE_MAP_NEGATIVE_Y,
    glow::TEXTURE_CUBE_MAP_POSITIVE_Z,
    glow::TEXTURE_CUBE_MAP_NEGATIVE_Z,
];

/// OpenGL implementation of [`GraphicsBackend`]
///
/// Owns the `glow` context. Every method assumes the context is current on the calling
/// thread, which [`crate::render::Window`] guarantees for the lifetime of the window.
pub struct GlBackend {
    gl: glow::Context,
}

impl GlBackend {
    /// Load GL entry points through `loader`, typically the window's proc-address query.
    ///
    /// # Safety
    ///
    /// The context the loader resolves against must be current on this thread and must
    /// outlive the backend.
    pub unsafe fn from_loader<F>(loader: F) -> RenderResult<Self>
    where
        F: FnMut(&str) -> *const std::os::raw::c_void,
    {
        let gl = glow::Context::from_loader_function(loader);
        let version = gl.version();
        if version.major < 3 || (version.major == 3 && version.minor < 3) {
            return Err(RenderError::InitializationFailed(format!(
                "OpenGL 3.3 required, context reports {}.{}",
                version.major, version.minor
            )));
        }
        log::info!(
            "OpenGL {}.{} ({})",
            version.major,
            version.minor,
            version.vendor_info
        );
        Ok(Self { gl })
    }

    /// Borrow the raw context
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }
}

fn stage_kind(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Geometry => glow::GEOMETRY_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn texture_target(target: TextureTarget) -> u32 {
    match target {
        TextureTarget::Texture2D => glow::TEXTURE_2D,
        TextureTarget::CubeMap => glow::TEXTURE_CUBE_MAP,
    }
}

fn attachment_point(attachment: Attachment) -> u32 {
    match attachment {
        Attachment::Color0 => glow::COLOR_ATTACHMENT0,
        Attachment::Depth => glow::DEPTH_ATTACHMENT,
        Attachment::DepthStencil => glow::DEPTH_STENCIL_ATTACHMENT,
    }
}

fn filter(filter: TextureFilter) -> i32 {
    (match filter {
        TextureFilter::Nearest => glow::NEAREST,
        TextureFilter::Linear => glow::LINEAR,
        TextureFilter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
    }) as i32
}

/// `(internal format, pixel format, component type)`
fn pixel_formats(format: PixelFormat) -> (i32, u32, u32) {
    match format {
        PixelFormat::Red => (glow::RED as i32, glow::RED, glow::UNSIGNED_BYTE),
        PixelFormat::Rgb => (glow::RGB as i32, glow::RGB, glow::UNSIGNED_BYTE),
        PixelFormat::Rgba => (glow::RGBA as i32, glow::RGBA, glow::UNSIGNED_BYTE),
        PixelFormat::Depth => (
            glow::DEPTH_COMPONENT as i32,
            glow::DEPTH_COMPONENT,
            glow::FLOAT,
        ),
    }
}

fn resource_error(what: &str, message: String) -> RenderError {
    RenderError::ResourceCreationFailed(format!("{what}: {message}"))
}

impl GlBackend {
    unsafe fn apply_sampling(&self, target: u32, desc: &TextureDesc) {
        let gl = &self.gl;
        gl.tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, filter(desc.min_filter));
        gl.tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, filter(desc.mag_filter));

        let wrap = match desc.wrap {
            TextureWrap::Repeat => glow::REPEAT,
            TextureWrap::ClampToEdge => glow::CLAMP_TO_EDGE,
            TextureWrap::ClampToBorder(color) => {
                gl.tex_parameter_f32_slice(target, glow::TEXTURE_BORDER_COLOR, &color);
                glow::CLAMP_TO_BORDER
            }
        } as i32;
        gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_S, wrap);
        gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_T, wrap);
        if target == glow::TEXTURE_CUBE_MAP {
            gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_R, wrap);
        }
    }

    unsafe fn upload_level(&self, target: u32, desc: &TextureDesc, pixels: Option<&[u8]>) {
        let (internal, format, ty) = pixel_formats(desc.format);
        self.gl.tex_image_2d(
            target,
            0,
            internal,
            desc.width as i32,
            desc.height as i32,
            0,
            format,
            ty,
            glow::PixelUnpackData::Slice(pixels),
        );
    }
}

impl GraphicsBackend for GlBackend {
    fn compile_stage(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderStageId, String> {
        unsafe {
            let shader = self.gl.create_shader(stage_kind(stage))?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(log);
            }
            Ok(ShaderStageId(shader.0))
        }
    }

    fn delete_stage(&mut self, stage: ShaderStageId) {
        unsafe { self.gl.delete_shader(glow::NativeShader(stage.0)) }
    }

    fn link_program(&mut self, stages: &[ShaderStageId]) -> Result<ProgramId, String> {
        unsafe {
            let program = self.gl.create_program()?;
            for stage in stages {
                self.gl.attach_shader(program, glow::NativeShader(stage.0));
            }
            self.gl.link_program(program);
            for stage in stages {
                self.gl.detach_shader(program, glow::NativeShader(stage.0));
            }
            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(log);
            }
            Ok(ProgramId(program.0))
        }
    }

    fn delete_program(&mut self, program: ProgramId) {
        unsafe { self.gl.delete_program(glow::NativeProgram(program.0)) }
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        unsafe {
            self.gl
                .use_program(program.map(|p| glow::NativeProgram(p.0)));
        }
    }

    fn set_uniform(&mut self, program: ProgramId, name: &str, value: UniformValue) {
        unsafe {
            let Some(location) = self
                .gl
                .get_uniform_location(glow::NativeProgram(program.0), name)
            else {
                log::trace!("Uniform '{name}' not active in program {}", program.raw());
                return;
            };
            let location = Some(&location);
            match value {
                UniformValue::Int(v) => self.gl.uniform_1_i32(location, v),
                UniformValue::Float(v) => self.gl.uniform_1_f32(location, v),
                UniformValue::Vec3(v) => self.gl.uniform_3_f32(location, v.x, v.y, v.z),
                UniformValue::Mat4(m) => {
                    self.gl
                        .uniform_matrix_4_f32_slice(location, false, m.as_slice());
                }
            }
        }
    }

    fn create_geometry(
        &mut self,
        vertices: &[u8],
        layout: &VertexLayout,
        indices: Option<&[u32]>,
    ) -> Result<GpuGeometry, RenderError> {
        if layout.stride <= 0 || vertices.len() % layout.stride as usize != 0 {
            return Err(resource_error(
                "geometry",
                format!(
                    "{} bytes is not a whole number of {}-byte vertices",
                    vertices.len(),
                    layout.stride
                ),
            ));
        }

        unsafe {
            let gl = &self.gl;
            let vao = gl
                .create_vertex_array()
                .map_err(|e| resource_error("vertex array", e))?;
            let vbo = match gl.create_buffer() {
                Ok(vbo) => vbo,
                Err(e) => {
                    gl.delete_vertex_array(vao);
                    return Err(resource_error("vertex buffer", e));
                }
            };

            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, vertices, glow::STATIC_DRAW);

            let ebo = match indices {
                Some(indices) => {
                    let ebo = match gl.create_buffer() {
                        Ok(ebo) => ebo,
                        Err(e) => {
                            gl.bind_vertex_array(None);
                            gl.delete_buffer(vbo);
                            gl.delete_vertex_array(vao);
                            return Err(resource_error("index buffer", e));
                        }
                    };
                    gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
                    gl.buffer_data_u8_slice(
                        glow::ELEMENT_ARRAY_BUFFER,
                        bytemuck::cast_slice(indices),
                        glow::STATIC_DRAW,
                    );
                    Some(ebo)
                }
                None => None,
            };

            for attribute in layout.attributes {
                gl.enable_vertex_attrib_array(attribute.location);
                gl.vertex_attrib_pointer_f32(
                    attribute.location,
                    attribute.components,
                    glow::FLOAT,
                    false,
                    layout.stride,
                    attribute.offset,
                );
            }
            gl.bind_vertex_array(None);

            Ok(GpuGeometry {
                vertex_array: VertexArrayId(vao.0),
                vertex_buffer: BufferId(vbo.0),
                index_buffer: ebo.map(|b| BufferId(b.0)),
                vertex_count: (vertices.len() / layout.stride as usize) as u32,
                index_count: indices.map_or(0, |i| i.len() as u32),
            })
        }
    }

    fn draw_geometry(&mut self, geometry: &GpuGeometry) {
        unsafe {
            let gl = &self.gl;
            gl.bind_vertex_array(Some(glow::NativeVertexArray(geometry.vertex_array.0)));
            if geometry.index_buffer.is_some() {
                gl.draw_elements(
                    glow::TRIANGLES,
                    geometry.index_count as i32,
                    glow::UNSIGNED_INT,
                    0,
                );
            } else {
                gl.draw_arrays(glow::TRIANGLES, 0, geometry.vertex_count as i32);
            }
            gl.bind_vertex_array(None);
        }
    }

    fn delete_geometry(&mut self, geometry: GpuGeometry) {
        unsafe {
            if let Some(ebo) = geometry.index_buffer {
                self.gl.delete_buffer(glow::NativeBuffer(ebo.0));
            }
            self.gl
                .delete_buffer(glow::NativeBuffer(geometry.vertex_buffer.0));
            self.gl
                .delete_vertex_array(glow::NativeVertexArray(geometry.vertex_array.0));
        }
    }

    fn create_texture_2d(
        &mut self,
        desc: &TextureDesc,
        pixels: Option<&[u8]>,
    ) -> Result<TextureId, RenderError> {
        unsafe {
            let texture = self
                .gl
                .create_texture()
                .map_err(|e| resource_error("texture", e))?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.upload_level(glow::TEXTURE_2D, desc, pixels);
            if desc.mipmaps && pixels.is_some() {
                self.gl.generate_mipmap(glow::TEXTURE_2D);
            }
            self.apply_sampling(glow::TEXTURE_2D, desc);
            self.gl.bind_texture(glow::TEXTURE_2D, None);
            Ok(TextureId(texture.0))
        }
    }

    fn create_texture_cube(
        &mut self,
        desc: &TextureDesc,
        faces: [Option<&[u8]>; 6],
    ) -> Result<TextureId, RenderError> {
        unsafe {
            let texture = self
                .gl
                .create_texture()
                .map_err(|e| resource_error("cube map", e))?;
            self.gl.bind_texture(glow::TEXTURE_CUBE_MAP, Some(texture));
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            for (face, pixels) in CUBE_FACES.iter().zip(faces) {
                self.upload_level(*face, desc, pixels);
            }
            self.apply_sampling(glow::TEXTURE_CUBE_MAP, desc);
            self.gl.bind_texture(glow::TEXTURE_CUBE_MAP, None);
            Ok(TextureId(texture.0))
        }
    }

    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: Option<TextureId>) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(
                texture_target(target),
                texture.map(|t| glow::NativeTexture(t.0)),
            );
            if unit != 0 {
                self.gl.active_texture(glow::TEXTURE0);
            }
        }
    }

    fn delete_texture(&mut self, texture: TextureId) {
        unsafe { self.gl.delete_texture(glow::NativeTexture(texture.0)) }
    }

    fn create_renderbuffer(
        &mut self,
        format: RenderbufferFormat,
        width: u32,
        height: u32,
    ) -> Result<RenderbufferId, RenderError> {
        let internal = match format {
            RenderbufferFormat::Depth24Stencil8 => glow::DEPTH24_STENCIL8,
        };
        unsafe {
            let renderbuffer = self
                .gl
                .create_renderbuffer()
                .map_err(|e| resource_error("renderbuffer", e))?;
            self.gl
                .bind_renderbuffer(glow::RENDERBUFFER, Some(renderbuffer));
            self.gl.renderbuffer_storage(
                glow::RENDERBUFFER,
                internal,
                width as i32,
                height as i32,
            );
            self.gl.bind_renderbuffer(glow::RENDERBUFFER, None);
            Ok(RenderbufferId(renderbuffer.0))
        }
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferId) {
        unsafe {
            self.gl
                .delete_renderbuffer(glow::NativeRenderbuffer(renderbuffer.0));
        }
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferId, RenderError> {
        unsafe {
            self.gl
                .create_framebuffer()
                .map(|fb| FramebufferId(fb.0))
                .map_err(|e| resource_error("framebuffer", e))
        }
    }

    fn attach_texture(
        &mut self,
        framebuffer: FramebufferId,
        attachment: Attachment,
        target: TextureTarget,
        texture: TextureId,
    ) {
        unsafe {
            let gl = &self.gl;
            let texture = Some(glow::NativeTexture(texture.0));
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(glow::NativeFramebuffer(framebuffer.0)));
            match target {
                TextureTarget::Texture2D => gl.framebuffer_texture_2d(
                    glow::FRAMEBUFFER,
                    attachment_point(attachment),
                    glow::TEXTURE_2D,
                    texture,
                    0,
                ),
                TextureTarget::CubeMap => gl.framebuffer_texture(
                    glow::FRAMEBUFFER,
                    attachment_point(attachment),
                    texture,
                    0,
                ),
            }
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
    }

    fn attach_renderbuffer(
        &mut self,
        framebuffer: FramebufferId,
        attachment: Attachment,
        renderbuffer: RenderbufferId,
    ) {
        unsafe {
            let gl = &self.gl;
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(glow::NativeFramebuffer(framebuffer.0)));
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                attachment_point(attachment),
                glow::RENDERBUFFER,
                Some(glow::NativeRenderbuffer(renderbuffer.0)),
            );
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
    }

    fn disable_color_buffers(&mut self, framebuffer: FramebufferId) {
        unsafe {
            let gl = &self.gl;
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(glow::NativeFramebuffer(framebuffer.0)));
            gl.draw_buffer(glow::NONE);
            gl.read_buffer(glow::NONE);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
    }

    fn framebuffer_status(&mut self, framebuffer: FramebufferId) -> FramebufferStatus {
        unsafe {
            let gl = &self.gl;
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(glow::NativeFramebuffer(framebuffer.0)));
            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            if status == glow::FRAMEBUFFER_COMPLETE {
                FramebufferStatus::Complete
            } else {
                FramebufferStatus::Incomplete(status)
            }
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        unsafe {
            self.gl.bind_framebuffer(
                glow::FRAMEBUFFER,
                framebuffer.map(|fb| glow::NativeFramebuffer(fb.0)),
            );
        }
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        unsafe {
            self.gl
                .delete_framebuffer(glow::NativeFramebuffer(framebuffer.0));
        }
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        unsafe {
            self.gl
                .viewport(viewport.x, viewport.y, viewport.width, viewport.height);
        }
    }

    fn set_clear_color(&mut self, rgba: [f32; 4]) {
        unsafe { self.gl.clear_color(rgba[0], rgba[1], rgba[2], rgba[3]) }
    }

    fn clear(&mut self, mask: ClearMask) {
        let mut bits = 0;
        if mask.contains(ClearMask::COLOR) {
            bits |= glow::COLOR_BUFFER_BIT;
        }
        if mask.contains(ClearMask::DEPTH) {
            bits |= glow::DEPTH_BUFFER_BIT;
        }
        if mask.contains(ClearMask::STENCIL) {
            bits |= glow::STENCIL_BUFFER_BIT;
        }
        unsafe { self.gl.clear(bits) }
    }

    fn set_depth_test(&mut self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::DEPTH_TEST);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
        }
    }

    fn set_depth_mask(&mut self, enabled: bool) {
        unsafe { self.gl.depth_mask(enabled) }
    }

    fn set_cull_mode(&mut self, mode: CullMode) {
        unsafe {
            match mode {
                CullMode::Default => {
                    self.gl.enable(glow::CULL_FACE);
                    self.gl.cull_face(glow::BACK);
                }
                CullMode::Disabled => self.gl.disable(glow::CULL_FACE),
                CullMode::Reversed => {
                    self.gl.enable(glow::CULL_FACE);
                    self.gl.cull_face(glow::FRONT);
                }
            }
        }
    }
}
