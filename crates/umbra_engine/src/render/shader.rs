//! Shader programs
//!
//! A [`ShaderProgram`] only exists once every stage compiled and the program linked.
//! Failures come back as [`ShaderError`] carrying the stage name and the driver log, and
//! every intermediate GPU object is released before the error is returned.

use std::path::{Path, PathBuf};

use crate::foundation::math::{Mat4, Vec3};
use crate::render::backend::{GraphicsBackend, ProgramId, ShaderStage, UniformValue};

/// Shader construction errors
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    /// A stage source file could not be read
    #[error("Failed to read shader source '{path}': {source}")]
    Io {
        /// Offending file
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// A stage failed to compile
    #[error("{stage} shader compilation failed:\n{log}")]
    Compile {
        /// Failed stage
        stage: ShaderStage,
        /// Driver info log
        log: String,
    },

    /// Linking failed
    #[error("Shader program linking failed:\n{log}")]
    Link {
        /// Driver info log
        log: String,
    },
}

/// Source text for each stage of a program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    /// Vertex stage
    pub vertex: String,
    /// Fragment stage
    pub fragment: String,
    /// Optional geometry stage
    pub geometry: Option<String>,
}

impl ShaderSources {
    /// Vertex and fragment stages
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
            geometry: None,
        }
    }

    /// Add a geometry stage
    pub fn with_geometry(mut self, geometry: impl Into<String>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }

    /// Read stage sources from disk
    pub fn from_files(
        vertex: &Path,
        fragment: &Path,
        geometry: Option<&Path>,
    ) -> Result<Self, ShaderError> {
        let read = |path: &Path| {
            std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
                path: path.to_path_buf(),
                source,
            })
        };

        Ok(Self {
            vertex: read(vertex)?,
            fragment: read(fragment)?,
            geometry: geometry.map(read).transpose()?,
        })
    }

    fn stages(&self) -> impl Iterator<Item = (ShaderStage, &str)> {
        [
            Some((ShaderStage::Vertex, self.vertex.as_str())),
            self.geometry
                .as_deref()
                .map(|source| (ShaderStage::Geometry, source)),
            Some((ShaderStage::Fragment, self.fragment.as_str())),
        ]
        .into_iter()
        .flatten()
    }
}

/// A linked GPU program
///
/// The source text is retained for diagnostics.
#[derive(Debug)]
pub struct ShaderProgram {
    id: ProgramId,
    sources: ShaderSources,
}

impl ShaderProgram {
    /// Compile every present stage and link them
    pub fn compile(
        backend: &mut dyn GraphicsBackend,
        sources: ShaderSources,
    ) -> Result<Self, ShaderError> {
        let mut compiled = Vec::with_capacity(3);
        for (stage, source) in sources.stages() {
            match backend.compile_stage(stage, source) {
                Ok(id) => compiled.push(id),
                Err(log) => {
                    for id in compiled {
                        backend.delete_stage(id);
                    }
                    return Err(ShaderError::Compile { stage, log });
                }
            }
        }

        let linked = backend.link_program(&compiled);
        for id in compiled {
            backend.delete_stage(id);
        }
        let id = linked.map_err(|log| ShaderError::Link { log })?;

        log::debug!(
            "Linked program {} ({} stages)",
            id.raw(),
            sources.stages().count()
        );
        Ok(Self { id, sources })
    }

    /// Read sources from disk and compile
    pub fn from_files(
        backend: &mut dyn GraphicsBackend,
        vertex: &Path,
        fragment: &Path,
        geometry: Option<&Path>,
    ) -> Result<Self, ShaderError> {
        let sources = ShaderSources::from_files(vertex, fragment, geometry)?;
        Self::compile(backend, sources)
    }

    /// Program handle
    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// Retained stage sources
    pub fn sources(&self) -> &ShaderSources {
        &self.sources
    }

    /// Make this the current program
    pub fn activate(&self, backend: &mut dyn GraphicsBackend) {
        backend.use_program(Some(self.id));
    }

    /// Write any uniform value
    pub fn set(&self, backend: &mut dyn GraphicsBackend, name: &str, value: impl Into<UniformValue>) {
        backend.set_uniform(self.id, name, value.into());
    }

    /// Write an `int` or sampler uniform
    pub fn set_int(&self, backend: &mut dyn GraphicsBackend, name: &str, value: i32) {
        self.set(backend, name, value);
    }

    /// Write a `float` uniform
    pub fn set_float(&self, backend: &mut dyn GraphicsBackend, name: &str, value: f32) {
        self.set(backend, name, value);
    }

    /// Write a `vec3` uniform
    pub fn set_vec3(&self, backend: &mut dyn GraphicsBackend, name: &str, value: &Vec3) {
        self.set(backend, name, *value);
    }

    /// Write a `mat4` uniform
    pub fn set_mat4(&self, backend: &mut dyn GraphicsBackend, name: &str, value: &Mat4) {
        self.set(backend, name, *value);
    }

    /// Delete the program
    pub fn release(self, backend: &mut dyn GraphicsBackend) {
        backend.delete_program(self.id);
    }
}
