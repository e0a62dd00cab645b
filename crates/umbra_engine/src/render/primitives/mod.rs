//! Core primitive types for rendering
//!
//! Meshes with their vertex format and material textures, and the fly camera.

pub mod camera;
pub mod mesh;

pub use camera::Camera;
pub use mesh::{Mesh, Texture, TextureKind, Vertex};
