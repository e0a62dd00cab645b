//! Shadow capture targets
//!
//! [`DirectionalShadowMap`] renders scene depth from an orthographic light frustum into a
//! 2D texture. [`CubeShadowMap`] renders distance from a point light into all six faces
//! of a depth cube map in a single layered pass.

pub mod directional;
pub mod omni;

pub use directional::{DirectionalShadowMap, DirectionalShadowSettings};
pub use omni::{face_matrices, CubeFace, CubeShadowMap, CubeShadowSettings};
