//! Graphics backend implementations

pub mod opengl;
pub mod recording;

pub use opengl::GlBackend;
pub use recording::{DrawRecord, GpuCall, LiveObjects, RecordingBackend};
