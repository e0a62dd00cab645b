//! Asset loading
//!
//! CPU-side decoding of the files a scene is built from: images through the `image`
//! crate and Wavefront OBJ models through `tobj`. Nothing here touches the GPU; the
//! render layer uploads what these loaders produce.

pub mod image_loader;
pub mod model_loader;

pub use image_loader::ImageData;
pub use model_loader::{import_obj, ImportedMesh, ImportedModel, TextureRef};

use thiserror::Error;

use crate::render::RenderError;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Failed to load asset
    #[error("Failed to load asset: {0}")]
    LoadFailed(String),

    /// The model importer rejected a file
    #[error("Failed to import '{path}': {message}")]
    Import {
        /// Source file
        path: String,
        /// Importer diagnostic
        message: String,
    },

    /// Invalid asset data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Unsupported asset format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Uploading decoded data to the GPU failed
    #[error("GPU upload failed: {0}")]
    Upload(#[from] RenderError),

    /// IO error during asset loading
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
