//! Image loading utilities for texture data
//!
//! Images keep their native channel count (1, 3 or 4) so the GPU format can follow the
//! file. Material textures are loaded flipped vertically to match GL's bottom-left
//! origin; cube-map faces are loaded unflipped because cube sampling uses a top-left
//! origin per face.

use std::path::Path;

use image::DynamicImage;

use crate::assets::AssetError;

/// Vertical orientation applied while decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Rows as stored in the file
    AsStored,
    /// Last row first
    FlippedVertically,
}

/// Decoded image data ready for GPU upload
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Tightly packed pixel rows
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Number of 8-bit channels: 1, 3 or 4
    pub channels: u8,
}

impl ImageData {
    /// Load an image from a file path
    pub fn from_file<P: AsRef<Path>>(path: P, orientation: Orientation) -> Result<Self, AssetError> {
        let path_ref = path.as_ref();

        log::debug!("Loading image from: {:?}", path_ref);

        let img = image::open(path_ref).map_err(|e| {
            AssetError::LoadFailed(format!("Failed to load image {}: {}", path_ref.display(), e))
        })?;
        let img = match orientation {
            Orientation::AsStored => img,
            Orientation::FlippedVertically => img.flipv(),
        };

        let data = Self::from_dynamic(img);
        log::info!(
            "Loaded image {}x{} ({} channels) from {:?}",
            data.width,
            data.height,
            data.channels,
            path_ref
        );
        Ok(data)
    }

    /// Load image from memory
    pub fn from_bytes(bytes: &[u8], orientation: Orientation) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| AssetError::LoadFailed(format!("Failed to load image from bytes: {}", e)))?;
        let img = match orientation {
            Orientation::AsStored => img,
            Orientation::FlippedVertically => img.flipv(),
        };
        Ok(Self::from_dynamic(img))
    }

    fn from_dynamic(img: DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        match img.color().channel_count() {
            1 => Self {
                data: img.into_luma8().into_raw(),
                width,
                height,
                channels: 1,
            },
            3 => Self {
                data: img.into_rgb8().into_raw(),
                width,
                height,
                channels: 3,
            },
            _ => Self {
                data: img.into_rgba8().into_raw(),
                width,
                height,
                channels: 4,
            },
        }
    }

    /// Create a solid color image
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = (width * height) as usize;
        Self {
            data: color.repeat(pixel_count),
            width,
            height,
            channels: 4,
        }
    }

    /// Get the size of the image data in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}
