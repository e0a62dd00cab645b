//! Texture upload
//!
//! Decoded images become GPU textures here. Material textures degrade gracefully: a
//! file that fails to decode is logged and yields `None`, which binds no texture at
//! draw time. Cube maps are all-or-nothing because a partial skybox is not usable.

use std::path::Path;

use crate::assets::image_loader::{ImageData, Orientation};
use crate::assets::AssetError;
use crate::render::backend::{
    GraphicsBackend, PixelFormat, TextureDesc, TextureFilter, TextureId, TextureWrap,
};

/// Upload decoded pixels as a mipmapped, repeating material texture
pub fn upload_material(
    backend: &mut dyn GraphicsBackend,
    image: &ImageData,
) -> Result<TextureId, AssetError> {
    let format = PixelFormat::from_channels(image.channels).ok_or_else(|| {
        AssetError::UnsupportedFormat(format!("{} channel image", image.channels))
    })?;
    let desc = TextureDesc::material(image.width, image.height, format);
    Ok(backend.create_texture_2d(&desc, Some(&image.data))?)
}

/// Load a material texture, flipped vertically
///
/// Failures are logged and return `None`.
pub fn load_material(backend: &mut dyn GraphicsBackend, path: &Path) -> Option<TextureId> {
    let result = ImageData::from_file(path, Orientation::FlippedVertically)
        .and_then(|image| upload_material(backend, &image));
    match result {
        Ok(id) => Some(id),
        Err(e) => {
            log::warn!("Texture {:?} unavailable, rendering untextured: {}", path, e);
            None
        }
    }
}

/// Load six unflipped images into a cube map
///
/// Faces are ordered +X, -X, +Y, -Y, +Z, -Z and must share size and channel count.
pub fn load_cube_map<P: AsRef<Path>>(
    backend: &mut dyn GraphicsBackend,
    faces: &[P; 6],
) -> Result<TextureId, AssetError> {
    let images = faces
        .iter()
        .map(|face| ImageData::from_file(face, Orientation::AsStored))
        .collect::<Result<Vec<_>, _>>()?;

    let first = &images[0];
    if let Some(mismatch) = images
        .iter()
        .position(|i| (i.width, i.height, i.channels) != (first.width, first.height, first.channels))
    {
        return Err(AssetError::InvalidData(format!(
            "cube face {:?} does not match {}x{} with {} channels",
            faces[mismatch].as_ref(),
            first.width,
            first.height,
            first.channels
        )));
    }

    let format = PixelFormat::from_channels(first.channels).ok_or_else(|| {
        AssetError::UnsupportedFormat(format!("{} channel image", first.channels))
    })?;
    let desc = TextureDesc {
        width: first.width,
        height: first.height,
        format,
        min_filter: TextureFilter::Linear,
        mag_filter: TextureFilter::Linear,
        wrap: TextureWrap::ClampToEdge,
        mipmaps: false,
    };

    let pixels: [Option<&[u8]>; 6] = std::array::from_fn(|i| Some(images[i].data.as_slice()));
    Ok(backend.create_texture_cube(&desc, pixels)?)
}
