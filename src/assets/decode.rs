use crate::{
    assets::raster::{PreparedImage, premultiply_rgba8_in_place},
    foundation::error::{DwiError, DwiResult},
};

/// Source formats accepted at intake.
pub const ACCEPTED_FORMATS: [image::ImageFormat; 2] = [image::ImageFormat::Png, image::ImageFormat::Jpeg];

/// Decode a PNG/JPEG source image into premultiplied RGBA8.
///
/// Anything else (including undecodable bytes) is an [`DwiError::Input`].
pub fn decode_source_image(bytes: &[u8]) -> DwiResult<PreparedImage> {
    let format = image::guess_format(bytes)
        .map_err(|e| DwiError::input(format!("unrecognized image data: {e}")))?;
    if !ACCEPTED_FORMATS.contains(&format) {
        return Err(DwiError::input(format!(
            "unsupported image format {format:?} (expected PNG or JPEG)"
        )));
    }
    let dyn_img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| DwiError::input(format!("failed to decode image: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(DwiError::input("image has zero width or height"));
    }

    let mut data = rgba.into_raw();
    premultiply_rgba8_in_place(&mut data);
    PreparedImage::new(width, height, data)
        .ok_or_else(|| DwiError::input("decoded image buffer has unexpected length"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
