use super::StorageError;

/// Lossy WebP quality applied to every transcoded image.
pub const WEBP_QUALITY: f32 = 80.0;

/// Re-encodes a JPEG or PNG as lossy WebP at [`WEBP_QUALITY`]. Alpha is kept
/// only when the source has it.
pub fn to_webp(bytes: &[u8]) -> Result<Vec<u8>, StorageError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| StorageError::Transcode(e.to_string()))?;

    let encoded = if decoded.color().has_alpha() {
        let rgba = decoded.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
            .encode_simple(false, WEBP_QUALITY)
    } else {
        let rgb = decoded.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height())
            .encode_simple(false, WEBP_QUALITY)
    };
    let encoded = encoded.map_err(|e| StorageError::Transcode(format!("{e:?}")))?;

    Ok(encoded.to_vec())
}
