//! HEIC/HEIF decoding.
//!
//! libheif hands back an interleaved plane whose rows may be padded to an
//! alignment boundary. [`pack_rows`] strips that padding so the pixels can be
//! wrapped in an `image` buffer.

use image::DynamicImage;

use crate::error::{AppError, Result};

/// Copies `height` rows of `width * channels` bytes out of a buffer whose rows
/// start every `stride` bytes.
///
/// Returns `None` if the stride is narrower than a row or `data` is too short.
pub fn pack_rows(
    width: usize,
    height: usize,
    channels: usize,
    stride: usize,
    data: &[u8],
) -> Option<Vec<u8>> {
    let row_len = width.checked_mul(channels)?;
    if stride < row_len {
        return None;
    }
    if height == 0 {
        return Some(Vec::new());
    }
    let needed = stride.checked_mul(height - 1)?.checked_add(row_len)?;
    if data.len() < needed {
        return None;
    }

    if stride == row_len {
        return Some(data[..needed].to_vec());
    }

    let mut packed = Vec::with_capacity(row_len * height);
    for row in data.chunks(stride).take(height) {
        packed.extend_from_slice(&row[..row_len]);
    }
    Some(packed)
}

/// Builds an RGB or RGBA image from a strided interleaved plane.
pub fn image_from_plane(
    width: u32,
    height: u32,
    channels: usize,
    stride: usize,
    data: &[u8],
) -> Result<DynamicImage> {
    let packed = pack_rows(width as usize, height as usize, channels, stride, data)
        .ok_or_else(|| {
            AppError::ImageDecode(format!(
                "plane of {} bytes does not hold {}x{}x{} pixels at stride {}",
                data.len(),
                width,
                height,
                channels,
                stride
            ))
        })?;

    let image = match channels {
        3 => image::RgbImage::from_raw(width, height, packed).map(DynamicImage::ImageRgb8),
        4 => image::RgbaImage::from_raw(width, height, packed).map(DynamicImage::ImageRgba8),
        n => {
            return Err(AppError::ImageDecode(format!(
                "unsupported channel count {}",
                n
            )))
        }
    };

    image.ok_or_else(|| AppError::ImageDecode("pixel buffer size mismatch".to_string()))
}

#[cfg(feature = "heic")]
/// Decodes the primary image of a HEIC/HEIF container.
pub fn decode_heic(bytes: &[u8]) -> Result<DynamicImage> {
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let lib_heif = LibHeif::new();
    let ctx = HeifContext::read_from_bytes(bytes)?;
    let handle = ctx.primary_image_handle()?;

    let (chroma, channels) = if handle.has_alpha_channel() {
        (RgbChroma::Rgba, 4)
    } else {
        (RgbChroma::Rgb, 3)
    };

    let decoded = lib_heif.decode(&handle, ColorSpace::Rgb(chroma), None)?;
    let planes = decoded.planes();
    let plane = planes
        .interleaved
        .ok_or_else(|| AppError::ImageDecode("HEIF image has no interleaved plane".to_string()))?;

    log::debug!(
        "Decoded HEIF {}x{} (stride {}, {} channels)",
        plane.width,
        plane.height,
        plane.stride,
        channels
    );

    image_from_plane(plane.width, plane.height, channels, plane.stride, plane.data)
}

#[cfg(not(feature = "heic"))]
/// Decodes the primary image of a HEIC/HEIF container (unavailable)
pub fn decode_heic(_bytes: &[u8]) -> Result<DynamicImage> {
    Err(AppError::ImageDecode(
        "HEIF support not available - enable 'heic' feature".to_string(),
    ))
}
