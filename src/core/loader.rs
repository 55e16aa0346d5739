use image::DynamicImage;

use crate::{
    core::heic,
    error::{AppError, Result},
    models::comparison::UploadedImage,
};

/// Decodes an upload into an RGB image.
///
/// Files named `*.heic`/`*.heif` go through the HEIF decoder; everything else
/// is sniffed from its content by the `image` crate, so a mislabelled
/// extension does not matter.
pub fn load_image(upload: &UploadedImage) -> Result<DynamicImage> {
    if upload.bytes.is_empty() {
        return Err(AppError::ImageDecode(format!(
            "{:?} is empty",
            upload.file_name
        )));
    }

    let image = if upload.is_heif() {
        heic::decode_heic(&upload.bytes)?
    } else {
        image::load_from_memory(&upload.bytes)?
    };

    log::debug!(
        "Loaded {:?} ({}x{}, {:?})",
        upload.file_name,
        image.width(),
        image.height(),
        image.color()
    );

    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}
