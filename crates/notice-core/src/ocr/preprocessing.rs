//! Image preparation for region OCR.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageFormat};
use tracing::debug;

use crate::error::OcrError;
use crate::template::Region;

/// Crop a template region out of a page image.
///
/// The region is clamped to the image; a crop that ends up empty is an error.
pub fn crop_region(image: &DynamicImage, region: &Region) -> Result<DynamicImage, OcrError> {
    let (width, height) = image.dimensions();

    let x1 = region.x1().min(width);
    let y1 = region.y1().min(height);
    let x2 = region.x2().min(width);
    let y2 = region.y2().min(height);

    if x2 <= x1 || y2 <= y1 {
        return Err(OcrError::InvalidImage(format!(
            "region {} lies outside the {}x{} image",
            region, width, height
        )));
    }

    debug!("Cropping ({}, {}) -> ({}, {})", x1, y1, x2, y2);

    Ok(image.crop_imm(x1, y1, x2 - x1, y2 - y1))
}

/// Encode an image as PNG for the OCR provider.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, OcrError> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| OcrError::Encode(e.to_string()))?;
    Ok(buf.into_inner())
}
