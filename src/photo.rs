//! Validation of uploaded photos.
//!
//! The format is sniffed from the bytes; the client's declared content type
//! and file name are never trusted. Only JPEG and PNG are accepted.

use crate::{AppError, Result};
use image::{ImageFormat, ImageReader};
use std::io::Cursor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectedPhoto {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl InspectedPhoto {
    pub fn content_type(&self) -> &'static str {
        content_type_for(self.format)
    }

    pub fn extension(&self) -> &'static str {
        match self.format {
            ImageFormat::Png => "png",
            _ => "jpg",
        }
    }
}

fn content_type_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        _ => "image/jpeg",
    }
}

/// Sniff, bound-check and fully decode a photo.
///
/// CPU-bound; call it from `spawn_blocking` when inside a handler.
pub fn inspect_photo(filename: &str, data: &[u8], max_dimension: u32) -> Result<InspectedPhoto> {
    if data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    let format = image::guess_format(data).map_err(|_| {
        AppError::UnsupportedMediaType(format!(
            "Could not recognise {} as an image; only JPEG and PNG are supported",
            filename
        ))
    })?;

    if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
        return Err(AppError::UnsupportedMediaType(format!(
            "Unsupported image format {:?}; only JPEG and PNG are supported",
            format
        )));
    }

    // Read the header first so oversized images are refused before allocating pixels.
    let (width, height) = ImageReader::with_format(Cursor::new(data), format)
        .into_dimensions()
        .map_err(|e| AppError::Validation(format!("Invalid image data: {}", e)))?;

    if width == 0 || height == 0 {
        return Err(AppError::Validation("Image has no pixels".to_string()));
    }
    if width > max_dimension || height > max_dimension {
        return Err(AppError::Validation(format!(
            "Image is {}x{}; max {} pixels per side allowed",
            width, height, max_dimension
        )));
    }

    image::load_from_memory_with_format(data, format)
        .map_err(|e| AppError::Validation(format!("Invalid image data: {}", e)))?;

    Ok(InspectedPhoto {
        format,
        width,
        height,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    pub(crate) fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([200, 120, 40]),
        ));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_inspect_jpeg() {
        let data = encode(16, 9, ImageFormat::Jpeg);
        let photo = inspect_photo("capture.jpg", &data, 8192).unwrap();
        assert_eq!(photo.format, ImageFormat::Jpeg);
        assert_eq!((photo.width, photo.height), (16, 9));
        assert_eq!(photo.content_type(), "image/jpeg");
        assert_eq!(photo.extension(), "jpg");
    }

    #[test]
    fn test_inspect_png_named_jpg() {
        // The name lies; the bytes win.
        let data = encode(3, 5, ImageFormat::Png);
        let photo = inspect_photo("capture.jpg", &data, 8192).unwrap();
        assert_eq!(photo.format, ImageFormat::Png);
        assert_eq!(photo.content_type(), "image/png");
        assert_eq!(photo.extension(), "png");
    }

    #[test]
    fn test_rejects_empty() {
        let result = inspect_photo("capture.jpg", &[], 8192);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_rejects_non_image() {
        let result = inspect_photo("notes.txt", b"definitely not an image", 8192);
        assert!(matches!(result, Err(AppError::UnsupportedMediaType(_))));
    }

    #[test]
    fn test_rejects_truncated_jpeg() {
        let mut data = encode(64, 64, ImageFormat::Jpeg);
        data.truncate(20);
        let result = inspect_photo("capture.jpg", &data, 8192);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_rejects_oversized_dimensions() {
        let data = encode(40, 10, ImageFormat::Png);
        let result = inspect_photo("wide.png", &data, 32);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
