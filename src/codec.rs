// ============================================================================
// CODEC BOUNDARY — bytes ⇄ RgbaImage, PNG for masks/results, JPEG for bases
// ============================================================================

use std::io::Cursor;
use std::path::Path;

use image::{ImageOutputFormat, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::geometry::MAX_CANVAS_DIM;

pub const MIME_PNG: &str = "image/png";
pub const MIME_JPEG: &str = "image/jpeg";

/// JPEG quality used for opaque submission images.
pub const JPEG_QUALITY: u8 = 95;

/// An encoded image payload as exchanged with the model client and the
/// history store: raw bytes plus their MIME type.
#[derive(Clone, Serialize, Deserialize)]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl EncodedImage {
    pub fn decode(&self) -> Result<RgbaImage, PipelineError> {
        decode(&self.data)
    }
}

impl std::fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Skip the payload bytes — they drown logs
        f.debug_struct("EncodedImage")
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Decode raw bytes into an RGBA bitmap.
///
/// A partially decodable or oversized payload is a precondition failure for
/// every downstream operation, so it is rejected here rather than producing
/// a blank result.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, PipelineError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| PipelineError::DecodeFailed(e.to_string()))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(PipelineError::DecodeFailed("decoded image is empty".to_string()));
    }
    if w > MAX_CANVAS_DIM || h > MAX_CANVAS_DIM {
        return Err(PipelineError::CanvasTooLarge { width: w, height: h });
    }
    Ok(img)
}

/// Encode as PNG — lossless, alpha-preserving. Used for padded images,
/// masks, and final results.
pub fn encode_png(image: &RgbaImage) -> Result<EncodedImage, PipelineError> {
    let mut data = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut data), ImageOutputFormat::Png)
        .map_err(|e| PipelineError::EncodeFailed(e.to_string()))?;
    Ok(EncodedImage {
        mime_type: MIME_PNG.to_string(),
        data,
    })
}

/// Encode as JPEG — used for the opaque base image since it is smaller and
/// carries no alpha. The caller must have flattened the image first.
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<EncodedImage, PipelineError> {
    let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut data = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut data), ImageOutputFormat::Jpeg(quality))
        .map_err(|e| PipelineError::EncodeFailed(e.to_string()))?;
    Ok(EncodedImage {
        mime_type: MIME_JPEG.to_string(),
        data,
    })
}

// ============================================================================
// FILE HELPERS (CLI / headless mode)
// ============================================================================

/// Synchronously load any raster format the `image` crate supports into an
/// RGBA bitmap.
pub fn load_image(path: &Path) -> Result<RgbaImage, PipelineError> {
    let img = image::open(path)
        .map_err(|e| PipelineError::DecodeFailed(format!("{}: {}", path.display(), e)))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    if w > MAX_CANVAS_DIM || h > MAX_CANVAS_DIM {
        return Err(PipelineError::CanvasTooLarge { width: w, height: h });
    }
    Ok(img)
}

/// Write an RGBA bitmap to `path`, choosing the format from the extension:
/// `.jpg`/`.jpeg` flattens to JPEG at [`JPEG_QUALITY`], anything else is PNG.
pub fn save_image(image: &RgbaImage, path: &Path) -> Result<(), PipelineError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let encoded = match ext.as_str() {
        "jpg" | "jpeg" => encode_jpeg(image, JPEG_QUALITY)?,
        _ => encode_png(image)?,
    };
    std::fs::write(path, &encoded.data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn png_round_trips_with_alpha() {
        let mut img = RgbaImage::from_pixel(3, 2, Rgba([12, 34, 56, 255]));
        img.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        let encoded = encode_png(&img).unwrap();
        assert_eq!(encoded.mime_type, MIME_PNG);

        let back = encoded.decode().unwrap();
        assert_eq!(back.dimensions(), (3, 2));
        assert_eq!(back.as_raw(), img.as_raw());
    }

    #[test]
    fn jpeg_encoding_reports_its_mime_type() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([200, 10, 10, 255]));
        let encoded = encode_jpeg(&img, JPEG_QUALITY).unwrap();
        assert_eq!(encoded.mime_type, MIME_JPEG);
        let back = encoded.decode().unwrap();
        assert_eq!(back.dimensions(), (8, 8));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = decode(&[0xde, 0xad, 0xbe, 0xef]).unwrap_err();
        assert!(matches!(err, PipelineError::DecodeFailed(_)));
    }
}
