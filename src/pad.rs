// ============================================================================
// PADDING COMPOSITOR — center a source image on a transparent letterbox canvas
// ============================================================================

use image::{RgbaImage, imageops};

use crate::error::PipelineError;
use crate::geometry::{self, AspectRatio};

/// A source image centered on a canvas of the target aspect ratio, with
/// transparent (alpha = 0) padding on the shorter axis.
///
/// Not mutated after creation. The recorded offset and source size are what
/// the mask synthesizer needs to stay pixel-aligned with the padding.
#[derive(Clone, Debug)]
pub struct PaddedImage {
    image: RgbaImage,
    source_size: (u32, u32),
    offset: (u32, u32),
    target: AspectRatio,
}

impl PaddedImage {
    #[inline]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    #[inline]
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    #[inline]
    pub fn source_size(&self) -> (u32, u32) {
        self.source_size
    }

    /// Offset at which the source was drawn: `((W-w)/2, (H-h)/2)`.
    #[inline]
    pub fn offset(&self) -> (u32, u32) {
        self.offset
    }

    #[inline]
    pub fn target(&self) -> AspectRatio {
        self.target
    }
}

/// Draw `source` centered, unscaled (1:1 pixel mapping), onto a transparent
/// canvas whose dimensions match `target`.
///
/// When the source already matches the target ratio the canvas equals the
/// source size and the offset is (0, 0) — effectively a copy.
pub fn pad(source: &RgbaImage, target: AspectRatio) -> Result<PaddedImage, PipelineError> {
    let (src_w, src_h) = source.dimensions();
    let (canvas_w, canvas_h) = geometry::compute_letterbox_canvas(src_w, src_h, target)?;
    let offset = geometry::center_offset(canvas_w, canvas_h, src_w, src_h);

    let mut canvas = RgbaImage::new(canvas_w, canvas_h);
    imageops::replace(&mut canvas, source, offset.0 as i64, offset.1 as i64);

    Ok(PaddedImage {
        image: canvas,
        source_size: (src_w, src_h),
        offset,
        target,
    })
}
