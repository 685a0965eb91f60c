// ============================================================================
// POST-GENERATION RECONCILER — crop and resize model output to the request
// ============================================================================

use image::{RgbaImage, imageops};

use crate::error::PipelineError;
use crate::geometry::AspectRatio;

/// Ratio difference below which a returned image counts as already matching
/// the requested aspect ratio.
pub const CROP_TOLERANCE: f64 = 0.01;

/// Interpolation method for resize operations.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Interpolation {
    Nearest,
    Bilinear,
    #[default]
    Bicubic,
    Lanczos3,
}

impl Interpolation {
    pub fn label(&self) -> &'static str {
        match self {
            Interpolation::Nearest => "Nearest",
            Interpolation::Bilinear => "Bilinear",
            Interpolation::Bicubic => "Bicubic",
            Interpolation::Lanczos3 => "Lanczos3",
        }
    }

    pub fn all() -> &'static [Interpolation] {
        &[
            Interpolation::Nearest,
            Interpolation::Bilinear,
            Interpolation::Bicubic,
            Interpolation::Lanczos3,
        ]
    }

    pub fn to_filter(&self) -> imageops::FilterType {
        match self {
            Interpolation::Nearest => imageops::FilterType::Nearest,
            Interpolation::Bilinear => imageops::FilterType::Triangle,
            Interpolation::Bicubic => imageops::FilterType::CatmullRom,
            Interpolation::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

/// The output-size choice attached to a generation request.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum SizeTarget {
    /// Keep whatever size the crop produces.
    #[default]
    Auto,
    /// Scale (non-uniformly if necessary) to exact pixel dimensions.
    Exact { width: u32, height: u32 },
}

impl SizeTarget {
    /// Parse `"auto"` or `"WxH"` (e.g. `"1920x1080"`).
    pub fn parse(value: &str) -> Result<Self, PipelineError> {
        if value.eq_ignore_ascii_case("auto") {
            return Ok(SizeTarget::Auto);
        }
        let mut parts = value.split('x');
        let w = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
        let h = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
        match (w, h, parts.next()) {
            (Some(width), Some(height), None) if width > 0 && height > 0 => {
                Ok(SizeTarget::Exact { width, height })
            }
            _ => Err(PipelineError::InvalidSizeTarget(value.to_string())),
        }
    }
}

/// Center-crop `result` to the requested aspect ratio.
///
/// The generative model may ignore the exact aspect ratio (some always
/// return square output); this guarantees the final artifact matches what
/// the user configured. Within [`CROP_TOLERANCE`] the input is returned
/// unchanged. Never upsamples or pads — only removes pixels, symmetrically.
pub fn crop_to_aspect_ratio(
    result: &RgbaImage,
    target: AspectRatio,
) -> Result<RgbaImage, PipelineError> {
    let (src_w, src_h) = result.dimensions();
    if src_w == 0 || src_h == 0 {
        return Err(PipelineError::DecodeFailed(
            "cannot crop an empty image".to_string(),
        ));
    }
    let target_ratio = target.value();
    let source_ratio = src_w as f64 / src_h as f64;

    if (source_ratio - target_ratio).abs() < CROP_TOLERANCE {
        return Ok(result.clone());
    }

    let (crop_x, crop_y, crop_w, crop_h) = if source_ratio > target_ratio {
        // Wider than requested — crop symmetric margins from left/right
        let crop_w = ((src_h as f64 * target_ratio).floor() as u32).clamp(1, src_w);
        ((src_w - crop_w) / 2, 0, crop_w, src_h)
    } else {
        // Taller than requested — crop symmetric margins from top/bottom
        let crop_h = ((src_w as f64 / target_ratio).floor() as u32).clamp(1, src_h);
        (0, (src_h - crop_h) / 2, src_w, crop_h)
    };

    Ok(imageops::crop_imm(result, crop_x, crop_y, crop_w, crop_h).to_image())
}

/// Scale to exact pixel dimensions with high-quality smoothing.
///
/// Used only when the user explicitly picked a fixed pixel size rather than
/// "auto"; distortion is accepted when the ratios differ.
pub fn resize_exact(
    image: &RgbaImage,
    width: u32,
    height: u32,
    interp: Interpolation,
) -> RgbaImage {
    imageops::resize(image, width, height, interp.to_filter())
}

/// Apply the full reconciliation ordering contract: crop to the requested
/// aspect ratio first (composition), then resize to the exact pixel target
/// if one was chosen (absolute size).
pub fn reconcile(
    result: &RgbaImage,
    target: AspectRatio,
    size: SizeTarget,
    interp: Interpolation,
) -> Result<RgbaImage, PipelineError> {
    let cropped = crop_to_aspect_ratio(result, target)?;
    Ok(match size {
        SizeTarget::Auto => cropped,
        SizeTarget::Exact { width, height } => resize_exact(&cropped, width, height, interp),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::parse_aspect_ratio;
    use image::Rgba;

    #[test]
    fn crop_is_a_noop_within_tolerance() {
        let img = RgbaImage::from_pixel(160, 90, Rgba([5, 5, 5, 255]));
        let target = parse_aspect_ratio("16:9").unwrap();
        let out = crop_to_aspect_ratio(&img, target).unwrap();
        assert_eq!(out.dimensions(), (160, 90));
    }

    #[test]
    fn crop_removes_symmetric_vertical_margins() {
        // Square model output cropped to 16:9 — 1000x562, vertically centered
        let img = RgbaImage::from_pixel(1000, 1000, Rgba([0, 0, 0, 255]));
        let target = parse_aspect_ratio("16:9").unwrap();
        let out = crop_to_aspect_ratio(&img, target).unwrap();
        assert_eq!(out.dimensions(), (1000, 562));
    }

    #[test]
    fn crop_removes_symmetric_horizontal_margins() {
        let mut img = RgbaImage::from_pixel(200, 100, Rgba([0, 0, 0, 255]));
        // Mark the horizontal center so we can verify the window position
        img.put_pixel(100, 50, Rgba([255, 0, 0, 255]));
        let target = parse_aspect_ratio("1:1").unwrap();
        let out = crop_to_aspect_ratio(&img, target).unwrap();
        assert_eq!(out.dimensions(), (100, 100));
        assert_eq!(*out.get_pixel(50, 50), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn resize_exact_hits_requested_dimensions() {
        let img = RgbaImage::from_pixel(64, 64, Rgba([9, 9, 9, 255]));
        let out = resize_exact(&img, 16, 32, Interpolation::default());
        assert_eq!(out.dimensions(), (16, 32));
    }

    #[test]
    fn reconcile_crops_before_resizing() {
        // 1000x1000 @ 16:9 then 320x180: the crop must happen first, so the
        // resize sees 1000x562, not the square original.
        let img = RgbaImage::from_pixel(1000, 1000, Rgba([1, 2, 3, 255]));
        let target = parse_aspect_ratio("16:9").unwrap();
        let out = reconcile(
            &img,
            target,
            SizeTarget::Exact {
                width: 320,
                height: 180,
            },
            Interpolation::default(),
        )
        .unwrap();
        assert_eq!(out.dimensions(), (320, 180));
    }

    #[test]
    fn size_target_parses_auto_and_exact() {
        assert_eq!(SizeTarget::parse("auto").unwrap(), SizeTarget::Auto);
        assert_eq!(
            SizeTarget::parse("1920x1080").unwrap(),
            SizeTarget::Exact {
                width: 1920,
                height: 1080
            }
        );
        assert!(SizeTarget::parse("1920x").is_err());
        assert!(SizeTarget::parse("0x10").is_err());
        assert!(SizeTarget::parse("axb").is_err());
    }
}
