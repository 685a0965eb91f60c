// ============================================================================
// MASK SYNTHESIZER — edit masks from alpha channels and painted strokes
// ============================================================================
//
// Polarity invariant shared by both entry points:
//   white = region the model may regenerate, black = region to preserve.

use image::RgbaImage;
use rayon::prelude::*;

use crate::error::PipelineError;
use crate::geometry::{self, AspectRatio};
use crate::pad::PaddedImage;

/// Alpha threshold below which a pixel counts as transparent (out of 255).
pub const ALPHA_THRESHOLD: u8 = 128;

/// An edit mask paired with a padded image of identical dimensions.
///
/// Always fully opaque. Created per generation request and discarded after
/// use.
#[derive(Clone, Debug)]
pub struct MaskImage {
    image: RgbaImage,
}

impl MaskImage {
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

    /// Verify this mask matches `padded` pixel-for-pixel in size.
    ///
    /// A failure here means the padding math diverged between image and mask
    /// — a programming error, surfaced as a hard error rather than a
    /// recoverable condition.
    pub fn ensure_matches(&self, padded: &PaddedImage) -> Result<(), PipelineError> {
        let expected = padded.dimensions();
        let actual = self.dimensions();
        if expected != actual {
            return Err(PipelineError::DimensionMismatch { expected, actual });
        }
        Ok(())
    }
}

/// Derive an outpainting mask from the transparency of a padded image.
///
/// Pixels with alpha below [`ALPHA_THRESHOLD`] become opaque white (to
/// generate); everything else becomes opaque black (to preserve). This
/// captures exactly the padding added by the compositor, plus any transparent
/// pixels already present in the source. Used when the user has not drawn a
/// manual mask.
pub fn mask_from_alpha(padded: &PaddedImage) -> MaskImage {
    let (w, h) = padded.dimensions();
    let src_raw = padded.image().as_raw();
    let row_bytes = w as usize * 4;

    let mut out = RgbaImage::new(w, h);
    out.as_mut()
        .par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = &src_raw[y * row_bytes..(y + 1) * row_bytes];
            for x in 0..w as usize {
                let i = x * 4;
                let alpha = src_row[i + 3];
                let v = if alpha < ALPHA_THRESHOLD { 255 } else { 0 };
                row[i] = v;
                row[i + 1] = v;
                row[i + 2] = v;
                // Mask output is always fully opaque
                row[i + 3] = 255;
            }
        });

    MaskImage { image: out }
}

/// Pad a user-authored stroke bitmap (white strokes on transparency) to the
/// letterbox canvas for `target`, over an opaque black fill.
///
/// The stroke bitmap must have the **same dimensions as the base image** it
/// was painted over: the canvas size and centering offset are computed with
/// the identical math as [`crate::pad::pad`], so mask and image stay
/// pixel-aligned.
pub fn pad_mask(user_mask: &RgbaImage, target: AspectRatio) -> Result<MaskImage, PipelineError> {
    let (src_w, src_h) = user_mask.dimensions();
    let (canvas_w, canvas_h) = geometry::compute_letterbox_canvas(src_w, src_h, target)?;
    let (off_x, off_y) = geometry::center_offset(canvas_w, canvas_h, src_w, src_h);

    let src_raw = user_mask.as_raw();
    let src_row_bytes = src_w as usize * 4;
    let row_bytes = canvas_w as usize * 4;

    let mut out = RgbaImage::from_pixel(canvas_w, canvas_h, image::Rgba([0, 0, 0, 255]));
    out.as_mut()
        .par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as u32;
            if y < off_y || y >= off_y + src_h {
                return;
            }
            let sy = (y - off_y) as usize;
            let src_row = &src_raw[sy * src_row_bytes..(sy + 1) * src_row_bytes];
            for sx in 0..src_w as usize {
                let si = sx * 4;
                let a = src_row[si + 3] as u32;
                if a == 0 {
                    continue;
                }
                // Source-over onto the black fill; result stays opaque
                let di = (off_x as usize + sx) * 4;
                for c in 0..3 {
                    let s = src_row[si + c] as u32;
                    let d = row[di + c] as u32;
                    row[di + c] = ((s * a + d * (255 - a) + 127) / 255) as u8;
                }
                row[di + 3] = 255;
            }
        });

    Ok(MaskImage { image: out })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::parse_aspect_ratio;
    use crate::pad::pad;
    use image::Rgba;

    #[test]
    fn alpha_mask_is_white_over_padding_black_over_subject() {
        let source = RgbaImage::from_pixel(4, 4, Rgba([90, 90, 90, 255]));
        let target = parse_aspect_ratio("2:1").unwrap();
        let padded = pad(&source, target).unwrap();
        let mask = mask_from_alpha(&padded);

        assert_eq!(mask.dimensions(), padded.dimensions());
        // Padding band on the left → white; subject area → black
        assert_eq!(*mask.image().get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*mask.image().get_pixel(3, 2), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn alpha_mask_respects_threshold() {
        let mut source = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        source.put_pixel(0, 0, Rgba([0, 0, 0, 127]));
        source.put_pixel(1, 0, Rgba([0, 0, 0, 128]));
        let target = parse_aspect_ratio("2:1").unwrap();
        let padded = pad(&source, target).unwrap();
        let mask = mask_from_alpha(&padded);

        assert_eq!(*mask.image().get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*mask.image().get_pixel(1, 0), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn pad_mask_uses_black_fill_and_keeps_strokes() {
        // Opaque white stroke pixel at (1, 1) of a 4x4 stroke bitmap
        let mut strokes = RgbaImage::new(4, 4);
        strokes.put_pixel(1, 1, Rgba([255, 255, 255, 255]));
        let target = parse_aspect_ratio("2:1").unwrap();
        let mask = pad_mask(&strokes, target).unwrap();

        assert_eq!(mask.dimensions(), (8, 4));
        // Stroke lands at the centering offset (2, 0)
        assert_eq!(*mask.image().get_pixel(3, 1), Rgba([255, 255, 255, 255]));
        // Unpainted and padding regions are opaque black
        assert_eq!(*mask.image().get_pixel(0, 0), Rgba([0, 0, 0, 255]));
        assert_eq!(*mask.image().get_pixel(3, 2), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn dimension_mismatch_is_a_hard_error() {
        let source = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let padded = pad(&source, parse_aspect_ratio("2:1").unwrap()).unwrap();
        let other = pad(&source, parse_aspect_ratio("1:1").unwrap()).unwrap();
        let mask = mask_from_alpha(&other);

        assert!(mask.ensure_matches(&other).is_ok());
        let err = mask.ensure_matches(&padded);
        assert!(matches!(
            err,
            Err(PipelineError::DimensionMismatch { .. })
        ));
    }
}
