// ============================================================================
// OPACITY FLATTENER — composite a padded image over a solid background
// ============================================================================

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::pad::PaddedImage;

/// Background the external edit model sees under the padding: plain white.
pub const DEFAULT_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Composite `padded` over a solid `background` fill, producing a fully
/// opaque image of the same dimensions.
///
/// The edit model expects an opaque base image — the mask alone conveys
/// which regions may change — so the padding transparency must not leak
/// into the submitted pixels.
pub fn flatten(padded: &PaddedImage, background: Rgba<u8>) -> RgbaImage {
    let (w, h) = padded.dimensions();
    let src_raw = padded.image().as_raw();
    let row_bytes = w as usize * 4;
    let bg = [
        background[0] as u32,
        background[1] as u32,
        background[2] as u32,
    ];

    let mut out = RgbaImage::new(w, h);
    out.as_mut()
        .par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = &src_raw[y * row_bytes..(y + 1) * row_bytes];
            for x in 0..w as usize {
                let i = x * 4;
                let a = src_row[i + 3] as u32;
                for c in 0..3 {
                    let s = src_row[i + c] as u32;
                    row[i + c] = ((s * a + bg[c] * (255 - a) + 127) / 255) as u8;
                }
                row[i + 3] = 255;
            }
        });

    out
}
