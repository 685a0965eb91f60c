// ============================================================================
// GEOMETRY UTILITIES — aspect-ratio parsing and letterbox canvas math
// ============================================================================

use crate::error::PipelineError;

/// Maximum supported canvas dimension in pixels (per axis).
/// Prevents memory exhaustion from degenerate ratios (e.g. "1000:1" applied
/// to a tall source image).
pub const MAX_CANVAS_DIM: u32 = 32_768;

/// Relative tolerance used when comparing two aspect ratios for equality.
pub const RATIO_EPSILON: f64 = 1e-6;

/// A parsed aspect ratio: `num : den`, both positive and finite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AspectRatio {
    pub num: f64,
    pub den: f64,
}

impl AspectRatio {
    pub fn new(num: f64, den: f64) -> Result<Self, PipelineError> {
        if !num.is_finite() || !den.is_finite() || num <= 0.0 || den <= 0.0 {
            return Err(PipelineError::InvalidAspectRatio(format!("{}:{}", num, den)));
        }
        Ok(Self { num, den })
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.num / self.den
    }
}

/// Parse an aspect-ratio spec string into an [`AspectRatio`].
///
/// Accepts `"W:H"` optionally followed by a descriptive suffix, e.g.
/// `"16:9 (Widescreen)"` or `"1:1.414 A4"` — only the token before the first
/// space is considered. Both sides may be real numbers.
pub fn parse_aspect_ratio(spec: &str) -> Result<AspectRatio, PipelineError> {
    let token = spec.split(' ').next().unwrap_or("");
    let mut parts = token.split(':');
    let num = parts.next().and_then(|p| p.parse::<f64>().ok());
    let den = parts.next().and_then(|p| p.parse::<f64>().ok());

    match (num, den, parts.next()) {
        (Some(n), Some(d), None) if n.is_finite() && d.is_finite() && n > 0.0 && d > 0.0 => {
            Ok(AspectRatio { num: n, den: d })
        }
        _ => Err(PipelineError::InvalidAspectRatio(spec.to_string())),
    }
}

/// Return the name of the supported ratio whose numeric value is closest to
/// `ratio`. Ties break toward the first minimal entry, so the result is
/// deterministic for a fixed enumeration order.
///
/// Used when an external API only accepts a fixed set of ratios but the user
/// chose an arbitrary one.
pub fn closest_supported_ratio<'a>(ratio: f64, supported: &'a [(&'a str, f64)]) -> &'a str {
    let mut best = supported[0].0;
    let mut best_dist = (supported[0].1 - ratio).abs();
    for &(name, value) in &supported[1..] {
        let dist = (value - ratio).abs();
        if dist < best_dist {
            best = name;
            best_dist = dist;
        }
    }
    best
}

/// Compute the letterbox/pillarbox canvas size for a source image and a
/// target ratio.
///
/// If the source is relatively wider than the target, padding goes top and
/// bottom (canvas width = source width); otherwise padding goes left and
/// right (canvas height = source height). The canvas is therefore at least
/// as large as the source in both dimensions and matches the target ratio
/// within rounding.
pub fn compute_letterbox_canvas(
    src_w: u32,
    src_h: u32,
    target: AspectRatio,
) -> Result<(u32, u32), PipelineError> {
    if src_w == 0 || src_h == 0 {
        return Err(PipelineError::DecodeFailed(format!(
            "source image has zero dimension ({}x{})",
            src_w, src_h
        )));
    }
    let ratio = target.value();
    let source_ratio = src_w as f64 / src_h as f64;

    let (canvas_w, canvas_h) = if ratios_match(source_ratio, ratio) {
        // Already at the target ratio — the canvas is the source itself
        (src_w, src_h)
    } else if source_ratio > ratio {
        // Source relatively wider — letterbox (pad top/bottom)
        (src_w, (src_w as f64 / ratio).floor() as u32)
    } else {
        // Source relatively taller — pillarbox (pad left/right)
        ((src_h as f64 * ratio).floor() as u32, src_h)
    };

    if canvas_w > MAX_CANVAS_DIM || canvas_h > MAX_CANVAS_DIM {
        return Err(PipelineError::CanvasTooLarge {
            width: canvas_w,
            height: canvas_h,
        });
    }
    // Rounding never shrinks below the source: the padded axis grows, the
    // other is copied verbatim.
    Ok((canvas_w.max(src_w), canvas_h.max(src_h)))
}

/// The pixel offset that centers a `src_w`×`src_h` image on a
/// `canvas_w`×`canvas_h` canvas.
///
/// Image padding and mask padding both route through this function — they
/// must use bit-identical placement or mask and image misalign.
#[inline]
pub fn center_offset(canvas_w: u32, canvas_h: u32, src_w: u32, src_h: u32) -> (u32, u32) {
    ((canvas_w - src_w) / 2, (canvas_h - src_h) / 2)
}

/// True when two ratios are equal within [`RATIO_EPSILON`] (relative).
#[inline]
pub fn ratios_match(a: f64, b: f64) -> bool {
    (a - b).abs() <= RATIO_EPSILON * b.max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_ratio() {
        let r = parse_aspect_ratio("16:9").unwrap();
        assert_eq!(r.num, 16.0);
        assert_eq!(r.den, 9.0);
    }

    #[test]
    fn parses_ratio_with_label_suffix() {
        let r = parse_aspect_ratio("9:16 (Tall)").unwrap();
        assert!((r.value() - 9.0 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn parses_real_valued_ratio() {
        let r = parse_aspect_ratio("1:1.414 A4 (ISO)").unwrap();
        assert!((r.value() - 1.0 / 1.414).abs() < 1e-12);
    }

    #[test]
    fn rejects_malformed_ratios() {
        assert!(parse_aspect_ratio("").is_err());
        assert!(parse_aspect_ratio("16").is_err());
        assert!(parse_aspect_ratio("16:").is_err());
        assert!(parse_aspect_ratio("16:9:4").is_err());
        assert!(parse_aspect_ratio("a:b").is_err());
        assert!(parse_aspect_ratio("16:0").is_err());
        assert!(parse_aspect_ratio("-4:3").is_err());
    }

    #[test]
    fn closest_ratio_picks_smallest_distance() {
        let supported = [("1:1", 1.0), ("4:3", 4.0 / 3.0), ("16:9", 16.0 / 9.0)];
        assert_eq!(closest_supported_ratio(1.9, &supported), "16:9");
        assert_eq!(closest_supported_ratio(1.0, &supported), "1:1");
        assert_eq!(closest_supported_ratio(1.2, &supported), "4:3");
    }

    #[test]
    fn closest_ratio_tie_breaks_on_first() {
        // 1.5 is equidistant from 1.0 and 2.0 — the first minimal entry wins
        let supported = [("a", 1.0), ("b", 2.0)];
        assert_eq!(closest_supported_ratio(1.5, &supported), "a");
    }

    #[test]
    fn letterbox_pads_the_short_axis_only() {
        // 400x300 (4:3) into 16:9 — source relatively taller, pad left/right
        let target = parse_aspect_ratio("16:9").unwrap();
        let (w, h) = compute_letterbox_canvas(400, 300, target).unwrap();
        assert_eq!((w, h), (533, 300));

        // 400x300 into 9:16 — source relatively wider, pad top/bottom
        let target = parse_aspect_ratio("9:16").unwrap();
        let (w, h) = compute_letterbox_canvas(400, 300, target).unwrap();
        assert_eq!((w, h), (400, 711));
    }

    #[test]
    fn letterbox_canvas_contains_source_and_matches_ratio() {
        let cases = [(640u32, 480u32, "16:9"), (1000, 1000, "4:3"), (123, 457, "3:2")];
        for (sw, sh, spec) in cases {
            let target = parse_aspect_ratio(spec).unwrap();
            let (w, h) = compute_letterbox_canvas(sw, sh, target).unwrap();
            assert!(w >= sw && h >= sh, "{}x{} into {}", sw, sh, spec);
            assert!(w == sw || h == sh, "one axis must be copied verbatim");
            let got = w as f64 / h as f64;
            // Within one pixel of rounding on the padded axis
            assert!((got - target.value()).abs() < 1.0 / h.min(w) as f64 + 1e-6);
        }
    }

    #[test]
    fn letterbox_is_noop_for_matching_ratio() {
        let target = parse_aspect_ratio("4:3").unwrap();
        let (w, h) = compute_letterbox_canvas(800, 600, target).unwrap();
        assert_eq!((w, h), (800, 600));
        assert_eq!(center_offset(w, h, 800, 600), (0, 0));
    }

    #[test]
    fn letterbox_refuses_oversized_canvas() {
        let target = parse_aspect_ratio("1000:1").unwrap();
        let err = compute_letterbox_canvas(100, 20_000, target).unwrap_err();
        assert!(matches!(err, PipelineError::CanvasTooLarge { .. }));
    }
}
