// ============================================================================
// FREEHAND MASK EDITOR — headless stroke canvas with snapshot undo history
// ============================================================================
//
// The editor paints white strokes on a transparent bitmap sized to fit a
// display viewport while preserving the source image's aspect ratio. The
// exported mask is rescaled back to the source's native resolution, so the
// painted shape survives any on-screen zoom level.

use std::collections::VecDeque;

use image::{Rgba, RgbaImage, imageops};

use crate::error::PipelineError;
use crate::geometry::MAX_CANVAS_DIM;
use crate::reconcile::Interpolation;

/// Snapshot history depth. Oldest entries are dropped beyond the cap.
pub const HISTORY_CAP: usize = 20;

/// Stroke paint: translucent white (80 % opacity).
pub const BRUSH_COLOR: Rgba<u8> = Rgba([255, 255, 255, 204]);

/// Brush diameter bounds, in display-canvas pixels.
pub const MIN_BRUSH_SIZE: f32 = 5.0;
pub const MAX_BRUSH_SIZE: f32 = 150.0;
pub const DEFAULT_BRUSH_SIZE: f32 = 40.0;

/// Active painting tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tool {
    /// Paints translucent white with source-over compositing.
    #[default]
    Brush,
    /// Removes previously painted white (destination-out) — it does not
    /// paint black.
    Eraser,
}

/// One editing session over a single source image.
///
/// State machine: `Idle` → (pointer down) → `Drawing` → (pointer up/leave) →
/// `Idle`. Each completed stroke pushes a full-canvas snapshot onto the
/// history; undo pops back to the previous snapshot. Not shareable across
/// concurrent edit sessions — a new session starts from a fresh history.
pub struct MaskEditor {
    canvas: RgbaImage,
    source_size: (u32, u32),
    history: VecDeque<RgbaImage>,
    last_point: Option<(f32, f32)>,
    pub tool: Tool,
    pub brush_size: f32,
}

impl MaskEditor {
    /// Start an editing session for a `source_w`×`source_h` image displayed
    /// inside a `viewport_w`×`viewport_h` area. The drawing canvas is fitted
    /// to the viewport at the source's aspect ratio; index 0 of the history
    /// is the blank initial snapshot.
    pub fn new(
        source_w: u32,
        source_h: u32,
        viewport_w: u32,
        viewport_h: u32,
    ) -> Result<Self, PipelineError> {
        if source_w == 0 || source_h == 0 {
            return Err(PipelineError::DecodeFailed(format!(
                "source image has zero dimension ({}x{})",
                source_w, source_h
            )));
        }
        if source_w > MAX_CANVAS_DIM || source_h > MAX_CANVAS_DIM {
            return Err(PipelineError::CanvasTooLarge {
                width: source_w,
                height: source_h,
            });
        }
        let (w, h) = fit_to_viewport(source_w, source_h, viewport_w, viewport_h);
        let canvas = RgbaImage::new(w, h);
        let mut history = VecDeque::with_capacity(HISTORY_CAP);
        history.push_back(canvas.clone());
        Ok(Self {
            canvas,
            source_size: (source_w, source_h),
            history,
            last_point: None,
            tool: Tool::default(),
            brush_size: DEFAULT_BRUSH_SIZE,
        })
    }

    #[inline]
    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    #[inline]
    pub fn is_drawing(&self) -> bool {
        self.last_point.is_some()
    }

    #[inline]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Pointer down: enter `Drawing` and stamp at the start position.
    pub fn begin_stroke(&mut self, x: f32, y: f32) {
        self.last_point = Some((x, y));
        let radius = self.radius();
        stamp(&mut self.canvas, x, y, radius, self.tool);
    }

    /// Pointer move while `Drawing`: draw a line segment from the last point
    /// to the current one. Ignored when idle.
    pub fn continue_stroke(&mut self, x: f32, y: f32) {
        let Some((lx, ly)) = self.last_point else {
            return;
        };
        let radius = self.radius();
        // Stamp along the segment densely enough that round caps overlap
        let dx = x - lx;
        let dy = y - ly;
        let dist = (dx * dx + dy * dy).sqrt();
        let step = (radius * 0.5).max(1.0);
        let steps = (dist / step).ceil().max(1.0) as u32;
        for i in 1..=steps {
            let t = i as f32 / steps as f32;
            stamp(&mut self.canvas, lx + dx * t, ly + dy * t, radius, self.tool);
        }
        self.last_point = Some((x, y));
    }

    /// Pointer up/leave: back to `Idle`, pushing the finished stroke onto
    /// the history. A no-op when no stroke is active.
    pub fn end_stroke(&mut self) {
        if self.last_point.take().is_some() {
            self.push_snapshot();
        }
    }

    /// Restore the canvas to the previous snapshot. Undoing past the single
    /// initial blank snapshot is a no-op.
    pub fn undo(&mut self) {
        if self.history.len() > 1 {
            self.history.pop_back();
            if let Some(prev) = self.history.back() {
                self.canvas = prev.clone();
            }
        }
    }

    /// Wipe the canvas to fully transparent and record that as a new
    /// history entry.
    pub fn clear(&mut self) {
        self.canvas = RgbaImage::new(self.canvas.width(), self.canvas.height());
        self.push_snapshot();
    }

    /// Viewport resize: recompute the canvas size from the source aspect
    /// ratio and the new bounds, then redraw the latest snapshot onto the
    /// new canvas unscaled (content is only rescaled at final export).
    pub fn resize_viewport(&mut self, viewport_w: u32, viewport_h: u32) {
        let (w, h) = fit_to_viewport(self.source_size.0, self.source_size.1, viewport_w, viewport_h);
        if (w, h) == self.canvas.dimensions() {
            return;
        }
        let mut resized = RgbaImage::new(w, h);
        if let Some(last) = self.history.back() {
            imageops::replace(&mut resized, last, 0, 0);
        }
        self.canvas = resized;
        self.last_point = None;
    }

    /// Export the stroke bitmap at the source image's native resolution,
    /// scaling the display canvas up or down to match.
    pub fn export(&self) -> RgbaImage {
        let (sw, sh) = self.source_size;
        if self.canvas.dimensions() == (sw, sh) {
            return self.canvas.clone();
        }
        imageops::resize(&self.canvas, sw, sh, Interpolation::default().to_filter())
    }

    #[inline]
    fn radius(&self) -> f32 {
        (self.brush_size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE)) * 0.5
    }

    fn push_snapshot(&mut self) {
        if self.history.len() >= HISTORY_CAP {
            self.history.pop_front();
        }
        self.history.push_back(self.canvas.clone());
    }
}

/// Fit a source aspect ratio into viewport bounds: full viewport width
/// first, clamped to the viewport height.
fn fit_to_viewport(src_w: u32, src_h: u32, viewport_w: u32, viewport_h: u32) -> (u32, u32) {
    let aspect = src_w as f64 / src_h as f64;
    let vw = viewport_w.max(1) as f64;
    let vh = viewport_h.max(1) as f64;

    let mut w = vw;
    let mut h = vw / aspect;
    if h > vh {
        h = vh;
        w = vh * aspect;
    }
    ((w.floor() as u32).max(1), (h.floor() as u32).max(1))
}

/// Stamp a hard-edged round brush footprint at (cx, cy).
///
/// Brush: white at 80 % alpha; overlapping stamps saturate via max-alpha so
/// a single stroke stays uniformly translucent instead of accumulating.
/// Eraser: clears alpha entirely inside the footprint.
fn stamp(canvas: &mut RgbaImage, cx: f32, cy: f32, radius: f32, tool: Tool) {
    let (w, h) = canvas.dimensions();
    let r = radius.max(0.5);
    let min_x = ((cx - r).floor().max(0.0)) as u32;
    let min_y = ((cy - r).floor().max(0.0)) as u32;
    let max_x = ((cx + r).ceil() as i64).clamp(0, w as i64) as u32;
    let max_y = ((cy + r).ceil() as i64).clamp(0, h as i64) as u32;
    let r_sq = r * r;

    for y in min_y..max_y {
        for x in min_x..max_x {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            if dx * dx + dy * dy > r_sq {
                continue;
            }
            let px = canvas.get_pixel_mut(x, y);
            match tool {
                Tool::Brush => {
                    *px = Rgba([255, 255, 255, px[3].max(BRUSH_COLOR[3])]);
                }
                Tool::Eraser => {
                    *px = Rgba([0, 0, 0, 0]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> MaskEditor {
        // Source 200x100 in a 100x100 viewport → 100x50 display canvas
        MaskEditor::new(200, 100, 100, 100).unwrap()
    }

    fn painted_pixels(canvas: &RgbaImage) -> usize {
        canvas.pixels().filter(|p| p[3] > 0).count()
    }

    #[test]
    fn canvas_fits_viewport_at_source_ratio() {
        let ed = editor();
        assert_eq!(ed.canvas().dimensions(), (100, 50));

        // Tall viewport clamps on width instead
        let ed = MaskEditor::new(100, 200, 300, 100).unwrap();
        assert_eq!(ed.canvas().dimensions(), (50, 100));
    }

    #[test]
    fn stroke_paints_translucent_white() {
        let mut ed = editor();
        ed.begin_stroke(50.0, 25.0);
        ed.continue_stroke(70.0, 25.0);
        ed.end_stroke();

        assert!(!ed.is_drawing());
        let p = ed.canvas().get_pixel(60, 25);
        assert_eq!(*p, Rgba([255, 255, 255, 204]));
        // Alpha saturates rather than accumulating across overlapping stamps
        assert!(ed.canvas().pixels().all(|p| p[3] == 0 || p[3] == 204));
    }

    #[test]
    fn eraser_removes_paint_without_painting_black() {
        let mut ed = editor();
        ed.begin_stroke(50.0, 25.0);
        ed.end_stroke();
        assert!(painted_pixels(ed.canvas()) > 0);

        ed.tool = Tool::Eraser;
        ed.brush_size = MAX_BRUSH_SIZE;
        ed.begin_stroke(50.0, 25.0);
        ed.end_stroke();
        assert_eq!(painted_pixels(ed.canvas()), 0);
    }

    #[test]
    fn moves_while_idle_are_ignored() {
        let mut ed = editor();
        ed.continue_stroke(10.0, 10.0);
        assert_eq!(painted_pixels(ed.canvas()), 0);
        assert_eq!(ed.history_len(), 1);
    }

    #[test]
    fn undo_restores_previous_stroke_state() {
        let mut ed = editor();
        ed.begin_stroke(20.0, 20.0);
        ed.end_stroke();
        let after_first = ed.canvas().clone();

        ed.begin_stroke(80.0, 30.0);
        ed.end_stroke();
        assert_ne!(ed.canvas().as_raw(), after_first.as_raw());

        ed.undo();
        assert_eq!(ed.canvas().as_raw(), after_first.as_raw());
    }

    #[test]
    fn undo_bottoms_out_at_blank_state() {
        let mut ed = editor();
        for i in 0..3 {
            ed.begin_stroke(20.0 + i as f32 * 10.0, 25.0);
            ed.end_stroke();
        }
        for _ in 0..8 {
            ed.undo();
        }
        assert_eq!(painted_pixels(ed.canvas()), 0);
        assert_eq!(ed.history_len(), 1);
    }

    #[test]
    fn history_is_capped() {
        let mut ed = editor();
        for i in 0..(HISTORY_CAP + 10) {
            ed.begin_stroke((i % 90) as f32 + 5.0, 25.0);
            ed.end_stroke();
        }
        assert_eq!(ed.history_len(), HISTORY_CAP);
    }

    #[test]
    fn clear_wipes_and_is_undoable() {
        let mut ed = editor();
        ed.begin_stroke(50.0, 25.0);
        ed.end_stroke();
        let before = ed.canvas().clone();

        ed.clear();
        assert_eq!(painted_pixels(ed.canvas()), 0);

        ed.undo();
        assert_eq!(ed.canvas().as_raw(), before.as_raw());
    }

    #[test]
    fn export_rescales_to_native_resolution() {
        let mut ed = editor();
        ed.brush_size = 20.0;
        ed.begin_stroke(50.0, 25.0);
        ed.end_stroke();

        let exported = ed.export();
        assert_eq!(exported.dimensions(), (200, 100));
        // The painted blob survives the 2x upscale around the stroke center
        assert!(exported.get_pixel(100, 50)[3] > 0);
        assert_eq!(exported.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn viewport_resize_keeps_last_snapshot_content() {
        let mut ed = editor();
        ed.begin_stroke(10.0, 10.0);
        ed.end_stroke();
        let before = painted_pixels(ed.canvas());
        assert!(before > 0);

        // Larger viewport: canvas grows, strokes redrawn unscaled at origin
        ed.resize_viewport(200, 200);
        assert_eq!(ed.canvas().dimensions(), (200, 100));
        assert_eq!(painted_pixels(ed.canvas()), before);
    }
}
