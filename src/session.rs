// ============================================================================
// SCENE SESSION — sequences the pipeline around the external model
// ============================================================================
//
// Ordering contract: pad → mask → flatten → submit → crop → resize. Each
// step allocates its own canvas and returns a new image; nothing here is
// shared across concurrent requests.

use std::time::{SystemTime, UNIX_EPOCH};

use image::RgbaImage;

use crate::client::{
    ClientError, SceneClient, SceneConfig, UpscaleLevel, map_ratio_for_generation,
};
use crate::codec::{self, EncodedImage, JPEG_QUALITY};
use crate::error::PipelineError;
use crate::flatten::{self, DEFAULT_BACKGROUND};
use crate::geometry::{AspectRatio, parse_aspect_ratio};
use crate::history::{HistoryRecord, HistoryStore, StoreError};
use crate::mask;
use crate::pad;
use crate::presets::{MAX_IMAGE_COUNT, MAX_REFERENCE_IMAGES, MIN_IMAGE_COUNT};
use crate::reconcile::{self, Interpolation, SizeTarget};
use crate::{log_info, log_warn};

/// Error type for a full generation run: any stage may fail.
#[derive(Debug)]
pub enum SessionError {
    Pipeline(PipelineError),
    Client(ClientError),
    Store(StoreError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Pipeline(e) => write!(f, "{}", e),
            SessionError::Client(e) => write!(f, "{}", e),
            SessionError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<PipelineError> for SessionError {
    fn from(e: PipelineError) -> Self {
        SessionError::Pipeline(e)
    }
}

impl From<ClientError> for SessionError {
    fn from(e: ClientError) -> Self {
        SessionError::Client(e)
    }
}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        SessionError::Store(e)
    }
}

/// The payloads handed to the edit model for one request.
#[derive(Debug)]
pub struct EditSubmission {
    /// Opaque base image (JPEG — no alpha, smaller).
    pub base: EncodedImage,
    /// Edit mask (PNG), same canvas dimensions as the base.
    pub mask: EncodedImage,
    pub canvas_size: (u32, u32),
}

/// Build the submission payloads for one edit request: pad the source to the
/// target ratio, derive the mask (from the user's strokes when present,
/// otherwise from the padding transparency), then flatten the base.
///
/// A user mask must have the source image's dimensions — both paddings run
/// through the same centering math, and the result is cross-checked before
/// anything is submitted.
pub fn prepare_edit(
    source: &RgbaImage,
    user_mask: Option<&RgbaImage>,
    target: AspectRatio,
) -> Result<EditSubmission, PipelineError> {
    let padded = pad::pad(source, target)?;

    let mask = match user_mask {
        Some(strokes) => mask::pad_mask(strokes, target)?,
        None => mask::mask_from_alpha(&padded),
    };
    mask.ensure_matches(&padded)?;

    let flat = flatten::flatten(&padded, DEFAULT_BACKGROUND);
    Ok(EditSubmission {
        base: codec::encode_jpeg(&flat, JPEG_QUALITY)?,
        mask: codec::encode_png(mask.image())?,
        canvas_size: padded.dimensions(),
    })
}

/// One user-facing editing session: the current base image and the mask
/// drawn for it, if any.
///
/// The cached mask is tied to the base image — it is dropped when a new base
/// is uploaded and consumed by a successful generation.
#[derive(Default)]
pub struct SceneSession {
    base_image: Option<RgbaImage>,
    current_mask: Option<RgbaImage>,
}

impl SceneSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new base image, invalidating any mask drawn for the
    /// previous one.
    pub fn set_base_image(&mut self, image: RgbaImage) {
        self.base_image = Some(image);
        self.current_mask = None;
    }

    pub fn clear_base_image(&mut self) {
        self.base_image = None;
        self.current_mask = None;
    }

    /// Install a mask exported from the freehand editor.
    pub fn set_mask(&mut self, mask: RgbaImage) {
        self.current_mask = Some(mask);
    }

    pub fn has_base_image(&self) -> bool {
        self.base_image.is_some()
    }

    pub fn has_mask(&self) -> bool {
        self.current_mask.is_some()
    }

    /// Run one full generation request: expand the config into per-image
    /// prompts, generate each output (edit path when a base image is set,
    /// text-to-image otherwise), reconcile geometry, and store the results
    /// newest-first.
    pub fn generate(
        &mut self,
        client: &dyn SceneClient,
        store: &mut dyn HistoryStore,
        config: &SceneConfig,
    ) -> Result<Vec<HistoryRecord>, SessionError> {
        let target = parse_aspect_ratio(&config.aspect_ratio)?;
        let count = config.image_count.clamp(MIN_IMAGE_COUNT, MAX_IMAGE_COUNT);
        if config.reference_images.len() > MAX_REFERENCE_IMAGES {
            log_warn!(
                "{} reference images supplied, only the first {} are used",
                config.reference_images.len(),
                MAX_REFERENCE_IMAGES
            );
        }

        let prompts = client.generate_concept(config)?;
        let negative = if config.negative_prompt.is_empty() {
            None
        } else {
            Some(config.negative_prompt.clone())
        };

        let mut results = Vec::with_capacity(count as usize);
        for i in 0..count {
            let prompt = prompts
                .variations
                .get(i as usize)
                .cloned()
                .unwrap_or_else(|| prompts.concept.clone());
            log_info!("Generating image {}/{}", i + 1, count);

            let image = if let Some(base) = &self.base_image {
                let submission = prepare_edit(base, self.current_mask.as_ref(), target)?;
                let edited = client.edit_image(&submission.base, Some(&submission.mask), &prompt)?;
                // The edit model may return a square image regardless of the
                // canvas we sent; force the requested geometry back.
                reconcile::reconcile(
                    &edited.decode()?,
                    target,
                    config.size,
                    Interpolation::default(),
                )?
            } else {
                let native = map_ratio_for_generation(&config.aspect_ratio);
                let generated = client.generate_from_text(&prompt, native)?;
                let decoded = generated.decode()?;
                match config.size {
                    SizeTarget::Auto => decoded,
                    SizeTarget::Exact { width, height } => {
                        reconcile::resize_exact(&decoded, width, height, Interpolation::default())
                    }
                }
            };

            let (w, h) = image.dimensions();
            let record = HistoryRecord::new(
                codec::encode_png(&image)?,
                w,
                h,
                prompt,
                negative.clone(),
                now_millis(),
            );
            store.put(record.clone())?;
            results.push(record);
        }

        // A successful run consumes the mask; the next request either gets a
        // freshly drawn one or falls back to the automatic outpaint mask.
        self.current_mask = None;
        Ok(results)
    }

    /// Upscale an existing record, decoding the result to recover its final
    /// pixel dimensions, and store the new image alongside the original.
    pub fn upscale(
        &self,
        client: &dyn SceneClient,
        store: &mut dyn HistoryStore,
        record: &HistoryRecord,
        level: UpscaleLevel,
    ) -> Result<HistoryRecord, SessionError> {
        let upscaled = client.upscale(&record.image, level)?;
        let decoded = upscaled.decode()?;
        let (w, h) = decoded.dimensions();

        let result = HistoryRecord::new(
            codec::encode_png(&decoded)?,
            w,
            h,
            format!("{} (Upscaled {})", record.prompt, level.factor_label()),
            record.negative_prompt.clone(),
            now_millis(),
        );
        store.put(result.clone())?;
        Ok(result)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
