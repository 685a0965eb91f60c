// ============================================================================
// GENERATIVE MODEL CLIENT — interface to the external image model
// ============================================================================
//
// The pipeline produces the exact payloads this client submits and
// post-processes whatever it returns. Prompt construction, request/response
// shapes, retries and rate limiting all live behind the trait.

use crate::codec::EncodedImage;
use crate::geometry::{self, parse_aspect_ratio};
use crate::log_warn;
use crate::reconcile::SizeTarget;

/// Errors surfaced by a model client implementation.
#[derive(Debug)]
pub enum ClientError {
    /// The model refused the request and returned a textual response instead
    /// of image data.
    Rejected(String),
    /// The response contained no image payload at all.
    NoImageReturned,
    /// Anything transport-level (connectivity, auth, rate limits).
    Transport(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Rejected(msg) => {
                write!(f, "Image generation failed. Model response: {}", msg)
            }
            ClientError::NoImageReturned => {
                write!(f, "Image generation failed. No image data was returned.")
            }
            ClientError::Transport(e) => write!(f, "Model request failed: {}", e),
        }
    }
}

impl std::error::Error for ClientError {}

/// The aspect ratios the text-to-image model accepts directly. Arbitrary
/// user ratios map onto one of these via [`map_ratio_for_generation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NativeRatio {
    #[default]
    Square,
    Portrait3x4,
    Landscape4x3,
    Tall9x16,
    Wide16x9,
}

impl NativeRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            NativeRatio::Square => "1:1",
            NativeRatio::Portrait3x4 => "3:4",
            NativeRatio::Landscape4x3 => "4:3",
            NativeRatio::Tall9x16 => "9:16",
            NativeRatio::Wide16x9 => "16:9",
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            NativeRatio::Square => 1.0,
            NativeRatio::Portrait3x4 => 3.0 / 4.0,
            NativeRatio::Landscape4x3 => 4.0 / 3.0,
            NativeRatio::Tall9x16 => 9.0 / 16.0,
            NativeRatio::Wide16x9 => 16.0 / 9.0,
        }
    }

    pub fn all() -> &'static [NativeRatio] {
        &[
            NativeRatio::Square,
            NativeRatio::Landscape4x3,
            NativeRatio::Portrait3x4,
            NativeRatio::Wide16x9,
            NativeRatio::Tall9x16,
        ]
    }

    fn from_str(s: &str) -> Option<Self> {
        NativeRatio::all().iter().copied().find(|r| r.as_str() == s)
    }
}

/// Upscale factors offered by the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpscaleLevel {
    X2,
    X4,
}

impl UpscaleLevel {
    pub fn label(&self) -> &'static str {
        match self {
            UpscaleLevel::X2 => "2x Upscale (Approx. 2K)",
            UpscaleLevel::X4 => "4x Upscale (Approx. 4K)",
        }
    }

    /// Short form used in derived prompts, e.g. `"2x"`.
    pub fn factor_label(&self) -> &'static str {
        match self {
            UpscaleLevel::X2 => "2x",
            UpscaleLevel::X4 => "4x",
        }
    }

    pub fn all() -> &'static [UpscaleLevel] {
        &[UpscaleLevel::X2, UpscaleLevel::X4]
    }
}

/// Everything the user configured for one generation request.
#[derive(Clone, Debug)]
pub struct SceneConfig {
    pub scene_description: String,
    pub negative_prompt: String,
    pub lighting: String,
    pub camera_perspective: String,
    /// The ratio spec string as selected, e.g. `"16:9 (Widescreen)"`.
    pub aspect_ratio: String,
    /// 1–4 output images per request.
    pub image_count: u8,
    pub size: SizeTarget,
    /// Keep the base subject pixel-faithful rather than re-interpreted.
    pub precise_reference: bool,
    /// Style-reference images, capped at
    /// [`crate::presets::MAX_REFERENCE_IMAGES`].
    pub reference_images: Vec<EncodedImage>,
}

/// A creative concept plus one variation prompt per requested output image.
#[derive(Clone, Debug)]
pub struct ConceptPrompts {
    pub concept: String,
    pub variations: Vec<String>,
}

/// The external generative model, behind an object-safe trait so sessions
/// can be driven by any implementation (or a recording stub in tests).
pub trait SceneClient {
    /// Expand a scene configuration into a concept and per-image variation
    /// prompts.
    fn generate_concept(&self, config: &SceneConfig) -> Result<ConceptPrompts, ClientError>;

    /// Edit `base` guided by `prompt`, constrained to the white regions of
    /// `mask` when one is supplied.
    fn edit_image(
        &self,
        base: &EncodedImage,
        mask: Option<&EncodedImage>,
        prompt: &str,
    ) -> Result<EncodedImage, ClientError>;

    /// Text-to-image generation at one of the natively supported ratios.
    fn generate_from_text(
        &self,
        prompt: &str,
        ratio: NativeRatio,
    ) -> Result<EncodedImage, ClientError>;

    /// Upscale an existing image by the given level.
    fn upscale(
        &self,
        image: &EncodedImage,
        level: UpscaleLevel,
    ) -> Result<EncodedImage, ClientError>;
}

/// Map an arbitrary aspect-ratio spec onto a natively supported ratio.
///
/// Exact native strings pass through; anything else falls back to the
/// closest supported value, and unparseable specs default to square.
pub fn map_ratio_for_generation(spec: &str) -> NativeRatio {
    let token = spec.split(' ').next().unwrap_or("");
    if let Some(native) = NativeRatio::from_str(token) {
        return native;
    }

    match parse_aspect_ratio(spec) {
        Ok(ratio) => {
            let supported: Vec<(&str, f64)> = NativeRatio::all()
                .iter()
                .map(|r| (r.as_str(), r.value()))
                .collect();
            let closest = geometry::closest_supported_ratio(ratio.value(), &supported);
            log_warn!(
                "Unsupported aspect ratio '{}' for text-to-image. Falling back to closest supported ratio: '{}'.",
                spec,
                closest
            );
            NativeRatio::from_str(closest).unwrap_or_default()
        }
        Err(_) => {
            log_warn!(
                "Invalid aspect ratio '{}' for text-to-image generation, defaulting to '1:1'.",
                spec
            );
            NativeRatio::Square
        }
    }
}
