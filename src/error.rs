// ============================================================================
// PIPELINE ERRORS — shared error type for the geometry/masking pipeline
// ============================================================================

/// Error type for pipeline operations (padding, masking, reconciliation, codec).
///
/// Every operation fails fast, before any canvas allocation: no variant is
/// ever paired with a partially-written image.
#[derive(Debug)]
pub enum PipelineError {
    /// The aspect-ratio string could not be parsed into two positive numbers,
    /// or the denominator was zero.
    InvalidAspectRatio(String),
    /// The size-target string was neither `auto` nor a positive `WxH` pair.
    InvalidSizeTarget(String),
    /// The underlying bitmap failed to load or decode.
    DecodeFailed(String),
    /// The output bitmap could not be encoded.
    EncodeFailed(String),
    /// Canvas allocation was refused: a computed dimension exceeds the
    /// per-axis cap. The drawing-surface analogue of resource exhaustion.
    CanvasTooLarge { width: u32, height: u32 },
    /// A mask was used against an image of different dimensions. This can
    /// only happen if image padding and mask padding diverge — a
    /// programming error, not a recoverable user-facing condition.
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    Io(std::io::Error),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::InvalidAspectRatio(s) => {
                write!(f, "Invalid aspect ratio string: {}", s)
            }
            PipelineError::InvalidSizeTarget(s) => {
                write!(f, "Invalid size target: {}", s)
            }
            PipelineError::DecodeFailed(e) => write!(f, "Failed to decode image: {}", e),
            PipelineError::EncodeFailed(e) => write!(f, "Failed to encode image: {}", e),
            PipelineError::CanvasTooLarge { width, height } => {
                write!(f, "Canvas {}x{} exceeds the maximum supported size", width, height)
            }
            PipelineError::DimensionMismatch { expected, actual } => write!(
                f,
                "Mask/image size mismatch: expected {}x{}, got {}x{}",
                expected.0, expected.1, actual.0, actual.1
            ),
            PipelineError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        PipelineError::Io(e)
    }
}
