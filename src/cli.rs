// ============================================================================
// SceneFE CLI — headless batch access to the geometry/masking pipeline
// ============================================================================
//
// Usage examples:
//   scenefe --input photo.png --op pad --ratio 16:9 --output padded.png
//   scenefe -i photo.png --op mask --ratio 16:9 -o mask.png
//   scenefe -i strokes.png --op padmask --ratio 16:9 -o mask.png
//   scenefe -i photo.png --op flatten --ratio 16:9 -o base.jpg
//   scenefe -i "renders/*.png" --op crop --ratio 1:1 --output-dir cropped/
//   scenefe -i result.png --op resize --size 1920x1080 -o final.png
//
// All processing runs synchronously on the current thread.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use image::Rgba;

use crate::codec::{load_image, save_image};
use crate::flatten::{self, DEFAULT_BACKGROUND};
use crate::geometry::parse_aspect_ratio;
use crate::mask;
use crate::pad;
use crate::reconcile::{self, Interpolation, SizeTarget};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Pipeline operation to apply to each input image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PipelineOp {
    /// Center the image on a transparent canvas of the target ratio.
    Pad,
    /// Pad, then derive the outpaint mask from the padding transparency.
    Mask,
    /// Treat the input as a stroke bitmap and pad it over black fill.
    Padmask,
    /// Pad, then flatten over the background color (opaque output).
    Flatten,
    /// Center-crop to the target ratio.
    Crop,
    /// Resize to the exact --size dimensions.
    Resize,
}

/// SceneFE headless pipeline processor.
///
/// Apply the padding, masking, flattening and reconciliation steps of the
/// generation pipeline to image files — no model access required.
#[derive(Parser, Debug)]
#[command(
    name = "scenefe",
    about = "SceneFE headless image pipeline processor",
    long_about = "Run the generation-pipeline geometry steps on image files:\n\
                  letterbox padding, outpaint-mask derivation, stroke-mask\n\
                  padding, opaque flattening, aspect-ratio cropping and exact\n\
                  resizing.\n\n\
                  Example:\n  \
                  scenefe --input photo.png --op pad --ratio 16:9 --output padded.png\n  \
                  scenefe -i \"renders/*.png\" --op crop --ratio 1:1 --output-dir cropped/"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Pipeline operation to apply.
    #[arg(long, value_enum)]
    pub op: PipelineOp,

    /// Target aspect ratio, e.g. "16:9". Required by pad, mask, padmask,
    /// flatten and crop.
    #[arg(short, long, value_name = "W:H")]
    pub ratio: Option<String>,

    /// Exact output size for resize, e.g. "1920x1080".
    #[arg(short, long, value_name = "WxH")]
    pub size: Option<String>,

    /// Background color for flatten: white, black, or #rrggbb.
    #[arg(long, default_value = "white", value_name = "COLOR")]
    pub background: String,

    /// Resampling filter for resize: nearest, bilinear, bicubic, lanczos3.
    #[arg(long, default_value = "bicubic", value_name = "FILTER")]
    pub filter: String,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    /// Files are written here with the original stem and a fitting extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    // Resolve glob patterns / literal paths → concrete PathBufs
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    // Multiple inputs require --output-dir, not --output
    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    // Validate per-op parameters once, up front
    let params = match OpParams::from_args(&args) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Create output directory if specified
    if let Some(dir) = &args.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "error: could not create output directory '{}': {}",
                dir.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }

        let file_start = Instant::now();

        let output_path = match build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            args.op,
        ) {
            Some(p) => p,
            None => {
                eprintln!(
                    "  error: cannot determine output path for '{}'.",
                    input_path.display()
                );
                any_failure = true;
                continue;
            }
        };

        match run_one(input_path, &output_path, args.op, &params) {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

/// Validated operation parameters, shared across all input files.
struct OpParams {
    ratio: Option<crate::geometry::AspectRatio>,
    size: SizeTarget,
    background: Rgba<u8>,
    filter: Interpolation,
}

impl OpParams {
    fn from_args(args: &CliArgs) -> Result<Self, String> {
        let ratio = match &args.ratio {
            Some(spec) => Some(parse_aspect_ratio(spec).map_err(|e| e.to_string())?),
            None => None,
        };
        if ratio.is_none() && args.op != PipelineOp::Resize {
            return Err(format!(
                "--ratio is required for the '{}' operation",
                format!("{:?}", args.op).to_lowercase()
            ));
        }

        let size = match &args.size {
            Some(s) => SizeTarget::parse(s).map_err(|e| e.to_string())?,
            None if args.op == PipelineOp::Resize => {
                return Err("--size is required for the 'resize' operation".to_string());
            }
            None => SizeTarget::Auto,
        };
        if args.op == PipelineOp::Resize && size == SizeTarget::Auto {
            return Err("--size auto is not a valid resize target".to_string());
        }

        Ok(Self {
            ratio,
            size,
            background: parse_background(&args.background)?,
            filter: parse_filter(&args.filter)?,
        })
    }
}

fn run_one(input: &Path, output: &Path, op: PipelineOp, params: &OpParams) -> Result<(), String> {
    let source = load_image(input).map_err(|e| format!("load failed: {}", e))?;

    let result = if op == PipelineOp::Resize {
        match params.size {
            SizeTarget::Exact { width, height } => {
                reconcile::resize_exact(&source, width, height, params.filter)
            }
            SizeTarget::Auto => return Err("--size is required for resize".to_string()),
        }
    } else {
        // Every remaining op was validated to carry a ratio
        let ratio = params
            .ratio
            .ok_or_else(|| "--ratio is required".to_string())?;
        match op {
            PipelineOp::Pad => pad::pad(&source, ratio)
                .map_err(|e| e.to_string())?
                .into_image(),
            PipelineOp::Mask => {
                let padded = pad::pad(&source, ratio).map_err(|e| e.to_string())?;
                mask::mask_from_alpha(&padded).into_image()
            }
            PipelineOp::Padmask => mask::pad_mask(&source, ratio)
                .map_err(|e| e.to_string())?
                .into_image(),
            PipelineOp::Flatten => {
                let padded = pad::pad(&source, ratio).map_err(|e| e.to_string())?;
                flatten::flatten(&padded, params.background)
            }
            PipelineOp::Crop => {
                reconcile::crop_to_aspect_ratio(&source, ratio).map_err(|e| e.to_string())?
            }
            PipelineOp::Resize => unreachable!(),
        }
    };

    save_image(&result, output).map_err(|e| format!("save failed: {}", e))
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            // Literal path — use directly
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        // Treat as glob pattern
        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: same directory as input, same stem, new extension
///    (appends `_out` to stem if it would collide with the input path)
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    op: PipelineOp,
) -> Option<PathBuf> {
    // Explicit output path
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    // Flatten output is opaque — JPEG; everything else keeps alpha — PNG
    let ext = if op == PipelineOp::Flatten { "jpg" } else { "png" };
    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.{}", stem, ext)));
    }

    // Write next to the input file
    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(format!("{}.{}", stem, ext));

    // Avoid silent overwrite of the input
    if candidate == input {
        Some(parent.join(format!("{}_out.{}", stem, ext)))
    } else {
        Some(candidate)
    }
}

/// Parse a background color: `white`, `black`, or `#rrggbb`.
fn parse_background(value: &str) -> Result<Rgba<u8>, String> {
    match value.to_lowercase().as_str() {
        "white" => Ok(DEFAULT_BACKGROUND),
        "black" => Ok(Rgba([0, 0, 0, 255])),
        hex if hex.starts_with('#') && hex.len() == 7 => {
            let r = u8::from_str_radix(&hex[1..3], 16);
            let g = u8::from_str_radix(&hex[3..5], 16);
            let b = u8::from_str_radix(&hex[5..7], 16);
            match (r, g, b) {
                (Ok(r), Ok(g), Ok(b)) => Ok(Rgba([r, g, b, 255])),
                _ => Err(format!("invalid hex color '{}'", value)),
            }
        }
        _ => Err(format!(
            "unknown background '{}' (expected white, black, or #rrggbb)",
            value
        )),
    }
}

fn parse_filter(value: &str) -> Result<Interpolation, String> {
    match value.to_lowercase().as_str() {
        "nearest" => Ok(Interpolation::Nearest),
        "bilinear" => Ok(Interpolation::Bilinear),
        "bicubic" => Ok(Interpolation::Bicubic),
        "lanczos3" => Ok(Interpolation::Lanczos3),
        _ => Err(format!(
            "unknown filter '{}' (expected nearest, bilinear, bicubic, or lanczos3)",
            value
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_parsing_accepts_names_and_hex() {
        assert_eq!(parse_background("white").unwrap(), Rgba([255, 255, 255, 255]));
        assert_eq!(parse_background("Black").unwrap(), Rgba([0, 0, 0, 255]));
        assert_eq!(parse_background("#10ff80").unwrap(), Rgba([16, 255, 128, 255]));
        assert!(parse_background("#12345").is_err());
        assert!(parse_background("chartreuse").is_err());
    }

    #[test]
    fn output_path_switches_extension_per_op() {
        let p =
            build_output_path(Path::new("in/photo.png"), None, None, PipelineOp::Flatten).unwrap();
        assert_eq!(p, PathBuf::from("in/photo.jpg"));

        let p = build_output_path(Path::new("in/photo.png"), None, None, PipelineOp::Pad).unwrap();
        assert_eq!(p, PathBuf::from("in/photo_out.png"));
    }
}
