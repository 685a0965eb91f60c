//! SceneFE — the headless core of an image-creation front end.
//!
//! The crate prepares a user's base image (and optional hand-painted mask)
//! for an external generative edit model, and reconciles whatever the model
//! returns back to the geometry the user asked for:
//!
//! * [`geometry`] — aspect-ratio parsing and letterbox canvas math
//! * [`pad`] — center a source on a transparent canvas of the target ratio
//! * [`mask`] — edit masks from alpha channels or painted strokes
//! * [`flatten`] — opaque submission images
//! * [`reconcile`] — center-crop and exact-resize of model output
//! * [`editor`] — freehand mask editor with snapshot undo
//! * [`session`] — the pad → mask → flatten → submit → crop → resize pipeline
//!
//! The generative model itself ([`client`]) and the history store
//! ([`history`]) sit behind traits; this crate owns no network or UI code.

pub mod cli;
pub mod client;
pub mod codec;
pub mod editor;
pub mod error;
pub mod flatten;
pub mod geometry;
pub mod history;
pub mod logger;
pub mod mask;
pub mod pad;
pub mod presets;
pub mod reconcile;
pub mod session;

pub use client::{ConceptPrompts, NativeRatio, SceneClient, SceneConfig, UpscaleLevel};
pub use codec::EncodedImage;
pub use editor::{MaskEditor, Tool};
pub use error::PipelineError;
pub use geometry::{AspectRatio, parse_aspect_ratio};
pub use history::{FileStore, HistoryRecord, HistoryStore, MemoryStore};
pub use mask::MaskImage;
pub use pad::PaddedImage;
pub use reconcile::{Interpolation, SizeTarget};
pub use session::{EditSubmission, SceneSession};
