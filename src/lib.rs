#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

//! # imagesim
//!
//! Scores how visually similar two images are. Each image is decoded
//! (JPEG, PNG, GIF, WebP, BMP, TIFF, and HEIC/HEIF with the `heic` feature),
//! embedded with a pretrained ResNet-18, and the two embeddings are compared
//! by cosine similarity.
//!
//! ## Features
//!
//! - **api**: axum server exposing `POST /api/compare/images`
//! - **embeddings**: libtorch-backed ResNet-18 feature extractor
//! - **heic**: HEIC/HEIF decoding through libheif
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imagesim::{
//!     core::{embeddings::{DeviceSpec, Normalization, ResNetExtractor}, loader::load_image},
//!     ImageComparator, UploadedImage, Result,
//! };
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let model = ResNetExtractor::load(
//!         "models/resnet18.ot",
//!         DeviceSpec::Cpu,
//!         Normalization::UnitRange,
//!     )?;
//!     let comparator = ImageComparator::new(Arc::new(model));
//!
//!     let a = load_image(&UploadedImage::new("cat.jpg", std::fs::read("cat.jpg")?))?;
//!     let b = load_image(&UploadedImage::new("dog.heic", std::fs::read("dog.heic")?))?;
//!     println!("similarity: {}", comparator.compare(&a, &b)?.value());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod core;
/// Defines the application's error types and result aliases.
pub mod error;
pub mod models;
mod state;
mod utils;

/// Build-time metadata generated by `built`.
#[allow(missing_docs, unreachable_pub, dead_code)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

// Public API exports
pub use crate::{
    core::{
        embeddings::{FeatureExtractor, Normalization},
        similarity::{cosine_similarity, ImageComparator},
    },
    error::{AppError, Result},
    models::comparison::{CompareResponse, SimilarityScore, UploadedImage},
    state::{AppState, Config},
};

#[cfg(feature = "web")]
pub use crate::api::{compare_images, create_router, health_check};

#[cfg(feature = "embeddings")]
pub use crate::core::embeddings::{DeviceSpec, ResNetExtractor};

/// Initialize logging
///
/// Sets up `env_logger` honoring `RUST_LOG` (default `info`). Events from the
/// tower-http trace layer reach the same logger through tracing's `log`
/// bridge. Calling it twice is harmless.
///
/// # Errors
///
/// Currently infallible; the `Result` keeps the signature stable.
///
/// # Example
///
/// ```no_run
/// use imagesim::init;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     init()?;
///     // Application code here
///     Ok(())
/// }
/// ```
pub fn init() -> Result<()> {
    // Initialize logging with sensible defaults
    let env = env_logger::Env::default()
        .default_filter_or("info")
        .default_write_style_or("auto");

    let initialized = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .format_module_path(false)
        .format_target(false)
        .try_init();

    if initialized.is_ok() {
        log::info!("Initializing imagesim {}", built_info::PKG_VERSION);
    }

    #[cfg(not(feature = "heic"))]
    log::warn!("Built without the 'heic' feature: HEIC/HEIF uploads will be rejected");

    Ok(())
}
