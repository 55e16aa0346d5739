//! Compares two local image files without starting the server
//!
//! ```text
//! cargo run --example compare_files -- cat.jpg dog.heic
//! ```

use std::sync::Arc;

use anyhow::{bail, Result};
use imagesim::{
    core::loader::load_image, init, DeviceSpec, ImageComparator, Normalization, ResNetExtractor,
    UploadedImage,
};

fn main() -> Result<()> {
    // Initialize the application
    init()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [first, second] = args.as_slice() else {
        bail!("usage: compare_files <image1> <image2>");
    };

    let weights = std::env::var("IMAGESIM_MODEL_WEIGHTS")
        .unwrap_or_else(|_| "models/resnet18.ot".to_string());
    let model = ResNetExtractor::load(&weights, DeviceSpec::Auto, Normalization::UnitRange)?;
    let comparator = ImageComparator::new(Arc::new(model));

    let img1 = load_image(&UploadedImage::new(first.as_str(), std::fs::read(first)?))?;
    let img2 = load_image(&UploadedImage::new(second.as_str(), std::fs::read(second)?))?;

    let score = comparator.compare(&img1, &img2)?;
    println!("Similarity between images: {:.2}%", score.value() * 100.0);

    Ok(())
}
