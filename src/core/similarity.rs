use image::DynamicImage;
use ndarray::ArrayView1;
use std::sync::Arc;

use crate::{
    core::embeddings::FeatureExtractor,
    error::{AppError, Result},
    models::comparison::SimilarityScore,
};

/// Cosine similarity of two embeddings, clamped to [-1, 1].
///
/// A zero vector has no direction, so any comparison with one scores 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(AppError::InvalidInput(format!(
            "embedding dimensions differ: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let a = ArrayView1::from(a);
    let b = ArrayView1::from(b);
    let dot_product = a.dot(&b);
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        Ok((dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0))
    } else {
        Ok(0.0)
    }
}

/// Embeds two images with a shared extractor and scores them.
#[derive(Clone)]
pub struct ImageComparator {
    extractor: Arc<dyn FeatureExtractor>,
}

impl std::fmt::Debug for ImageComparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageComparator")
            .field("extractor", &self.extractor.name())
            .finish()
    }
}

impl ImageComparator {
    /// Creates a comparator around an extractor.
    pub fn new(extractor: Arc<dyn FeatureExtractor>) -> Self {
        Self { extractor }
    }

    /// Name of the underlying extractor.
    pub fn model_name(&self) -> &str {
        self.extractor.name()
    }

    /// Runs the extractor on both images and returns their rounded cosine similarity.
    pub fn compare(&self, first: &DynamicImage, second: &DynamicImage) -> Result<SimilarityScore> {
        let a = self.extractor.extract(first)?;
        let b = self.extractor.extract(second)?;
        let cosine = cosine_similarity(&a, &b)?;
        log::debug!("cosine similarity {:.6} over {} dims", cosine, a.len());
        Ok(SimilarityScore::from_cosine(cosine))
    }
}
