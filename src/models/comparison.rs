use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of decimals kept in a reported similarity score.
pub const SCORE_DECIMALS: u32 = 4;

/// Extensions routed to the HEIF decoder.
pub const HEIF_EXTENSIONS: &[&str] = &["heic", "heif"];

/// An uploaded file: the raw bytes plus the filename the client declared.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Filename as sent in the multipart part (may be empty).
    pub file_name: String,
    /// File contents.
    pub bytes: Bytes,
}

impl UploadedImage {
    /// Creates a new `UploadedImage`.
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Lowercased extension of the declared filename, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
    }

    /// Whether the filename declares a HEIC/HEIF photo.
    pub fn is_heif(&self) -> bool {
        self.extension()
            .map(|ext| HEIF_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }
}

/// A cosine similarity rounded to [`SCORE_DECIMALS`] decimals.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimilarityScore(f64);

impl SimilarityScore {
    /// Rounds a raw cosine similarity.
    pub fn from_cosine(cosine: f32) -> Self {
        Self(round_score(f64::from(cosine), SCORE_DECIMALS))
    }

    /// The rounded value.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<SimilarityScore> for f64 {
    fn from(score: SimilarityScore) -> Self {
        score.0
    }
}

/// Rounds `value` half away from zero to `decimals` decimal places.
pub fn round_score(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Successful response of the compare endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompareResponse {
    /// Cosine similarity of the two embeddings.
    pub similarity_score: SimilarityScore,
}
