//! Core functionality: decoding, feature extraction and scoring

/// Turns decoded images into embedding vectors.
pub mod embeddings;
/// HEIC/HEIF decoding and strided plane reconstruction.
pub mod heic;
/// Decodes uploaded bytes into RGB images.
pub mod loader;
/// Cosine similarity and the two-image comparison pipeline.
pub mod similarity;
