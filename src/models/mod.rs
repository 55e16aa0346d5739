//! Request and response types shared by the library and the HTTP layer

/// Uploaded images and similarity scores.
pub mod comparison;
