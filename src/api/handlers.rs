use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        State,
    },
    Json,
};
use std::sync::Arc;

use crate::{
    core::loader::load_image,
    error::{AppError, Result},
    models::comparison::{CompareResponse, SimilarityScore, UploadedImage},
    AppState,
};

use super::responses::HealthResponse;

/// Multipart field carrying the first image
pub const FIRST_FIELD: &str = "image1";
/// Multipart field carrying the second image
pub const SECOND_FIELD: &str = "image2";

/// `POST /api/compare/images`
///
/// Reads the `image1` and `image2` file parts, decodes both and returns their
/// similarity. A decode failure on either side is reported once, as a 400
/// with a fixed message.
pub async fn compare_images(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<CompareResponse>> {
    let mut multipart = multipart?;
    let mut first = None;
    let mut second = None;

    // Process the multipart form data
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        let slot = match name.as_str() {
            FIRST_FIELD => &mut first,
            SECOND_FIELD => &mut second,
            _ => {
                log::debug!("Ignoring multipart field {:?}", name);
                continue;
            }
        };

        let file_name = field.file_name().unwrap_or("").to_string();
        let bytes = field.bytes().await?;
        log::debug!("Received {} = {:?} ({} bytes)", name, file_name, bytes.len());
        *slot = Some(UploadedImage::new(file_name, bytes));
    }

    let first = first.ok_or_else(|| AppError::MissingField(FIRST_FIELD.to_string()))?;
    let second = second.ok_or_else(|| AppError::MissingField(SECOND_FIELD.to_string()))?;

    // Decoding and inference are CPU bound
    let comparator = state.comparator.clone();
    let similarity_score = tokio::task::spawn_blocking(move || -> Result<SimilarityScore> {
        let a = load_image(&first)?;
        let b = load_image(&second)?;
        comparator.compare(&a, &b)
    })
    .await??;

    log::info!("Compared images: similarity {}", similarity_score.value());

    Ok(Json(CompareResponse { similarity_score }))
}

/// `GET /api/health`
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(
        state.comparator.model_name(),
        state.started_at,
    ))
}
