use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::cover_image_dto::{
        CoverImageResponse, GenerateCoverImagePayload, GeneratedImageListResponse,
        ImageModelCatalogResponse, SelectCoverImagePayload,
    },
    error::Result,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/image-models",
    responses(
        (status = 200, description = "Available cover image models", body = ImageModelCatalogResponse)
    )
)]
#[axum::debug_handler]
pub async fn list_image_models(State(state): State<AppState>) -> Json<ImageModelCatalogResponse> {
    Json(state.cover_image_service.catalog())
}

#[utoipa::path(
    get,
    path = "/api/newsletters/{id}/images",
    params(
        ("id" = i64, Path, description = "Newsletter ID")
    ),
    responses(
        (status = 200, description = "Generated images, newest first", body = GeneratedImageListResponse),
        (status = 400, description = "Invalid newsletter id")
    )
)]
#[axum::debug_handler]
pub async fn list_newsletter_images(
    State(state): State<AppState>,
    Path(newsletter_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let items = state.cover_image_service.list_images(newsletter_id).await?;
    Ok(Json(GeneratedImageListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/api/newsletters/{id}/cover-image/generate",
    params(
        ("id" = i64, Path, description = "Newsletter ID")
    ),
    request_body = GenerateCoverImagePayload,
    responses(
        (status = 200, description = "Cover image generated and set", body = CoverImageResponse),
        (status = 400, description = "Missing prompt or unknown model"),
        (status = 404, description = "Newsletter not found"),
        (status = 413, description = "Generated image exceeds the size limit"),
        (status = 422, description = "Generated image could not be decoded"),
        (status = 502, description = "Image provider or storage failed")
    )
)]
#[axum::debug_handler]
pub async fn generate_cover_image(
    State(state): State<AppState>,
    Path(newsletter_id): Path<i64>,
    Json(payload): Json<GenerateCoverImagePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let response = state
        .cover_image_service
        .generate(newsletter_id, &payload.prompt, payload.image_model.as_deref())
        .await?;
    Ok(Json(response))
}

#[utoipa::path(
    put,
    path = "/api/newsletters/{id}/cover-image",
    params(
        ("id" = i64, Path, description = "Newsletter ID")
    ),
    request_body = SelectCoverImagePayload,
    responses(
        (status = 200, description = "Cover image selected", body = CoverImageResponse),
        (status = 400, description = "Image does not belong to the newsletter")
    )
)]
#[axum::debug_handler]
pub async fn select_cover_image(
    State(state): State<AppState>,
    Path(newsletter_id): Path<i64>,
    Json(payload): Json<SelectCoverImagePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let response = state
        .cover_image_service
        .select_existing(newsletter_id, &payload.cover_url)
        .await?;
    Ok(Json(response))
}
