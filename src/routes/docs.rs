use axum::Json;
use utoipa::OpenApi;

use crate::dto::cover_image_dto::{
    CoverImageResponse, GenerateCoverImagePayload, GeneratedImageListResponse, ImageModelCatalogResponse,
    ImageModelOption, SelectCoverImagePayload,
};
use crate::dto::job_dto::{ImportJobsPayload, ImportJobsResponse};
use crate::models::generated_image::GeneratedImage;
use crate::models::job_posting::JobPosting;
use crate::routes::{cover_image, jobs};

#[derive(OpenApi)]
#[openapi(
    paths(
        jobs::import_jobs,
        jobs::add_job_to_newsletter,
        jobs::remove_job_from_newsletter,
        cover_image::list_image_models,
        cover_image::list_newsletter_images,
        cover_image::generate_cover_image,
        cover_image::select_cover_image,
    ),
    components(schemas(
        ImportJobsPayload,
        ImportJobsResponse,
        JobPosting,
        GeneratedImage,
        GenerateCoverImagePayload,
        SelectCoverImagePayload,
        CoverImageResponse,
        ImageModelOption,
        ImageModelCatalogResponse,
        GeneratedImageListResponse,
    )),
    tags((name = "newsletter-admin", description = "Newsletter admin backend"))
)]
pub struct ApiDoc;

#[axum::debug_handler]
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
