pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use reqwest::Client;
use sqlx::PgPool;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::services::{
    blob_store::{BlobStore, LocalBlobStore, VercelBlobStore},
    cover_image_service::{CoverImageService, CoverImageSettings},
    gemini_service::GeminiService,
    grok_service::GrokService,
    image_generator::ImageGenerators,
    job_import_service::JobImportService,
    job_posting_service::{JobPostingService, JobPostingStore},
    newsletter_service::NewsletterService,
    serpapi_service::SerpApiService,
};

const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub job_import_service: JobImportService,
    pub job_postings: Arc<dyn JobPostingStore>,
    pub cover_image_service: CoverImageService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Result<Self> {
        Self::from_config(pool, crate::config::get_config())
    }

    pub fn from_config(pool: PgPool, config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        let job_postings: Arc<dyn JobPostingStore> = Arc::new(JobPostingService::new(pool.clone()));
        let search = SerpApiService::new(
            config.serpapi_api_key.clone(),
            config.serpapi_base_url.clone(),
            http_client.clone(),
        );
        let job_import_service = JobImportService::new(Arc::new(search), job_postings.clone());

        let generators = ImageGenerators::new(
            Arc::new(GeminiService::new(
                config.gemini_api_key.clone(),
                config.gemini_api_base_url.clone(),
                http_client.clone(),
            )),
            Arc::new(GrokService::new(
                config.grok_api_key.clone(),
                config.grok_api_base_url.clone(),
                http_client.clone(),
            )),
        );

        let blobs: Arc<dyn BlobStore> = match &config.blob_read_write_token {
            Some(token) => {
                info!("Storing cover images in Vercel Blob");
                Arc::new(VercelBlobStore::new(
                    token.clone(),
                    config.blob_api_url.clone(),
                    http_client,
                ))
            }
            None => {
                info!(dir = %config.uploads_dir, "Storing cover images on local disk");
                Arc::new(LocalBlobStore::new(&config.uploads_dir, &config.public_base_url))
            }
        };

        let cover_image_service = CoverImageService::new(
            generators,
            blobs,
            Arc::new(NewsletterService::new(pool)),
            CoverImageSettings {
                default_model: config.default_image_model,
                max_image_bytes: config.max_cover_image_bytes,
            },
        );

        Ok(Self::from_parts(job_import_service, job_postings, cover_image_service))
    }

    pub fn from_parts(
        job_import_service: JobImportService,
        job_postings: Arc<dyn JobPostingStore>,
        cover_image_service: CoverImageService,
    ) -> Self {
        Self {
            job_import_service,
            job_postings,
            cover_image_service,
        }
    }
}

/// Full HTTP surface. Admin routes share one requests-per-second budget.
pub fn build_router(state: AppState, admin_rps: u32, uploads_dir: &str) -> Router {
    let base_routes = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api-docs/openapi.json", get(routes::docs::openapi_json));

    let admin_api = Router::new()
        .route("/api/jobs/import", post(routes::jobs::import_jobs))
        .route("/admin/jobs/import", post(routes::jobs::import_jobs_form))
        .route(
            "/admin/newsletters/:id/jobs/import",
            post(routes::jobs::import_newsletter_jobs_form),
        )
        .route(
            "/api/newsletters/:id/jobs/:job_id",
            post(routes::jobs::add_job_to_newsletter)
                .delete(routes::jobs::remove_job_from_newsletter),
        )
        .route("/api/image-models", get(routes::cover_image::list_image_models))
        .route(
            "/api/newsletters/:id/images",
            get(routes::cover_image::list_newsletter_images),
        )
        .route(
            "/api/newsletters/:id/cover-image/generate",
            post(routes::cover_image::generate_cover_image),
        )
        .route(
            "/api/newsletters/:id/cover-image",
            put(routes::cover_image::select_cover_image),
        )
        .layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::new_rps_state(admin_rps),
            middleware::rate_limit::rps_middleware,
        ));

    base_routes
        .merge(admin_api)
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .with_state(state)
        .layer(middleware::cors::permissive_cors())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
}
