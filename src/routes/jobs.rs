use axum::{
    extract::{Form, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect},
};
use tracing::warn;
use validator::Validate;

use crate::{
    dto::job_dto::{DatePosted, ImportJobsForm, ImportJobsPayload, ImportJobsResponse},
    error::Result,
    models::job_posting::JobPosting,
    services::job_import_service::ImportSummary,
    utils::validation::require_positive_id,
    AppState,
};

impl From<ImportSummary> for ImportJobsResponse {
    fn from(summary: ImportSummary) -> Self {
        Self {
            imported: summary.imported,
            fetched: summary.fetched,
            pages_requested: summary.pages_requested,
        }
    }
}

/// `<base>?status=success&imported=N` or `<base>?status=error&message=...`.
pub fn import_redirect_target(base: &str, outcome: &Result<ImportSummary>) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    match outcome {
        Ok(summary) => {
            query
                .append_pair("status", "success")
                .append_pair("imported", &summary.imported.to_string());
        }
        Err(err) => {
            query
                .append_pair("status", "error")
                .append_pair("message", &err.user_message());
        }
    }
    format!("{}?{}", base, query.finish())
}

#[utoipa::path(
    post,
    path = "/api/jobs/import",
    request_body = ImportJobsPayload,
    responses(
        (status = 200, description = "Import finished", body = ImportJobsResponse),
        (status = 400, description = "Missing search query"),
        (status = 502, description = "Job search API failed")
    )
)]
#[axum::debug_handler]
pub async fn import_jobs(
    State(state): State<AppState>,
    Json(payload): Json<ImportJobsPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let summary = state.job_import_service.import(payload.into()).await?;
    Ok(Json(ImportJobsResponse::from(summary)))
}

#[axum::debug_handler]
pub async fn import_jobs_form(
    State(state): State<AppState>,
    Form(form): Form<ImportJobsForm>,
) -> Redirect {
    let outcome = state.job_import_service.import(form.into_request(None)).await;
    if let Err(err) = &outcome {
        warn!(error = %err, "Job import from form failed");
    }
    Redirect::to(&import_redirect_target("/admin/jobs", &outcome))
}

#[axum::debug_handler]
pub async fn import_newsletter_jobs_form(
    State(state): State<AppState>,
    Path(newsletter_id): Path<i64>,
    Form(form): Form<ImportJobsForm>,
) -> Redirect {
    let base = format!("/admin/newsletters/{}/jobs", newsletter_id);
    let outcome = match require_positive_id(newsletter_id, "Invalid newsletter id") {
        Ok(_) => {
            state
                .job_import_service
                .import(form.into_request(Some(DatePosted::Today)))
                .await
        }
        Err(err) => Err(err),
    };
    if let Err(err) = &outcome {
        warn!(error = %err, newsletter_id, "Newsletter job import failed");
    }
    Redirect::to(&import_redirect_target(&base, &outcome))
}

#[utoipa::path(
    post,
    path = "/api/newsletters/{id}/jobs/{job_id}",
    params(
        ("id" = i64, Path, description = "Newsletter ID"),
        ("job_id" = i64, Path, description = "Job posting ID")
    ),
    responses(
        (status = 200, description = "Job added to newsletter", body = JobPosting),
        (status = 400, description = "Invalid id"),
        (status = 404, description = "Job posting not found")
    )
)]
#[axum::debug_handler]
pub async fn add_job_to_newsletter(
    State(state): State<AppState>,
    Path((newsletter_id, job_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse> {
    let job_id = require_positive_id(job_id, "Invalid job id")?;
    let newsletter_id = require_positive_id(newsletter_id, "Invalid newsletter id")?;
    state
        .job_postings
        .assign_to_newsletter(job_id, newsletter_id)
        .await?;
    let posting = state.job_postings.get_by_id(job_id).await?;
    Ok(Json(posting))
}

#[utoipa::path(
    delete,
    path = "/api/newsletters/{id}/jobs/{job_id}",
    params(
        ("id" = i64, Path, description = "Newsletter ID"),
        ("job_id" = i64, Path, description = "Job posting ID")
    ),
    responses(
        (status = 204, description = "Job removed from newsletter"),
        (status = 400, description = "Invalid id")
    )
)]
#[axum::debug_handler]
pub async fn remove_job_from_newsletter(
    State(state): State<AppState>,
    Path((newsletter_id, job_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse> {
    let job_id = require_positive_id(job_id, "Invalid job id")?;
    let newsletter_id = require_positive_id(newsletter_id, "Invalid newsletter id")?;
    state
        .job_postings
        .remove_from_newsletter(job_id, newsletter_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
