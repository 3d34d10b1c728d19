use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct JobPosting {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub job_id: Option<String>,
    pub newsletter_id: Option<i64>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub apply_link: Option<String>,
    pub remote: Option<bool>,
    pub company_logo: Option<String>,
    pub description: Option<String>,
    pub posted_date: Option<DateTime<Utc>>,
}

/// Normalized row ready for the upsert. `job_id` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewJobPosting {
    pub job_id: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub apply_link: Option<String>,
    pub remote: bool,
    pub company_logo: Option<String>,
    pub description: Option<String>,
    pub posted_date: Option<DateTime<Utc>>,
}
