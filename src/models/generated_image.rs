use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct GeneratedImage {
    pub id: i64,
    pub newsletter_id: i64,
    pub blob_url: Option<String>,
    pub prompt: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewGeneratedImage {
    pub newsletter_id: i64,
    pub blob_url: String,
    pub prompt: String,
    pub provider: String,
    pub model: String,
}
