use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

pub const RESULT_COUNT_OPTIONS: [u32; 5] = [10, 20, 30, 40, 50];
pub const DEFAULT_RESULT_COUNT: u32 = 10;
pub const MAX_RESULT_COUNT: u32 = 50;
pub const RESULTS_PER_PAGE: u32 = 10;

/// `date_posted` filter chip understood by the Google Jobs engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePosted {
    Today,
    ThreeDays,
    Week,
    Month,
}

impl DatePosted {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "today" => Some(DatePosted::Today),
            "3days" => Some(DatePosted::ThreeDays),
            "week" => Some(DatePosted::Week),
            "month" => Some(DatePosted::Month),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatePosted::Today => "today",
            DatePosted::ThreeDays => "3days",
            DatePosted::Week => "week",
            DatePosted::Month => "month",
        }
    }

    pub fn chip(&self) -> String {
        format!("date_posted:{}", self.as_str())
    }
}

/// Counts outside `1..=50` (or missing) fall back to the default of 10.
pub fn normalize_result_count(raw: Option<u32>) -> u32 {
    match raw {
        Some(count) if (1..=MAX_RESULT_COUNT).contains(&count) => count,
        _ => DEFAULT_RESULT_COUNT,
    }
}

/// Input of a single import run.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportJobsRequest {
    pub query: String,
    pub location: Option<String>,
    pub result_count: u32,
    pub date_posted: Option<DatePosted>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ImportJobsPayload {
    #[serde(alias = "query")]
    #[validate(length(max = 512))]
    pub q: String,
    #[validate(length(max = 256))]
    pub location: Option<String>,
    pub result_count: Option<u32>,
    /// One of `today`, `3days`, `week`, `month`.
    pub date_posted: Option<String>,
}

impl From<ImportJobsPayload> for ImportJobsRequest {
    fn from(value: ImportJobsPayload) -> Self {
        Self {
            query: value.q,
            location: value.location,
            result_count: normalize_result_count(value.result_count),
            date_posted: value.date_posted.as_deref().and_then(DatePosted::parse),
        }
    }
}

/// Fields of the dashboard's import form. Everything arrives as text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImportJobsForm {
    pub q: Option<String>,
    pub location: Option<String>,
    pub result_count: Option<String>,
    pub date_posted: Option<String>,
}

impl ImportJobsForm {
    /// `default_date_posted` applies when the chip is missing or unknown.
    pub fn into_request(self, default_date_posted: Option<DatePosted>) -> ImportJobsRequest {
        let result_count = self
            .result_count
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok());
        ImportJobsRequest {
            query: self.q.unwrap_or_default(),
            location: self.location,
            result_count: normalize_result_count(result_count),
            date_posted: self
                .date_posted
                .as_deref()
                .and_then(DatePosted::parse)
                .or(default_date_posted),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportJobsResponse {
    pub imported: u64,
    pub fetched: usize,
    pub pages_requested: u32,
}
