use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::dto::job_dto::{ImportJobsRequest, RESULTS_PER_PAGE};
use crate::dto::serpapi_dto::SerpJobResult;
use crate::error::Result;
use crate::models::job_posting::NewJobPosting;
use crate::services::job_posting_service::JobPostingStore;
use crate::services::serpapi_service::{JobSearchApi, JobSearchRequest};
use crate::utils::job_fields::normalize_job;
use crate::utils::time;
use crate::utils::validation::{optional_text, require_text};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: u64,
    pub fetched: usize,
    pub pages_requested: u32,
}

pub fn pages_needed(result_count: u32) -> u32 {
    result_count.div_ceil(RESULTS_PER_PAGE)
}

#[derive(Clone)]
pub struct JobImportService {
    search: Arc<dyn JobSearchApi>,
    store: Arc<dyn JobPostingStore>,
}

impl JobImportService {
    pub fn new(search: Arc<dyn JobSearchApi>, store: Arc<dyn JobPostingStore>) -> Self {
        Self { search, store }
    }

    /// Pages through the search API, normalizes what came back and stores
    /// every posting whose `job_id` is not known yet.
    #[instrument(skip(self, request), fields(query = %request.query, result_count = request.result_count))]
    pub async fn import(&self, request: ImportJobsRequest) -> Result<ImportSummary> {
        let query = require_text(&request.query, "Search query is required")?;
        let location = optional_text(request.location.as_deref());
        let result_count = request.result_count as usize;
        let pages = pages_needed(request.result_count);

        let mut jobs: Vec<SerpJobResult> = Vec::new();
        let mut next_page_token: Option<String> = None;
        let mut pages_requested = 0;

        for _ in 0..pages {
            let page = self
                .search
                .search_jobs(&JobSearchRequest {
                    query: query.clone(),
                    location: location.clone(),
                    date_posted: request.date_posted,
                    next_page_token: next_page_token.take(),
                })
                .await?;
            pages_requested += 1;

            next_page_token = page.next_page_token().map(str::to_string);
            jobs.extend(page.jobs_results);

            if next_page_token.is_none() {
                break;
            }
        }

        jobs.truncate(result_count);
        let fetched = jobs.len();

        let rows = normalize_rows(&jobs, time::now());
        if rows.is_empty() {
            info!(fetched, pages_requested, "No importable job postings returned");
            return Ok(ImportSummary {
                imported: 0,
                fetched,
                pages_requested,
            });
        }

        let imported = self.store.upsert_ignore(&rows).await?;
        info!(imported, fetched, pages_requested, "Job import finished");

        Ok(ImportSummary {
            imported,
            fetched,
            pages_requested,
        })
    }
}

/// Drops results without an identifier and keeps the first occurrence of
/// each identifier.
fn normalize_rows(jobs: &[SerpJobResult], now: chrono::DateTime<chrono::Utc>) -> Vec<NewJobPosting> {
    let mut seen = HashSet::new();
    jobs.iter()
        .filter_map(|job| normalize_job(job, now))
        .filter(|row| seen.insert(row.job_id.clone()))
        .collect()
}
