use async_trait::async_trait;
use reqwest::Client;
use tracing::{instrument, warn};

use crate::dto::job_dto::DatePosted;
use crate::dto::serpapi_dto::SerpJobsResponse;
use crate::error::{Error, Result};

/// One page request against the job search engine.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSearchRequest {
    pub query: String,
    pub location: Option<String>,
    pub date_posted: Option<DatePosted>,
    pub next_page_token: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobSearchApi: Send + Sync {
    async fn search_jobs(&self, request: &JobSearchRequest) -> Result<SerpJobsResponse>;
}

#[derive(Clone)]
pub struct SerpApiService {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl SerpApiService {
    pub fn new(api_key: Option<String>, base_url: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl JobSearchApi for SerpApiService {
    #[instrument(skip(self, request), fields(has_token = request.next_page_token.is_some()))]
    async fn search_jobs(&self, request: &JobSearchRequest) -> Result<SerpJobsResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("Missing SERPAPI_API_KEY in environment".to_string()))?;

        let mut params: Vec<(&str, String)> = vec![
            ("engine", "google_jobs".to_string()),
            ("q", request.query.clone()),
            ("api_key", api_key.to_string()),
        ];
        if let Some(location) = &request.location {
            params.push(("location", location.clone()));
        }
        if let Some(date_posted) = request.date_posted {
            params.push(("chips", date_posted.chip()));
        }
        if let Some(token) = &request.next_page_token {
            params.push(("next_page_token", token.clone()));
        }

        let url = format!("{}/search.json", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err.without_url(), "SerpAPI request could not be sent");
                Error::Upstream("Failed to fetch from SerpAPI".to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "SerpAPI returned an error status");
            return Err(Error::Upstream(format!(
                "SerpAPI request failed ({})",
                status.as_u16()
            )));
        }

        response.json::<SerpJobsResponse>().await.map_err(|err| {
            warn!(error = %err.without_url(), "SerpAPI response could not be decoded");
            Error::Upstream("Failed to fetch from SerpAPI".to_string())
        })
    }
}
