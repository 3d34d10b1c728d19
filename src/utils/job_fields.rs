use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::dto::serpapi_dto::{SerpJobResult, SerpLink};
use crate::models::job_posting::NewJobPosting;
use crate::utils::time::parse_posted_date;

static REMOTE_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bremote\b|work from home|wfh").expect("remote pattern is valid"));

static TRAILING_PARENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^)]*\)\s*$").expect("location pattern is valid"));

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

pub fn normalize_job_id(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

pub fn infer_remote(job: &SerpJobResult) -> bool {
    let schedule_type = job
        .detected_extensions
        .as_ref()
        .and_then(|ext| ext.schedule_type.as_deref());

    let haystack = [
        job.title.as_deref(),
        job.location.as_deref(),
        job.description.as_deref(),
        schedule_type,
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase();

    REMOTE_HINT.is_match(&haystack)
}

fn first_link(links: &[SerpLink]) -> Option<String> {
    links
        .iter()
        .find_map(|item| item.link.as_deref().filter(|link| !link.is_empty()))
        .map(str::to_string)
}

pub fn extract_apply_link(job: &SerpJobResult) -> Option<String> {
    first_link(&job.apply_options).or_else(|| first_link(&job.related_links))
}

/// Drops a trailing parenthetical such as `(+2 others)`.
pub fn normalize_location(value: Option<&str>) -> Option<String> {
    let value = value?;
    let stripped = TRAILING_PARENS.replace(value, "");
    let trimmed = stripped.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Maps one search result to a storage row. Results without a usable
/// identifier yield `None`.
pub fn normalize_job(job: &SerpJobResult, now: DateTime<Utc>) -> Option<NewJobPosting> {
    let job_id = normalize_job_id(job.job_id.as_deref())?;
    let posted_at = job
        .detected_extensions
        .as_ref()
        .and_then(|ext| ext.posted_at.as_deref());

    Some(NewJobPosting {
        job_id,
        title: non_empty(job.title.as_deref()),
        company: non_empty(job.company_name.as_deref()),
        location: normalize_location(job.location.as_deref()),
        apply_link: extract_apply_link(job),
        remote: infer_remote(job),
        company_logo: non_empty(job.thumbnail.as_deref()),
        description: non_empty(job.description.as_deref()),
        posted_date: parse_posted_date(posted_at, now),
    })
}
