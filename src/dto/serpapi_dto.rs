use serde::{Deserialize, Deserializer, Serialize};

/// SerpAPI sends `job_id` as a string, but numbers have been observed too.
fn deserialize_job_id_flexible<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(|value| match value {
        StringOrNumber::String(s) => s,
        StringOrNumber::Int(i) => i.to_string(),
        StringOrNumber::Float(f) => f.to_string(),
    }))
}

/// Lists come back as `null` on some results; treat that like a missing key.
fn deserialize_null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SerpLink {
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SerpDetectedExtensions {
    #[serde(default)]
    pub posted_at: Option<String>,
    #[serde(default)]
    pub schedule_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SerpJobResult {
    #[serde(default, deserialize_with = "deserialize_job_id_flexible")]
    pub job_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub apply_options: Vec<SerpLink>,
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub related_links: Vec<SerpLink>,
    #[serde(default)]
    pub detected_extensions: Option<SerpDetectedExtensions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SerpPagination {
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SerpJobsResponse {
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub jobs_results: Vec<SerpJobResult>,
    #[serde(default)]
    pub serpapi_pagination: Option<SerpPagination>,
}

impl SerpJobsResponse {
    /// Continuation token for the next page; blank tokens end pagination.
    pub fn next_page_token(&self) -> Option<&str> {
        self.serpapi_pagination
            .as_ref()
            .and_then(|p| p.next_page_token.as_deref())
            .filter(|token| !token.is_empty())
    }
}
