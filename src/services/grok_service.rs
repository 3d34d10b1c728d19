use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::error::{Error, Result};
use crate::services::image_generator::{EncodedImage, ImageGenerator};

#[derive(Serialize)]
struct GrokImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    response_format: &'a str,
}

#[derive(Deserialize)]
struct GrokImageData {
    #[serde(default)]
    b64_json: Option<String>,
}

#[derive(Deserialize)]
struct GrokImageResponse {
    #[serde(default)]
    data: Vec<GrokImageData>,
}

/// xAI image generation (`/images/generations`).
#[derive(Clone)]
pub struct GrokService {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GrokService {
    pub fn new(api_key: Option<String>, base_url: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ImageGenerator for GrokService {
    #[instrument(skip(self, prompt))]
    async fn generate_image(&self, model: &str, prompt: &str) -> Result<EncodedImage> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("Missing GROK_API_KEY environment variable".to_string()))?;

        let res = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(api_key)
            .json(&GrokImageRequest {
                model,
                prompt,
                n: 1,
                response_format: "b64_json",
            })
            .send()
            .await
            .map_err(|err| Error::Upstream(format!("Grok request failed: {}", err.without_url())))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Grok image generation returned an error");
            let detail = if text.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                text
            };
            return Err(Error::Upstream(format!(
                "Grok image generation failed: {}",
                detail
            )));
        }

        let body: GrokImageResponse = res
            .json()
            .await
            .map_err(|_| Error::Upstream("Grok returned an unreadable response".to_string()))?;

        body.data
            .into_iter()
            .next()
            .and_then(|item| item.b64_json)
            .filter(|data| !data.is_empty())
            .map(|data| EncodedImage {
                data,
                mime_type: "image/png".to_string(),
            })
            .ok_or_else(|| Error::Upstream("No image returned from Grok".to_string()))
    }
}
