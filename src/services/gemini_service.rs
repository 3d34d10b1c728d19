use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{instrument, warn};

use crate::error::{Error, Result};
use crate::services::image_generator::{EncodedImage, ImageGenerator};

const ASPECT_RATIO: &str = "16:9";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    data: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentPart {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

/// Google Generative Language image generation. `imagen-*` models go
/// through `:predict`, everything else through `:generateContent`.
#[derive(Clone)]
pub struct GeminiService {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiService {
    pub fn new(api_key: Option<String>, base_url: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post(&self, api_key: &str, model: &str, method: &str, body: Value) -> Result<reqwest::Response> {
        let url = format!("{}/models/{}:{}", self.base_url, model, method);
        let res = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| Error::Upstream(format!("Gemini request failed: {}", err.without_url())))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), model, "Gemini image generation returned an error");
            let detail = if text.trim().is_empty() {
                status.as_u16().to_string()
            } else {
                text
            };
            return Err(Error::Upstream(format!(
                "Gemini image generation failed: {}",
                detail
            )));
        }
        Ok(res)
    }

    async fn predict(&self, api_key: &str, model: &str, prompt: &str) -> Result<Option<EncodedImage>> {
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": { "sampleCount": 1, "aspectRatio": ASPECT_RATIO }
        });
        let res = self.post(api_key, model, "predict", body).await?;
        let parsed: PredictResponse = res
            .json()
            .await
            .map_err(|_| Error::Upstream("Gemini returned an unreadable response".to_string()))?;

        Ok(parsed.predictions.into_iter().next().and_then(|p| {
            let data = p.bytes_base64_encoded.filter(|d| !d.is_empty())?;
            Some(EncodedImage {
                data,
                mime_type: p.mime_type.unwrap_or_else(|| "image/png".to_string()),
            })
        }))
    }

    async fn generate_content(&self, api_key: &str, model: &str, prompt: &str) -> Result<Option<EncodedImage>> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseModalities": ["IMAGE"],
                "imageConfig": { "aspectRatio": ASPECT_RATIO }
            }
        });
        let res = self.post(api_key, model, "generateContent", body).await?;
        let parsed: GenerateContentResponse = res
            .json()
            .await
            .map_err(|_| Error::Upstream("Gemini returned an unreadable response".to_string()))?;

        let parts = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .unwrap_or_default()
            .parts;

        Ok(parts.into_iter().find_map(|part| {
            let inline = part.inline_data?;
            let data = inline.data.filter(|d| !d.is_empty())?;
            Some(EncodedImage {
                data,
                mime_type: inline.mime_type.unwrap_or_else(|| "image/png".to_string()),
            })
        }))
    }
}

#[async_trait]
impl ImageGenerator for GeminiService {
    #[instrument(skip(self, prompt))]
    async fn generate_image(&self, model: &str, prompt: &str) -> Result<EncodedImage> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("Missing GEMINI_API_KEY environment variable".to_string()))?;

        let image = if model.starts_with("imagen") {
            self.predict(api_key, model, prompt).await?
        } else {
            self.generate_content(api_key, model, prompt).await?
        };

        image.ok_or_else(|| Error::Upstream("No image returned from Gemini".to_string()))
    }
}
