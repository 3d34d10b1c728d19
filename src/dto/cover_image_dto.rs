use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::generated_image::GeneratedImage;
use crate::models::image_model::ImageModel;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct GenerateCoverImagePayload {
    #[serde(alias = "image_prompt")]
    #[validate(length(max = 4000))]
    pub prompt: String,
    /// Catalog key; the configured default is used when absent.
    pub image_model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SelectCoverImagePayload {
    #[validate(length(max = 2048))]
    pub cover_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CoverImageResponse {
    pub newsletter_id: i64,
    pub cover_image: Option<String>,
    pub image: GeneratedImage,
}

impl From<GeneratedImage> for CoverImageResponse {
    fn from(image: GeneratedImage) -> Self {
        Self {
            newsletter_id: image.newsletter_id,
            cover_image: image.blob_url.clone(),
            image,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImageModelOption {
    pub key: String,
    pub label: String,
    pub provider: String,
    pub model: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImageModelCatalogResponse {
    pub default_key: String,
    pub models: Vec<ImageModelOption>,
}

impl ImageModelCatalogResponse {
    pub fn with_default(default_model: ImageModel) -> Self {
        let models = ImageModel::ALL
            .into_iter()
            .map(|model| ImageModelOption {
                key: model.key().to_string(),
                label: model.label().to_string(),
                provider: model.provider().as_str().to_string(),
                model: model.model_id().to_string(),
                is_default: model == default_model,
            })
            .collect();
        Self {
            default_key: default_model.key().to_string(),
            models,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeneratedImageListResponse {
    pub items: Vec<GeneratedImage>,
}
