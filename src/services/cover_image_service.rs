use std::sync::Arc;

use bytes::Bytes;
use tracing::{error, info, instrument, warn};

use crate::dto::cover_image_dto::{CoverImageResponse, ImageModelCatalogResponse};
use crate::error::{Error, Result};
use crate::models::generated_image::{GeneratedImage, NewGeneratedImage};
use crate::models::image_model::ImageModel;
use crate::services::blob_store::BlobStore;
use crate::services::image_generator::ImageGenerators;
use crate::services::newsletter_service::CoverImageStore;
use crate::utils::image_payload::{
    decode_image_payload, estimate_decoded_bytes, extension_for_mime, format_bytes,
};
use crate::utils::time;
use crate::utils::validation::{require_positive_id, require_text};

#[derive(Debug, Clone, Copy)]
pub struct CoverImageSettings {
    pub default_model: ImageModel,
    pub max_image_bytes: usize,
}

#[derive(Clone)]
pub struct CoverImageService {
    generators: ImageGenerators,
    blobs: Arc<dyn BlobStore>,
    store: Arc<dyn CoverImageStore>,
    settings: CoverImageSettings,
}

fn check_size(bytes: usize, max_bytes: usize) -> Result<()> {
    if bytes > max_bytes {
        return Err(Error::PayloadTooLarge(format!(
            "Generated image is too large ({}). Max allowed is {}.",
            format_bytes(bytes),
            format_bytes(max_bytes)
        )));
    }
    Ok(())
}

fn generation_failed(err: Error) -> Error {
    match err {
        Error::Config(msg) => Error::Config(format!("Image generation failed: {}", msg)),
        other => Error::Upstream(format!("Image generation failed: {}", other.user_message())),
    }
}

impl CoverImageService {
    pub fn new(
        generators: ImageGenerators,
        blobs: Arc<dyn BlobStore>,
        store: Arc<dyn CoverImageStore>,
        settings: CoverImageSettings,
    ) -> Self {
        Self {
            generators,
            blobs,
            store,
            settings,
        }
    }

    pub fn catalog(&self) -> ImageModelCatalogResponse {
        ImageModelCatalogResponse::with_default(self.settings.default_model)
    }

    pub fn resolve_model(&self, key: Option<&str>) -> Result<ImageModel> {
        match key.map(str::trim).filter(|k| !k.is_empty()) {
            None => Ok(self.settings.default_model),
            Some(key) => ImageModel::from_key(key)
                .ok_or_else(|| Error::BadRequest("Invalid image model selected".to_string())),
        }
    }

    /// Generates an image, stores it and makes it the newsletter's cover.
    #[instrument(skip(self, prompt))]
    pub async fn generate(
        &self,
        newsletter_id: i64,
        prompt: &str,
        model_key: Option<&str>,
    ) -> Result<CoverImageResponse> {
        let newsletter_id = require_positive_id(newsletter_id, "Valid newsletter id is required")?;
        let prompt = require_text(prompt, "Image prompt is required")?;
        let model = self.resolve_model(model_key)?;

        if !self.store.newsletter_exists(newsletter_id).await? {
            return Err(Error::NotFound("Newsletter not found".to_string()));
        }

        let provider = model.provider();
        let encoded = self
            .generators
            .for_provider(provider)
            .generate_image(model.model_id(), &prompt)
            .await
            .map_err(generation_failed)?;

        check_size(estimate_decoded_bytes(&encoded.data), self.settings.max_image_bytes)?;

        let decoded = decode_image_payload(&encoded.data).map_err(|err| {
            warn!(error = %err, "Generated image payload could not be decoded");
            Error::InvalidPayload("Generated image payload was invalid. Please try again.".to_string())
        })?;
        // The estimate equals the decoded length for anything the lenient engine
        // accepts, so this only trips if that engine ever grows more permissive.
        check_size(decoded.len(), self.settings.max_image_bytes)?;

        let pathname = format!(
            "newsletters/{}/cover-{}.{}",
            newsletter_id,
            time::now().timestamp_millis(),
            extension_for_mime(&encoded.mime_type)
        );
        let blob_url = self
            .blobs
            .put(&pathname, Bytes::from(decoded), &encoded.mime_type)
            .await?;

        let record = NewGeneratedImage {
            newsletter_id,
            blob_url: blob_url.clone(),
            prompt,
            provider: provider.as_str().to_string(),
            model: model.model_id().to_string(),
        };

        match self.store.record_image_and_set_cover(&record).await {
            Ok(image) => {
                info!(newsletter_id, model = model.key(), url = %blob_url, "Cover image generated");
                Ok(image.into())
            }
            Err(err) => {
                error!(error = ?err, newsletter_id, "Persisting generated image failed, removing blob");
                if let Err(cleanup) = self.blobs.delete(&blob_url).await {
                    warn!(error = ?cleanup, url = %blob_url, "Orphaned blob could not be deleted");
                }
                Err(err)
            }
        }
    }

    /// Points the cover at an image previously generated for this newsletter.
    #[instrument(skip(self))]
    pub async fn select_existing(&self, newsletter_id: i64, cover_url: &str) -> Result<CoverImageResponse> {
        let newsletter_id = require_positive_id(newsletter_id, "Valid newsletter id is required")?;
        let cover_url = require_text(cover_url, "Cover image URL is required")?;

        let image = self
            .store
            .find_image(newsletter_id, &cover_url)
            .await?
            .ok_or_else(|| {
                Error::BadRequest("Selected image is not associated with this newsletter".to_string())
            })?;

        self.store.set_cover(newsletter_id, &cover_url).await?;
        info!(newsletter_id, image_id = image.id, "Cover image selected");
        Ok(image.into())
    }

    pub async fn list_images(&self, newsletter_id: i64) -> Result<Vec<GeneratedImage>> {
        let newsletter_id = require_positive_id(newsletter_id, "Valid newsletter id is required")?;
        self.store.list_images(newsletter_id).await
    }
}
