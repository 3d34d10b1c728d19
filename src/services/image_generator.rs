use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::image_model::ImageProvider;

/// Base64 image data as returned by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub data: String,
    pub mime_type: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, model: &str, prompt: &str) -> Result<EncodedImage>;
}

/// Provider clients, one per [`ImageProvider`].
#[derive(Clone)]
pub struct ImageGenerators {
    gemini: Arc<dyn ImageGenerator>,
    grok: Arc<dyn ImageGenerator>,
}

impl ImageGenerators {
    pub fn new(gemini: Arc<dyn ImageGenerator>, grok: Arc<dyn ImageGenerator>) -> Self {
        Self { gemini, grok }
    }

    pub fn for_provider(&self, provider: ImageProvider) -> &dyn ImageGenerator {
        match provider {
            ImageProvider::Gemini => self.gemini.as_ref(),
            ImageProvider::Grok => self.grok.as_ref(),
        }
    }
}
