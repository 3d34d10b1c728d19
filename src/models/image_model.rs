use serde::{Deserialize, Serialize};

/// Upstream service an image model is served by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageProvider {
    Gemini,
    Grok,
}

impl ImageProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageProvider::Gemini => "gemini",
            ImageProvider::Grok => "grok",
        }
    }
}

/// Fixed catalog of cover image models. Each entry is bound to exactly one
/// provider and one upstream model identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageModel {
    GrokImagineImage,
    GrokImagineImagePro,
    Grok2Image1212,
    GeminiFlashImage,
    Imagen4,
}

impl ImageModel {
    pub const ALL: [ImageModel; 5] = [
        ImageModel::GrokImagineImage,
        ImageModel::GrokImagineImagePro,
        ImageModel::Grok2Image1212,
        ImageModel::GeminiFlashImage,
        ImageModel::Imagen4,
    ];

    pub const DEFAULT: ImageModel = ImageModel::GeminiFlashImage;

    pub fn key(&self) -> &'static str {
        match self {
            ImageModel::GrokImagineImage => "grok-imagine-image",
            ImageModel::GrokImagineImagePro => "grok-imagine-image-pro",
            ImageModel::Grok2Image1212 => "grok-2-image-1212",
            ImageModel::GeminiFlashImage => "gemini-flash-image",
            ImageModel::Imagen4 => "imagen-4",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImageModel::GrokImagineImage => "Grok Imagine Image",
            ImageModel::GrokImagineImagePro => "Grok Imagine Image Pro",
            ImageModel::Grok2Image1212 => "Grok 2 Image 1212",
            ImageModel::GeminiFlashImage => "Gemini 2.5 Flash Image",
            ImageModel::Imagen4 => "Imagen 4",
        }
    }

    pub fn provider(&self) -> ImageProvider {
        match self {
            ImageModel::GrokImagineImage
            | ImageModel::GrokImagineImagePro
            | ImageModel::Grok2Image1212 => ImageProvider::Grok,
            ImageModel::GeminiFlashImage | ImageModel::Imagen4 => ImageProvider::Gemini,
        }
    }

    pub fn model_id(&self) -> &'static str {
        match self {
            ImageModel::GrokImagineImage => "grok-imagine-image",
            ImageModel::GrokImagineImagePro => "grok-imagine-image-pro",
            ImageModel::Grok2Image1212 => "grok-2-image-1212",
            ImageModel::GeminiFlashImage => "gemini-2.5-flash-image",
            ImageModel::Imagen4 => "imagen-4.0-generate-001",
        }
    }

    pub fn from_key(key: &str) -> Option<ImageModel> {
        Self::ALL.into_iter().find(|model| model.key() == key)
    }

    /// Resolves the configured default, ignoring keys outside the catalog.
    pub fn default_from(configured: Option<&str>) -> ImageModel {
        configured
            .map(str::trim)
            .and_then(Self::from_key)
            .unwrap_or(Self::DEFAULT)
    }
}
