use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, instrument};

use crate::error::{Error, Result};

const UPLOAD_FAILED: &str = "Failed to upload generated image to storage. Please try again.";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `body` publicly under `pathname` and returns its public URL.
    async fn put(&self, pathname: &str, body: Bytes, content_type: &str) -> Result<String>;

    async fn delete(&self, url: &str) -> Result<()>;
}

#[derive(Deserialize)]
struct PutBlobResponse {
    url: String,
}

/// Vercel Blob over its HTTP API.
#[derive(Clone)]
pub struct VercelBlobStore {
    client: Client,
    token: String,
    api_url: String,
}

impl VercelBlobStore {
    pub fn new(token: String, api_url: String, client: Client) -> Self {
        Self {
            client,
            token,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for VercelBlobStore {
    #[instrument(skip(self, body), fields(bytes = body.len()))]
    async fn put(&self, pathname: &str, body: Bytes, content_type: &str) -> Result<String> {
        let res = self
            .client
            .put(format!("{}/{}", self.api_url, pathname))
            .bearer_auth(&self.token)
            .header("x-api-version", "7")
            .header("x-content-type", content_type)
            .header("x-add-random-suffix", "0")
            .body(body)
            .send()
            .await
            .map_err(|err| {
                error!(error = %err.without_url(), "Blob upload could not be sent");
                Error::Storage(UPLOAD_FAILED.to_string())
            })?;

        if !res.status().is_success() {
            error!(status = res.status().as_u16(), "Blob upload rejected");
            return Err(Error::Storage(UPLOAD_FAILED.to_string()));
        }

        let blob: PutBlobResponse = res.json().await.map_err(|err| {
            error!(error = %err.without_url(), "Blob upload response unreadable");
            Error::Storage(UPLOAD_FAILED.to_string())
        })?;

        info!(url = %blob.url, "Blob uploaded");
        Ok(blob.url)
    }

    #[instrument(skip(self))]
    async fn delete(&self, url: &str) -> Result<()> {
        let res = self
            .client
            .post(format!("{}/delete", self.api_url))
            .bearer_auth(&self.token)
            .header("x-api-version", "7")
            .json(&json!({ "urls": [url] }))
            .send()
            .await
            .map_err(|err| Error::Storage(format!("Failed to delete blob: {}", err.without_url())))?;

        if !res.status().is_success() {
            return Err(Error::Storage(format!(
                "Failed to delete blob ({})",
                res.status().as_u16()
            )));
        }
        Ok(())
    }
}

/// Files under a local directory, served by the app under `/uploads`.
#[derive(Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url_prefix(&self) -> String {
        format!("{}/uploads/", self.public_base_url)
    }

    fn resolve(&self, pathname: &str) -> Result<PathBuf> {
        let relative = Path::new(pathname);
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !safe || pathname.is_empty() {
            return Err(Error::BadRequest(format!("Invalid blob path: {}", pathname)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    #[instrument(skip(self, body), fields(bytes = body.len()))]
    async fn put(&self, pathname: &str, body: Bytes, _content_type: &str) -> Result<String> {
        let path = self.resolve(pathname)?;
        let write = async {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, &body).await
        };
        write.await.map_err(|err| {
            error!(error = ?err, path = %path.display(), "Local blob write failed");
            Error::Storage(UPLOAD_FAILED.to_string())
        })?;

        Ok(format!("{}{}", self.url_prefix(), pathname))
    }

    #[instrument(skip(self))]
    async fn delete(&self, url: &str) -> Result<()> {
        let pathname = url
            .strip_prefix(&self.url_prefix())
            .ok_or_else(|| Error::BadRequest(format!("Not a local upload: {}", url)))?;
        let path = self.resolve(pathname)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                error!(error = ?err, path = %path.display(), "Local blob delete failed");
                Err(Error::Storage(format!("Failed to delete blob: {}", pathname)))
            }
        }
    }
}
