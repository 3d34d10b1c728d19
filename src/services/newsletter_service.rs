use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info, instrument};

use crate::error::{Error, Result};
use crate::models::generated_image::{GeneratedImage, NewGeneratedImage};

pub const STORE_IMAGE_FAILED: &str = "Failed to store generated newsletter image";
pub const UPDATE_COVER_FAILED: &str = "Failed to update newsletter cover image";

fn store_image_failed(err: sqlx::Error) -> Error {
    error!(error = ?err, "Failed to record generated image");
    Error::Internal(STORE_IMAGE_FAILED.to_string())
}

fn update_cover_failed(err: sqlx::Error) -> Error {
    error!(error = ?err, "Failed to update cover image pointer");
    Error::Internal(UPDATE_COVER_FAILED.to_string())
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CoverImageStore: Send + Sync {
    async fn newsletter_exists(&self, newsletter_id: i64) -> Result<bool>;

    /// Inserts the image row and points the newsletter's cover at it, both or
    /// neither.
    async fn record_image_and_set_cover(&self, image: &NewGeneratedImage) -> Result<GeneratedImage>;

    async fn find_image(&self, newsletter_id: i64, blob_url: &str) -> Result<Option<GeneratedImage>>;

    async fn set_cover(&self, newsletter_id: i64, blob_url: &str) -> Result<()>;

    /// Newest first.
    async fn list_images(&self, newsletter_id: i64) -> Result<Vec<GeneratedImage>>;
}

#[derive(Clone)]
pub struct NewsletterService {
    pool: PgPool,
}

impl NewsletterService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CoverImageStore for NewsletterService {
    async fn newsletter_exists(&self, newsletter_id: i64) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM newsletters WHERE id = $1)")
                .bind(newsletter_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    #[instrument(skip(self, image), fields(newsletter_id = image.newsletter_id, model = %image.model))]
    async fn record_image_and_set_cover(&self, image: &NewGeneratedImage) -> Result<GeneratedImage> {
        let mut tx = self.pool.begin().await.map_err(store_image_failed)?;

        let saved = sqlx::query_as::<_, GeneratedImage>(
            r#"
            INSERT INTO newsletter_images (newsletter_id, blob_url, prompt, provider, model)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, newsletter_id, blob_url, prompt, provider, model, created_at
            "#,
        )
        .bind(image.newsletter_id)
        .bind(&image.blob_url)
        .bind(&image.prompt)
        .bind(&image.provider)
        .bind(&image.model)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_image_failed)?;

        let updated = sqlx::query("UPDATE newsletters SET cover_image = $1 WHERE id = $2")
            .bind(&image.blob_url)
            .bind(image.newsletter_id)
            .execute(&mut *tx)
            .await
            .map_err(update_cover_failed)?;

        if updated.rows_affected() == 0 {
            tx.rollback().await.map_err(update_cover_failed)?;
            return Err(Error::NotFound("Newsletter not found".to_string()));
        }

        tx.commit().await.map_err(store_image_failed)?;
        info!(image_id = saved.id, "Cover image recorded");
        Ok(saved)
    }

    async fn find_image(&self, newsletter_id: i64, blob_url: &str) -> Result<Option<GeneratedImage>> {
        let image = sqlx::query_as::<_, GeneratedImage>(
            r#"
            SELECT id, newsletter_id, blob_url, prompt, provider, model, created_at
            FROM newsletter_images
            WHERE newsletter_id = $1 AND blob_url = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(newsletter_id)
        .bind(blob_url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(image)
    }

    async fn set_cover(&self, newsletter_id: i64, blob_url: &str) -> Result<()> {
        let result = sqlx::query("UPDATE newsletters SET cover_image = $1 WHERE id = $2")
            .bind(blob_url)
            .bind(newsletter_id)
            .execute(&self.pool)
            .await
            .map_err(update_cover_failed)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Newsletter not found".to_string()));
        }
        Ok(())
    }

    async fn list_images(&self, newsletter_id: i64) -> Result<Vec<GeneratedImage>> {
        let images = sqlx::query_as::<_, GeneratedImage>(
            r#"
            SELECT id, newsletter_id, blob_url, prompt, provider, model, created_at
            FROM newsletter_images
            WHERE newsletter_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(newsletter_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }
}
