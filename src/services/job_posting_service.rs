use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{error, info, instrument};

use crate::error::{Error, Result};
use crate::models::job_posting::{JobPosting, NewJobPosting};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobPostingStore: Send + Sync {
    /// Inserts rows keyed on `job_id`, leaving existing rows untouched.
    /// Returns how many rows were actually inserted.
    async fn upsert_ignore(&self, rows: &[NewJobPosting]) -> Result<u64>;

    async fn get_by_id(&self, id: i64) -> Result<JobPosting>;

    async fn assign_to_newsletter(&self, id: i64, newsletter_id: i64) -> Result<()>;

    async fn remove_from_newsletter(&self, id: i64, newsletter_id: i64) -> Result<()>;
}

#[derive(Clone)]
pub struct JobPostingService {
    pool: PgPool,
}

impl JobPostingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobPostingStore for JobPostingService {
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn upsert_ignore(&self, rows: &[NewJobPosting]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO job_postings (job_id, newsletter_id, title, company, location, apply_link, remote, company_logo, description, posted_date) ",
        );
        builder.push_values(rows, |mut row_builder, row| {
            row_builder
                .push_bind(row.job_id.clone())
                .push_bind(None::<i64>)
                .push_bind(row.title.clone())
                .push_bind(row.company.clone())
                .push_bind(row.location.clone())
                .push_bind(row.apply_link.clone())
                .push_bind(row.remote)
                .push_bind(row.company_logo.clone())
                .push_bind(row.description.clone())
                .push_bind(row.posted_date);
        });
        builder.push(" ON CONFLICT (job_id) DO NOTHING RETURNING id");

        let inserted: Vec<i64> = builder
            .build_query_scalar::<i64>()
            .fetch_all(&self.pool)
            .await
            .map_err(|err| {
                error!(error = ?err, "Job posting upsert failed");
                Error::Internal("Failed to save job postings".to_string())
            })?;

        info!(inserted = inserted.len(), "Job postings upserted");
        Ok(inserted.len() as u64)
    }

    async fn get_by_id(&self, id: i64) -> Result<JobPosting> {
        let posting = sqlx::query_as::<_, JobPosting>(
            r#"
            SELECT id, created_at, job_id, newsletter_id, title, company, location,
                   apply_link, remote, company_logo, description, posted_date
            FROM job_postings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(posting)
    }

    async fn assign_to_newsletter(&self, id: i64, newsletter_id: i64) -> Result<()> {
        let result = sqlx::query("UPDATE job_postings SET newsletter_id = $1 WHERE id = $2")
            .bind(newsletter_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| {
                error!(error = ?err, id, newsletter_id, "Failed to assign job posting");
                Error::Internal("Failed to add job to newsletter".to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Job posting not found".to_string()));
        }
        Ok(())
    }

    async fn remove_from_newsletter(&self, id: i64, newsletter_id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE job_postings SET newsletter_id = NULL WHERE id = $1 AND newsletter_id = $2",
        )
        .bind(id)
        .bind(newsletter_id)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            error!(error = ?err, id, newsletter_id, "Failed to remove job posting");
            Error::Internal("Failed to remove job from newsletter".to_string())
        })?;

        Ok(())
    }
}
