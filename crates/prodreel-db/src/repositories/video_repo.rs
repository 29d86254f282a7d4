//! Repository for the `videos` table.
//!
//! Every pipeline status transition is a single committed statement, so a
//! crash mid-workflow always leaves the row at the last completed step.

use sqlx::PgPool;

use prodreel_models::VideoStatus;

use crate::models::{NewVideoAsset, VideoAsset};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, shop, product_id, product_title, remote_file_id, \
    image1, image2, image3, image4, prompt, video_url, thumbnail, status, \
    duration, created_at";

/// Default generation duration in seconds, recorded before the task reports
/// the real value.
const DEFAULT_DURATION: f64 = 5.0;

/// Provides CRUD and status-transition operations for video assets.
pub struct VideoRepo;

impl VideoRepo {
    /// Insert a freshly accepted generation task as a `processing` row.
    pub async fn create(pool: &PgPool, input: &NewVideoAsset) -> Result<VideoAsset, sqlx::Error> {
        let query = format!(
            "INSERT INTO videos
                (id, shop, product_id, product_title, image1, image2, image3, image4,
                 prompt, status, duration)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        let image = |n: usize| input.images.get(n).cloned();
        sqlx::query_as::<_, VideoAsset>(&query)
            .bind(&input.id)
            .bind(&input.shop)
            .bind(&input.product_id)
            .bind(&input.product_title)
            .bind(image(0).unwrap_or_default())
            .bind(image(1))
            .bind(image(2))
            .bind(image(3))
            .bind(&input.prompt)
            .bind(VideoStatus::Processing.as_str())
            .bind(DEFAULT_DURATION)
            .fetch_one(pool)
            .await
    }

    /// Find an asset by its generation task id.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<VideoAsset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1");
        sqlx::query_as::<_, VideoAsset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all assets for a shop, newest first.
    pub async fn list_by_shop(pool: &PgPool, shop: &str) -> Result<Vec<VideoAsset>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM videos WHERE shop = $1 ORDER BY created_at DESC");
        sqlx::query_as::<_, VideoAsset>(&query)
            .bind(shop)
            .fetch_all(pool)
            .await
    }

    /// Delete an asset row. Returns whether a row was removed.
    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a successful generation: url, duration, optional thumbnail, and
    /// the `completed` status.
    ///
    /// Guarded on `status = 'processing'` so re-applying the refresh to an
    /// already-completed row is a no-op and cannot corrupt its fields.
    pub async fn mark_generation_result(
        pool: &PgPool,
        id: &str,
        video_url: &str,
        duration: f64,
        thumbnail: Option<&str>,
    ) -> Result<Option<VideoAsset>, sqlx::Error> {
        let query = format!(
            "UPDATE videos
                SET video_url = $2, duration = $3, thumbnail = $4, status = $5
              WHERE id = $1 AND status = $6
              RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VideoAsset>(&query)
            .bind(id)
            .bind(video_url)
            .bind(duration)
            .bind(thumbnail)
            .bind(VideoStatus::Completed.as_str())
            .bind(VideoStatus::Processing.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Record a failed generation task.
    pub async fn mark_generation_failed(pool: &PgPool, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE videos SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(VideoStatus::Failed.as_str())
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Check-and-set entry into the ingestion pipeline.
    ///
    /// Only a row that is not already `uploading` may enter, so two concurrent
    /// runs over the same record fail fast instead of interleaving writes.
    pub async fn try_begin_upload(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE videos SET status = $2 WHERE id = $1 AND status <> $2")
            .bind(id)
            .bind(VideoStatus::Uploading.as_str())
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Terminal success transition: `uploaded` plus the remote file id.
    pub async fn finish_upload(
        pool: &PgPool,
        id: &str,
        remote_file_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE videos SET status = $2, remote_file_id = $3 WHERE id = $1")
            .bind(id)
            .bind(VideoStatus::Uploaded.as_str())
            .bind(remote_file_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Failure rollback: the record returns to `completed` (the video itself
    /// is still ready for the product page).
    pub async fn abort_upload(pool: &PgPool, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE videos SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(VideoStatus::Completed.as_str())
            .execute(pool)
            .await?;
        Ok(())
    }
}
