//! Video record removal with best-effort remote cleanup.

use tracing::{info, warn};

use prodreel_db::VideoAsset;
use prodreel_shopify::AdminClient;

use crate::error::{ApiError, ApiResult};
use crate::services::ingest::PgVideoStore;

/// Persistence seam for record removal.
#[allow(async_fn_in_trait)]
pub trait RemovalStore {
    async fn get(&self, id: &str) -> Result<Option<VideoAsset>, sqlx::Error>;
    async fn delete(&self, id: &str) -> Result<bool, sqlx::Error>;
}

impl RemovalStore for PgVideoStore {
    async fn get(&self, id: &str) -> Result<Option<VideoAsset>, sqlx::Error> {
        prodreel_db::VideoRepo::find_by_id(self.pool(), id).await
    }

    async fn delete(&self, id: &str) -> Result<bool, sqlx::Error> {
        prodreel_db::VideoRepo::delete(self.pool(), id).await
    }
}

/// Remove a video record, deleting the attached platform file when a client
/// is available.
///
/// The remote delete is best-effort: a failure is logged and the local row
/// is removed regardless, so a revoked token can never strand local state.
/// When `shop` is given, it must match the record.
pub async fn run_removal<S: RemovalStore>(
    store: &S,
    admin: Option<&AdminClient>,
    video_id: &str,
    shop: Option<&str>,
) -> ApiResult<()> {
    let video = store
        .get(video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    // A shop can only delete its own records.
    if let Some(shop) = shop {
        if shop != video.shop {
            return Err(ApiError::not_found("Video not found"));
        }
    }

    if let (Some(file_id), Some(admin)) = (&video.remote_file_id, admin) {
        if let Err(err) = admin.file_delete(file_id).await {
            warn!(video_id, error = %err, "remote file delete failed");
        }
    }

    store.delete(video_id).await?;
    info!(video_id, "video deleted");
    Ok(())
}
