//! Storefront upload handler.

use axum::extract::State;
use axum::Json;
use tracing::info;

use prodreel_models::{UploadReply, VideoUploadRequest};
use prodreel_shopify::AdminClient;

use crate::error::ApiResult;
use crate::services::ingest::{self, PgVideoStore};
use crate::state::AppState;

/// Run the full ingestion pipeline for one video.
pub async fn upload_video(
    State(state): State<AppState>,
    Json(request): Json<VideoUploadRequest>,
) -> ApiResult<Json<UploadReply>> {
    let admin = AdminClient::for_shop(&request.shop, &request.token)?;
    let store = PgVideoStore::new(state.db.clone());

    let reply = ingest::run_ingestion(
        &store,
        &admin,
        &state.http,
        &request,
        state.config.ready_timeout,
    )
    .await?;

    info!(video_id = %request.video_id, file_id = %reply.video_id, "ingestion finished");
    Ok(Json(reply))
}
