//! Video listing, generation, refresh and delete handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use prodreel_db::{CreditRepo, NewVideoAsset, VideoRepo};
use prodreel_models::{GenerateVideoRequest, VideoSummary};
use prodreel_shopify::AdminClient;

use crate::error::{ApiError, ApiResult};
use crate::services::ingest::PgVideoStore;
use crate::services::{refresh, remove};
use crate::state::AppState;

/// Maximum number of product images per generation task.
const MAX_IMAGES: usize = 4;

#[derive(Debug, Deserialize)]
pub struct ShopQuery {
    pub shop: String,
}

/// List a shop's videos, newest first.
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
) -> ApiResult<Json<Vec<VideoSummary>>> {
    let videos = VideoRepo::list_by_shop(&state.db, &query.shop).await?;
    Ok(Json(videos.iter().map(|v| v.summary()).collect()))
}

/// Submit a generation task and record it locally.
///
/// The local record id is the remote task id, so later refreshes can query
/// the generation API directly.
pub async fn generate_video(
    State(state): State<AppState>,
    Json(request): Json<GenerateVideoRequest>,
) -> ApiResult<(StatusCode, Json<VideoSummary>)> {
    if request.images.is_empty() || request.images.len() > MAX_IMAGES {
        return Err(ApiError::bad_request(format!(
            "between 1 and {MAX_IMAGES} images are required"
        )));
    }

    let balance = CreditRepo::find_by_shop(&state.db, &request.shop)
        .await?
        .ok_or_else(|| ApiError::payment_required("no credit balance for this shop"))?;
    if balance.remaining(Utc::now()) <= 0 {
        return Err(ApiError::payment_required("no credits remaining"));
    }

    let task_id = state
        .kling
        .create_task(&request.prompt, &request.images, &request.aspect_ratio)
        .await?;

    let video = VideoRepo::create(
        &state.db,
        &NewVideoAsset {
            id: task_id.clone(),
            shop: request.shop.clone(),
            product_id: request.product_id.clone(),
            product_title: request.product_title.clone(),
            images: request.images.clone(),
            prompt: request.prompt.clone(),
        },
    )
    .await?;

    // The task is already running remotely, so a failed debit must not fail
    // the request.
    match CreditRepo::consume_one(&state.db, &request.shop).await {
        Ok(true) => {}
        Ok(false) => warn!(shop = %request.shop, "credit debit matched no row"),
        Err(err) => warn!(shop = %request.shop, error = %err, "credit debit failed"),
    }

    info!(task_id = %task_id, shop = %request.shop, "generation task recorded");
    Ok((StatusCode::CREATED, Json(video.summary())))
}

/// Re-query the generation API for a pending video and fold the result into
/// the local record.
pub async fn refresh_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<VideoSummary>> {
    let store = PgVideoStore::new(state.db.clone());
    let summary = refresh::run_refresh(&store, &state.kling, &state.http, &video_id).await?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    /// Scope the delete to this shop's records.
    pub shop: Option<String>,
    /// Admin API token, required to also remove the attached platform file.
    pub token: Option<String>,
}

/// Delete a video record, removing the attached platform file when possible.
pub async fn delete_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<StatusCode> {
    let admin = match (&query.shop, &query.token) {
        (Some(shop), Some(token)) => match AdminClient::for_shop(shop, token) {
            Ok(admin) => Some(admin),
            Err(err) => {
                warn!(video_id = %video_id, error = %err, "admin client build failed");
                None
            }
        },
        _ => None,
    };

    let store = PgVideoStore::new(state.db.clone());
    remove::run_removal(&store, admin.as_ref(), &video_id, query.shop.as_deref()).await?;
    Ok(StatusCode::NO_CONTENT)
}
