//! Credit balance handler.

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use prodreel_db::CreditRepo;

use crate::error::{ApiError, ApiResult};
use crate::handlers::videos::ShopQuery;
use crate::state::AppState;

/// Credit balance reply.
#[derive(Serialize)]
pub struct CreditsResponse {
    pub shop: String,
    pub extra_credit: i32,
    pub monthly_credit: i32,
    /// Monthly credits that still count, given the subscription expiry.
    pub remaining: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_type: Option<i32>,
}

/// Return the shop's credit balance.
pub async fn get_credits(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
) -> ApiResult<Json<CreditsResponse>> {
    let balance = CreditRepo::find_by_shop(&state.db, &query.shop)
        .await?
        .ok_or_else(|| ApiError::not_found("No credit balance for this shop"))?;

    let now = Utc::now();
    Ok(Json(CreditsResponse {
        shop: balance.shop_name.clone(),
        extra_credit: balance.extra_credit,
        monthly_credit: if balance.monthly_active(now) {
            balance.monthly_credit
        } else {
            0
        },
        remaining: balance.remaining(now),
        subscription_type: balance.subscription_type,
    }))
}
