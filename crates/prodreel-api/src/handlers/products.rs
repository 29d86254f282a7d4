//! Product listing proxy for the attach-target picker.

use axum::extract::Query;
use axum::Json;
use serde::Deserialize;

use prodreel_shopify::{AdminClient, ProductSummary, PRODUCT_PAGE_SIZE};

use crate::error::ApiResult;

#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub shop: String,
    pub token: String,
}

/// List the shop's products so the frontend can pick an attach target.
pub async fn list_products(
    Query(query): Query<ProductsQuery>,
) -> ApiResult<Json<Vec<ProductSummary>>> {
    let admin = AdminClient::for_shop(&query.shop, &query.token)?;
    let products = admin.list_products(PRODUCT_PAGE_SIZE).await?;
    Ok(Json(products))
}
