//! Product listing for the attach-target picker.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::AdminClient;
use crate::error::ShopifyResult;

const PRODUCTS_QUERY: &str = r#"
query Products($first: Int!) {
  products(first: $first) {
    nodes { id title featuredImage { url } }
  }
}
"#;

/// Page size matching the platform's maximum for one products query.
pub const PRODUCT_PAGE_SIZE: i64 = 250;

/// Featured image of a product, when it has one.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProductImage {
    pub url: String,
}

/// A product a video can be attached to.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<ProductImage>,
}

#[derive(Debug, Deserialize)]
struct ProductsData {
    products: ProductConnection,
}

#[derive(Debug, Deserialize)]
struct ProductConnection {
    nodes: Vec<ProductSummary>,
}

impl AdminClient {
    /// List the shop's products, newest page first.
    pub async fn list_products(&self, first: i64) -> ShopifyResult<Vec<ProductSummary>> {
        let reply = self
            .execute::<ProductsData>(PRODUCTS_QUERY, json!({ "first": first }))
            .await?;
        Ok(reply.data.products.nodes)
    }
}
