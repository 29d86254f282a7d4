//! Shopify Admin GraphQL client and file-ingestion primitives.
//!
//! Covers the four Admin API operations the ingestion pipeline needs
//! (staged-upload negotiation, file creation, readiness polling, product
//! attach) plus the multipart upload to the staged target, the best-effort
//! remote delete, and the product listing behind the attach-target picker.

pub mod client;
pub mod error;
pub mod files;
pub mod poll;
pub mod products;
pub mod upload;

pub use client::{AdminClient, GraphqlReply};
pub use error::{GraphqlErrorEntry, ShopifyError, ShopifyResult, UserError};
pub use files::{StagedUploadParameter, StagedUploadTarget};
pub use poll::{DEFAULT_READY_TIMEOUT, POLL_INTERVAL};
pub use products::{ProductImage, ProductSummary, PRODUCT_PAGE_SIZE};
pub use upload::upload_staged;
