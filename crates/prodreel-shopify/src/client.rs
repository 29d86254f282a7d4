//! Thin transport over the Shopify Admin GraphQL endpoint.
//!
//! Responses are decoded into typed result structures here, once, so callers
//! never index into untyped JSON.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{GraphqlErrorEntry, ShopifyError, ShopifyResult};

/// Admin API version the queries below are written against.
const API_VERSION: &str = "2024-07";

/// Access-token header the Admin API expects.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Response header carrying the platform's per-call correlation id.
const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// The ingestion session spans a large body transfer plus a multi-minute
/// readiness poll, so the client timeout is generous.
const SESSION_TIMEOUT: Duration = Duration::from_secs(120);

/// A decoded GraphQL reply plus the request id for logging.
#[derive(Debug)]
pub struct GraphqlReply<T> {
    pub data: T,
    pub request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    errors: Option<Vec<GraphqlErrorEntry>>,
}

/// Client for one shop's Admin GraphQL endpoint.
#[derive(Clone)]
pub struct AdminClient {
    http: Client,
    endpoint: String,
    token: String,
}

impl AdminClient {
    /// Create a client for a shop domain and access token.
    pub fn for_shop(shop: &str, token: &str) -> ShopifyResult<Self> {
        let http = Client::builder().timeout(SESSION_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint: format!("https://{shop}/admin/api/{API_VERSION}/graphql.json"),
            token: token.to_string(),
        })
    }

    /// Create a client against an explicit endpoint URL. No client-level
    /// timeout is set; used by tests against a local server.
    pub fn with_endpoint(endpoint: impl Into<String>, token: &str) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
            token: token.to_string(),
        }
    }

    /// The underlying HTTP client, reused for the staged-target upload.
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Post one query + variables and decode the reply.
    ///
    /// HTTP >= 400 becomes [`ShopifyError::Transport`]; a top-level `errors`
    /// array becomes [`ShopifyError::GraphQl`]; both carry the request id.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> ShopifyResult<GraphqlReply<T>> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(ACCESS_TOKEN_HEADER, &self.token)
            .json(&serde_json::json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let status = response.status();
        let body = response.text().await?;

        if status.as_u16() >= 400 {
            return Err(ShopifyError::Transport {
                status: status.as_u16(),
                body,
                request_id,
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| ShopifyError::Decode(format!("invalid GraphQL body: {e}")))?;

        if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
            return Err(ShopifyError::GraphQl { errors, request_id });
        }

        let data = envelope
            .data
            .ok_or_else(|| ShopifyError::Decode("response contained no data".to_string()))?;

        debug!(request_id = request_id.as_deref().unwrap_or("none"), "GraphQL call ok");
        Ok(GraphqlReply { data, request_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Shop {
        name: String,
    }

    #[derive(Debug, Deserialize)]
    struct ShopData {
        shop: Shop,
    }

    #[tokio::test]
    async fn test_execute_returns_data_and_request_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql.json"))
            .and(header("X-Shopify-Access-Token", "tok"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Request-Id", "req-1")
                    .set_body_json(json!({"data": {"shop": {"name": "demo"}}})),
            )
            .mount(&server)
            .await;

        let client = AdminClient::with_endpoint(format!("{}/graphql.json", server.uri()), "tok");
        let reply: GraphqlReply<ShopData> = client
            .execute("query { shop { name } }", json!({}))
            .await
            .unwrap();

        assert_eq!(reply.data.shop.name, "demo");
        assert_eq!(reply.request_id.as_deref(), Some("req-1"));
    }

    #[tokio::test]
    async fn test_execute_maps_errors_array() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Request-Id", "req-err")
                    .set_body_json(json!({
                        "data": null,
                        "errors": [{"message": "Field 'nope' doesn't exist"}]
                    })),
            )
            .mount(&server)
            .await;

        let client = AdminClient::with_endpoint(server.uri(), "tok");
        let err = client
            .execute::<ShopData>("query { nope }", json!({}))
            .await
            .unwrap_err();

        match err {
            ShopifyError::GraphQl { errors, request_id } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(request_id.as_deref(), Some("req-err"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_execute_maps_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("X-Request-Id", "req-429")
                    .set_body_string("throttled"),
            )
            .mount(&server)
            .await;

        let client = AdminClient::with_endpoint(server.uri(), "tok");
        let err = client
            .execute::<ShopData>("query { shop { name } }", json!({}))
            .await
            .unwrap_err();

        match err {
            ShopifyError::Transport {
                status,
                body,
                request_id,
            } => {
                assert_eq!(status, 429);
                assert_eq!(body, "throttled");
                assert_eq!(request_id.as_deref(), Some("req-429"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_execute_rejects_missing_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = AdminClient::with_endpoint(server.uri(), "tok");
        let err = client
            .execute::<ShopData>("query { shop { name } }", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ShopifyError::Decode(_)));
    }
}
