//! Client for the Kling AI multi-image-to-video API.
//!
//! Requests are signed with a short-lived HS256 JWT derived from the account
//! access/secret key pair.

mod token;

use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub use token::sign_request_token;

/// Path of the multi-image-to-video endpoint (create and status share it).
const TASK_PATH: &str = "/v1/videos/multi-image2video";

/// Kling calls are short; the heavy lifting happens remotely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Result type for Kling operations.
pub type KlingResult<T> = Result<T, KlingError>;

/// Errors raised by the generation API client.
#[derive(Debug, Error)]
pub enum KlingError {
    #[error("Kling API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("request token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// Connection settings for the generation API.
#[derive(Debug, Clone)]
pub struct KlingConfig {
    pub base_url: String,
    pub access_key: String,
    pub secret_key: String,
}

impl KlingConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            base_url: std::env::var("KLING_AI_API_URL")
                .unwrap_or_else(|_| "https://api-singapore.klingai.com".to_string()),
            access_key: std::env::var("KLING_ACCESS_KEY")
                .map_err(|_| "KLING_ACCESS_KEY not set".to_string())?,
            secret_key: std::env::var("KLING_SECRET_KEY")
                .map_err(|_| "KLING_SECRET_KEY not set".to_string())?,
        })
    }
}

/// Remote generation task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Submitted,
    Processing,
    Succeed,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Serialize)]
struct ImageRef {
    image: String,
}

#[derive(Debug, Serialize)]
struct CreateTaskRequest {
    image_list: Vec<ImageRef>,
    prompt: String,
    aspect_ratio: String,
}

/// Response envelope shared by all Kling endpoints.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct CreatedTask {
    task_id: String,
}

/// One finished output video.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskVideo {
    pub url: String,
    /// Reported in seconds; the API serializes it as a string.
    #[serde(deserialize_with = "string_or_number")]
    pub duration: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskResult {
    pub videos: Vec<TaskVideo>,
}

/// Status of a generation task, with results once it succeeded.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskData {
    pub task_id: String,
    pub task_status: TaskStatus,
    pub task_result: Option<TaskResult>,
}

impl TaskData {
    /// First output video, present once the task succeeded.
    pub fn first_video(&self) -> Option<&TaskVideo> {
        self.task_result.as_ref().and_then(|r| r.videos.first())
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// Kling AI API client.
#[derive(Clone)]
pub struct KlingClient {
    client: Client,
    config: KlingConfig,
}

impl KlingClient {
    /// Create a new client from configuration.
    pub fn new(config: KlingConfig) -> KlingResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    fn bearer(&self) -> KlingResult<String> {
        let token = sign_request_token(&self.config.access_key, &self.config.secret_key)?;
        Ok(format!("Bearer {token}"))
    }

    /// Submit a generation task and return its id.
    pub async fn create_task(
        &self,
        prompt: &str,
        images: &[String],
        aspect_ratio: &str,
    ) -> KlingResult<String> {
        let request = CreateTaskRequest {
            image_list: images
                .iter()
                .map(|image| ImageRef {
                    image: image.clone(),
                })
                .collect(),
            prompt: prompt.to_string(),
            aspect_ratio: aspect_ratio.to_string(),
        };

        let response = self
            .client
            .post(format!("{}{}", self.config.base_url, TASK_PATH))
            .header(reqwest::header::AUTHORIZATION, self.bearer()?)
            .json(&request)
            .send()
            .await?;

        let envelope: Envelope<CreatedTask> = Self::decode(response).await?;
        info!(task_id = %envelope.data.task_id, "generation task accepted");
        Ok(envelope.data.task_id)
    }

    /// Query the status of a generation task.
    pub async fn get_task(&self, task_id: &str) -> KlingResult<TaskData> {
        let response = self
            .client
            .get(format!("{}{}/{}", self.config.base_url, TASK_PATH, task_id))
            .header(reqwest::header::AUTHORIZATION, self.bearer()?)
            .send()
            .await?;

        let envelope: Envelope<TaskData> = Self::decode(response).await?;
        debug!(task_id, status = ?envelope.data.task_status, "fetched task status");
        Ok(envelope.data)
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> KlingResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KlingError::Api {
                status: status.as_u16(),
                body,
            });
        }
        let envelope = response.json::<T>().await?;
        Ok(envelope)
    }
}
