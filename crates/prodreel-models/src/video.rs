//! Video asset models and API schemas.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle status of a generated product video.
///
/// Success path: `processing -> uploading -> uploaded`.
/// A generation failure ends in `failed`; a finished generation that was never
/// (or unsuccessfully) pushed to the shop's file library sits at `completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Remote generation task still running
    #[default]
    Processing,
    /// Ingestion into the shop's file library in progress
    Uploading,
    /// Ingested and attached to a product
    Uploaded,
    /// Video ready for the product page, not (successfully) uploaded
    Completed,
    /// Remote generation failed
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Processing => "processing",
            VideoStatus::Uploading => "uploading",
            VideoStatus::Uploaded => "uploaded",
            VideoStatus::Completed => "completed",
            VideoStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a stored status string is not a known variant.
#[derive(Debug, Error)]
#[error("unknown video status: {0}")]
pub struct StatusParseError(pub String);

impl FromStr for VideoStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(VideoStatus::Processing),
            "uploading" => Ok(VideoStatus::Uploading),
            "uploaded" => Ok(VideoStatus::Uploaded),
            "completed" => Ok(VideoStatus::Completed),
            "failed" => Ok(VideoStatus::Failed),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}

impl TryFrom<String> for VideoStatus {
    type Error = StatusParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Summary of a video asset in a shop's library (for list view).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoSummary {
    pub id: String,
    pub product_id: String,
    pub product_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub status: VideoStatus,
    pub duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request body for starting a video generation.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GenerateVideoRequest {
    pub prompt: String,
    pub product_id: String,
    pub product_title: String,
    /// 1 to 4 source product images
    pub images: Vec<String>,
    pub shop: String,
    /// Defaults to a square video when omitted
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
}

fn default_aspect_ratio() -> String {
    "1:1".to_string()
}

/// Request body for ingesting a finished video into the shop's file library.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct VideoUploadRequest {
    pub shop: String,
    pub token: String,
    pub video_id: String,
    pub video_url: String,
    pub product_id: String,
}

/// Reply for a successful ingestion run.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct UploadReply {
    pub ok: bool,
    /// Remote file id the asset was registered under
    pub video_id: String,
    /// Product the asset was attached to
    pub attached_to: String,
}
