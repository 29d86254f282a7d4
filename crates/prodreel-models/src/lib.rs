//! Shared data models for the ProdReel backend.
//!
//! This crate provides Serde-serializable types for:
//! - Video asset status and API summaries
//! - Generation and upload request schemas

pub mod video;

// Re-export common types
pub use video::{
    GenerateVideoRequest, StatusParseError, UploadReply, VideoStatus, VideoSummary,
    VideoUploadRequest,
};
