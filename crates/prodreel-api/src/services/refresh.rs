//! Folding a generation task's remote status into the local record.
//!
//! Only a `processing` record has anything to refresh: the guard here and
//! the `status = 'processing'` condition in the store keep a re-applied
//! refresh from downgrading a finished record or overwriting its duration
//! and thumbnail.

use tracing::{info, warn};

use prodreel_db::{VideoAsset, VideoRepo};
use prodreel_kling::{KlingClient, TaskStatus};
use prodreel_models::{VideoStatus, VideoSummary};

use crate::error::{ApiError, ApiResult};
use crate::services::ingest::PgVideoStore;

/// Persistence seam for the refresh transition.
#[allow(async_fn_in_trait)]
pub trait RefreshStore {
    async fn get(&self, id: &str) -> Result<Option<VideoAsset>, sqlx::Error>;
    /// Apply a finished generation to a still-`processing` row. Returns
    /// `None` when the row already left `processing`.
    async fn apply_generation_result(
        &self,
        id: &str,
        video_url: &str,
        duration: f64,
        thumbnail: Option<&str>,
    ) -> Result<Option<VideoAsset>, sqlx::Error>;
    async fn mark_generation_failed(&self, id: &str) -> Result<(), sqlx::Error>;
}

impl RefreshStore for PgVideoStore {
    async fn get(&self, id: &str) -> Result<Option<VideoAsset>, sqlx::Error> {
        VideoRepo::find_by_id(self.pool(), id).await
    }

    async fn apply_generation_result(
        &self,
        id: &str,
        video_url: &str,
        duration: f64,
        thumbnail: Option<&str>,
    ) -> Result<Option<VideoAsset>, sqlx::Error> {
        VideoRepo::mark_generation_result(self.pool(), id, video_url, duration, thumbnail).await
    }

    async fn mark_generation_failed(&self, id: &str) -> Result<(), sqlx::Error> {
        VideoRepo::mark_generation_failed(self.pool(), id).await
    }
}

/// Re-query the generation API for a pending video and fold the result into
/// the local record. Records past `processing` are returned unchanged
/// without touching the network.
pub async fn run_refresh<S: RefreshStore>(
    store: &S,
    kling: &KlingClient,
    http: &reqwest::Client,
    video_id: &str,
) -> ApiResult<VideoSummary> {
    let video = store
        .get(video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    // Only pending records have anything to refresh.
    if video.status != VideoStatus::Processing {
        return Ok(video.summary());
    }

    let task = kling.get_task(video_id).await?;
    match task.task_status {
        TaskStatus::Succeed => {
            let Some(output) = task.first_video() else {
                warn!(task_id = %video_id, "task succeeded without an output video");
                return Ok(video.summary());
            };

            // Thumbnail extraction is best-effort; the video stands on its own.
            let thumbnail = match prodreel_media::thumbnail_from_url(http, &output.url).await {
                Ok(data) => Some(data),
                Err(err) => {
                    warn!(task_id = %video_id, error = %err, "thumbnail extraction failed");
                    None
                }
            };

            let updated = store
                .apply_generation_result(
                    video_id,
                    &output.url,
                    output.duration,
                    thumbnail.as_deref(),
                )
                .await?
                // A concurrent refresh already applied the result.
                .unwrap_or(video);

            info!(task_id = %video_id, "generation completed");
            Ok(updated.summary())
        }
        TaskStatus::Failed => {
            store.mark_generation_failed(video_id).await?;
            let mut failed = video;
            failed.status = VideoStatus::Failed;
            Ok(failed.summary())
        }
        TaskStatus::Submitted | TaskStatus::Processing | TaskStatus::Unknown => {
            Ok(video.summary())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Utc;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use prodreel_kling::KlingConfig;

    struct MemStore {
        videos: Mutex<HashMap<String, VideoAsset>>,
    }

    impl MemStore {
        fn with_video(video: VideoAsset) -> Self {
            let mut videos = HashMap::new();
            videos.insert(video.id.clone(), video);
            Self {
                videos: Mutex::new(videos),
            }
        }

        fn snapshot(&self, id: &str) -> VideoAsset {
            self.videos.lock().unwrap()[id].clone()
        }
    }

    impl RefreshStore for MemStore {
        async fn get(&self, id: &str) -> Result<Option<VideoAsset>, sqlx::Error> {
            Ok(self.videos.lock().unwrap().get(id).cloned())
        }

        async fn apply_generation_result(
            &self,
            id: &str,
            video_url: &str,
            duration: f64,
            thumbnail: Option<&str>,
        ) -> Result<Option<VideoAsset>, sqlx::Error> {
            let mut videos = self.videos.lock().unwrap();
            let video = videos.get_mut(id).unwrap();
            if video.status != VideoStatus::Processing {
                return Ok(None);
            }
            video.video_url = Some(video_url.to_string());
            video.duration = duration;
            video.thumbnail = thumbnail.map(str::to_string);
            video.status = VideoStatus::Completed;
            Ok(Some(video.clone()))
        }

        async fn mark_generation_failed(&self, id: &str) -> Result<(), sqlx::Error> {
            self.videos.lock().unwrap().get_mut(id).unwrap().status = VideoStatus::Failed;
            Ok(())
        }
    }

    fn video_with_status(id: &str, status: VideoStatus) -> VideoAsset {
        VideoAsset {
            id: id.to_string(),
            shop: "demo.myshopify.com".to_string(),
            product_id: "gid://shopify/Product/42".to_string(),
            product_title: "Demo product".to_string(),
            remote_file_id: None,
            image1: "https://cdn.example.com/1.png".to_string(),
            image2: None,
            image3: None,
            image4: None,
            prompt: "spin the product".to_string(),
            video_url: None,
            thumbnail: None,
            status,
            duration: 5.0,
            created_at: Utc::now(),
        }
    }

    fn kling_for(server: &MockServer) -> KlingClient {
        KlingClient::new(KlingConfig {
            base_url: server.uri(),
            access_key: "ak".to_string(),
            secret_key: "sk".to_string(),
        })
        .unwrap()
    }

    fn succeed_body(server: &MockServer) -> serde_json::Value {
        json!({"data": {
            "task_id": "task-1",
            "task_status": "succeed",
            "task_result": {"videos": [{
                "url": format!("{}/out.mp4", server.uri()),
                "duration": "6.5"
            }]}
        }})
    }

    #[tokio::test]
    async fn test_completed_record_skips_remote_query() {
        let server = MockServer::start().await;
        let mut video = video_with_status("task-1", VideoStatus::Completed);
        video.video_url = Some("https://cdn.example.com/out.mp4".to_string());
        video.duration = 6.5;
        let store = MemStore::with_video(video);

        let summary = run_refresh(&store, &kling_for(&server), &reqwest::Client::new(), "task-1")
            .await
            .unwrap();

        assert_eq!(summary.status, VideoStatus::Completed);
        assert_eq!(summary.duration, 6.5);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_succeeded_task_completes_record() {
        let server = MockServer::start().await;
        let store = MemStore::with_video(video_with_status("task-1", VideoStatus::Processing));

        Mock::given(method("GET"))
            .and(path("/v1/videos/multi-image2video/task-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(succeed_body(&server)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/out.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![9u8; 16]))
            .mount(&server)
            .await;

        let summary = run_refresh(&store, &kling_for(&server), &reqwest::Client::new(), "task-1")
            .await
            .unwrap();

        assert_eq!(summary.status, VideoStatus::Completed);
        assert_eq!(summary.duration, 6.5);
        assert_eq!(
            summary.video_url.as_deref(),
            Some(format!("{}/out.mp4", server.uri()).as_str())
        );
        assert_eq!(store.snapshot("task-1").status, VideoStatus::Completed);
    }

    #[tokio::test]
    async fn test_second_refresh_leaves_finished_record_untouched() {
        let server = MockServer::start().await;
        let store = MemStore::with_video(video_with_status("task-1", VideoStatus::Processing));

        Mock::given(method("GET"))
            .and(path("/v1/videos/multi-image2video/task-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(succeed_body(&server)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/out.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![9u8; 16]))
            .mount(&server)
            .await;

        let kling = kling_for(&server);
        let http = reqwest::Client::new();
        run_refresh(&store, &kling, &http, "task-1").await.unwrap();
        let after_first = store.snapshot("task-1");

        // The record is `completed` now; a second refresh must not query the
        // task again or change any field.
        let summary = run_refresh(&store, &kling, &http, "task-1").await.unwrap();
        let after_second = store.snapshot("task-1");

        assert_eq!(summary.status, VideoStatus::Completed);
        assert_eq!(after_second.status, after_first.status);
        assert_eq!(after_second.duration, after_first.duration);
        assert_eq!(after_second.video_url, after_first.video_url);
        assert_eq!(after_second.thumbnail, after_first.thumbnail);
    }

    #[tokio::test]
    async fn test_failed_task_marks_record_failed() {
        let server = MockServer::start().await;
        let store = MemStore::with_video(video_with_status("task-1", VideoStatus::Processing));

        Mock::given(method("GET"))
            .and(path("/v1/videos/multi-image2video/task-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"task_id": "task-1", "task_status": "failed", "task_result": null}
            })))
            .mount(&server)
            .await;

        let summary = run_refresh(&store, &kling_for(&server), &reqwest::Client::new(), "task-1")
            .await
            .unwrap();

        assert_eq!(summary.status, VideoStatus::Failed);
        assert_eq!(store.snapshot("task-1").status, VideoStatus::Failed);
    }
}
