//! The storefront ingestion pipeline.
//!
//! Moves a generated video from its temporary hosting into the shop's own
//! file storage and attaches it to the product, keeping the local record's
//! status consistent at every step:
//!
//! - entry flips the record to `uploading` (check-and-set, so concurrent
//!   runs over the same record are refused)
//! - success lands on `uploaded` with the remote file id recorded
//! - any failure rolls the record back to `completed`

use std::time::Duration;

use tracing::{info, warn};

use prodreel_db::{DbPool, VideoAsset, VideoRepo};
use prodreel_media::{fetch_video, filename_from_url, mime_for_filename};
use prodreel_models::{UploadReply, VideoUploadRequest};
use prodreel_shopify::{upload_staged, AdminClient};

use crate::error::{ApiError, ApiResult};

/// Persistence seam for the pipeline's status transitions.
#[allow(async_fn_in_trait)]
pub trait VideoStore {
    async fn get(&self, id: &str) -> Result<Option<VideoAsset>, sqlx::Error>;
    /// Flip the record to `uploading` unless it already is. Returns whether
    /// this call won the transition.
    async fn try_begin_upload(&self, id: &str) -> Result<bool, sqlx::Error>;
    async fn finish_upload(&self, id: &str, remote_file_id: &str) -> Result<(), sqlx::Error>;
    async fn abort_upload(&self, id: &str) -> Result<(), sqlx::Error>;
}

/// Postgres-backed store used by the live server.
#[derive(Clone)]
pub struct PgVideoStore {
    pool: DbPool,
}

impl PgVideoStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl VideoStore for PgVideoStore {
    async fn get(&self, id: &str) -> Result<Option<VideoAsset>, sqlx::Error> {
        VideoRepo::find_by_id(&self.pool, id).await
    }

    async fn try_begin_upload(&self, id: &str) -> Result<bool, sqlx::Error> {
        VideoRepo::try_begin_upload(&self.pool, id).await
    }

    async fn finish_upload(&self, id: &str, remote_file_id: &str) -> Result<(), sqlx::Error> {
        VideoRepo::finish_upload(&self.pool, id, remote_file_id).await
    }

    async fn abort_upload(&self, id: &str) -> Result<(), sqlx::Error> {
        VideoRepo::abort_upload(&self.pool, id).await
    }
}

/// Run the full ingestion pipeline for one video.
///
/// Returns the remote file id on success. The record's existence is checked
/// before any network work starts.
pub async fn run_ingestion<S: VideoStore>(
    store: &S,
    admin: &AdminClient,
    http: &reqwest::Client,
    request: &VideoUploadRequest,
    ready_timeout: Duration,
) -> ApiResult<UploadReply> {
    let video = store
        .get(&request.video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    if !store.try_begin_upload(&video.id).await? {
        return Err(ApiError::conflict(
            "an upload for this video is already in progress",
        ));
    }

    match run_pipeline(admin, http, request, ready_timeout).await {
        Ok(file_id) => match store.finish_upload(&video.id, &file_id).await {
            Ok(()) => {
                info!(video_id = %video.id, file_id = %file_id, "video ingested and attached");
                Ok(UploadReply {
                    ok: true,
                    video_id: file_id,
                    attached_to: request.product_id.clone(),
                })
            }
            Err(err) => {
                roll_back(store, &video.id).await;
                Err(err.into())
            }
        },
        Err(err) => {
            roll_back(store, &video.id).await;
            Err(err)
        }
    }
}

/// The five remote steps: download, negotiate a staged slot, multipart
/// upload, create-and-await the file record, attach to the product.
async fn run_pipeline(
    admin: &AdminClient,
    http: &reqwest::Client,
    request: &VideoUploadRequest,
    ready_timeout: Duration,
) -> ApiResult<String> {
    let download = fetch_video(http, &request.video_url).await?;
    let filename = filename_from_url(&request.video_url);
    let mime = mime_for_filename(&filename);

    let target = admin
        .staged_upload_create(&filename, mime, download.size())
        .await?;
    upload_staged(admin.http(), &target, download.path(), &filename, mime).await?;

    let file_id = admin.file_create(&target.resource_url).await?;
    admin.wait_until_ready(&file_id, ready_timeout).await?;
    admin
        .file_attach_to_product(&file_id, &request.product_id)
        .await?;

    // `download` drops here and removes its temp file.
    Ok(file_id)
}

async fn roll_back<S: VideoStore>(store: &S, video_id: &str) {
    if let Err(err) = store.abort_upload(video_id).await {
        warn!(video_id, error = %err, "status rollback failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Utc;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use prodreel_models::VideoStatus;
    use prodreel_shopify::ShopifyError;

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

        fn empty() -> Self {
            Self {
                videos: Mutex::new(HashMap::new()),
            }
        }

        fn status_of(&self, id: &str) -> VideoStatus {
            self.videos.lock().unwrap()[id].status
        }

        fn remote_file_id_of(&self, id: &str) -> Option<String> {
            self.videos.lock().unwrap()[id].remote_file_id.clone()
        }
    }

    impl VideoStore for MemStore {
        async fn get(&self, id: &str) -> Result<Option<VideoAsset>, sqlx::Error> {
            Ok(self.videos.lock().unwrap().get(id).cloned())
        }

        async fn try_begin_upload(&self, id: &str) -> Result<bool, sqlx::Error> {
            let mut videos = self.videos.lock().unwrap();
            let video = videos.get_mut(id).unwrap();
            if video.status == VideoStatus::Uploading {
                return Ok(false);
            }
            video.status = VideoStatus::Uploading;
            Ok(true)
        }

        async fn finish_upload(&self, id: &str, remote_file_id: &str) -> Result<(), sqlx::Error> {
            let mut videos = self.videos.lock().unwrap();
            let video = videos.get_mut(id).unwrap();
            video.status = VideoStatus::Uploaded;
            video.remote_file_id = Some(remote_file_id.to_string());
            Ok(())
        }

        async fn abort_upload(&self, id: &str) -> Result<(), sqlx::Error> {
            self.videos.lock().unwrap().get_mut(id).unwrap().status = VideoStatus::Completed;
            Ok(())
        }
    }

    fn completed_video(id: &str) -> VideoAsset {
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
            video_url: Some("https://cdn.example.com/out.mp4".to_string()),
            thumbnail: None,
            status: VideoStatus::Completed,
            duration: 5.0,
            created_at: Utc::now(),
        }
    }

    fn upload_request(server: &MockServer) -> VideoUploadRequest {
        VideoUploadRequest {
            shop: "demo.myshopify.com".to_string(),
            token: "shpat_test".to_string(),
            video_id: "task-1".to_string(),
            video_url: format!("{}/video.mp4", server.uri()),
            product_id: "gid://shopify/Product/42".to_string(),
        }
    }

    async fn mount_video_source(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/video.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![9u8; 32]))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_happy_path_lands_on_uploaded() {
        let server = MockServer::start().await;
        let store = MemStore::with_video(completed_video("task-1"));
        let file_id = "gid://shopify/Video/111";

        mount_video_source(&server).await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_string_contains("stagedUploadsCreate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"stagedUploadsCreate": {
                    "stagedTargets": [{
                        "url": format!("{}/staged", server.uri()),
                        "resourceUrl": format!("{}/resource/out.mp4", server.uri()),
                        "parameters": [
                            {"name": "key", "value": "tmp/out.mp4"},
                            {"name": "policy", "value": "signed"}
                        ]
                    }],
                    "userErrors": []
                }}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/staged"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_string_contains("fileCreate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"fileCreate": {
                    "files": [{"id": file_id, "fileStatus": "UPLOADED"}],
                    "userErrors": []
                }}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_string_contains("FileStatus"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"node": {"id": file_id, "fileStatus": "READY"}}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_string_contains("fileUpdate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"fileUpdate": {"files": [{"id": file_id}], "userErrors": []}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let admin = AdminClient::with_endpoint(format!("{}/graphql", server.uri()), "shpat_test");
        let request = upload_request(&server);
        let reply = run_ingestion(
            &store,
            &admin,
            &reqwest::Client::new(),
            &request,
            Duration::from_secs(300),
        )
        .await
        .unwrap();

        assert!(reply.ok);
        assert_eq!(reply.video_id, file_id);
        assert_eq!(reply.attached_to, request.product_id);
        assert_eq!(store.status_of("task-1"), VideoStatus::Uploaded);
        assert_eq!(store.remote_file_id_of("task-1").as_deref(), Some(file_id));
    }

    #[tokio::test]
    async fn test_validation_failure_rolls_back_to_completed() {
        let server = MockServer::start().await;
        let store = MemStore::with_video(completed_video("task-1"));

        mount_video_source(&server).await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_string_contains("stagedUploadsCreate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"stagedUploadsCreate": {
                    "stagedTargets": [],
                    "userErrors": [{"field": ["input"], "message": "fileSize is invalid"}]
                }}
            })))
            .mount(&server)
            .await;

        let admin = AdminClient::with_endpoint(format!("{}/graphql", server.uri()), "shpat_test");
        let err = run_ingestion(
            &store,
            &admin,
            &reqwest::Client::new(),
            &upload_request(&server),
            Duration::from_secs(300),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ApiError::Shopify(ShopifyError::Validation { .. })
        ));
        assert_eq!(store.status_of("task-1"), VideoStatus::Completed);
        assert_eq!(store.remote_file_id_of("task-1"), None);
    }

    #[tokio::test]
    async fn test_download_failure_rolls_back_to_completed() {
        let server = MockServer::start().await;
        let store = MemStore::with_video(completed_video("task-1"));

        Mock::given(method("GET"))
            .and(path("/video.mp4"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let admin = AdminClient::with_endpoint(format!("{}/graphql", server.uri()), "shpat_test");
        let err = run_ingestion(
            &store,
            &admin,
            &reqwest::Client::new(),
            &upload_request(&server),
            Duration::from_secs(300),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Media(_)));
        assert_eq!(store.status_of("task-1"), VideoStatus::Completed);
    }

    #[tokio::test]
    async fn test_concurrent_run_is_refused_before_any_network_call() {
        let server = MockServer::start().await;
        let mut video = completed_video("task-1");
        video.status = VideoStatus::Uploading;
        let store = MemStore::with_video(video);

        let admin = AdminClient::with_endpoint(format!("{}/graphql", server.uri()), "shpat_test");
        let err = run_ingestion(
            &store,
            &admin,
            &reqwest::Client::new(),
            &upload_request(&server),
            Duration::from_secs(300),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Conflict(_)));
        // Still held by the other run, not rolled back by this one.
        assert_eq!(store.status_of("task-1"), VideoStatus::Uploading);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_video_is_not_found() {
        let server = MockServer::start().await;
        let store = MemStore::empty();

        let admin = AdminClient::with_endpoint(format!("{}/graphql", server.uri()), "shpat_test");
        let err = run_ingestion(
            &store,
            &admin,
            &reqwest::Client::new(),
            &upload_request(&server),
            Duration::from_secs(300),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
