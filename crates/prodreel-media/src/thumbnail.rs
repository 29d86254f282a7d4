//! First-frame thumbnail extraction via FFmpeg.

use std::path::Path;
use std::process::Stdio;

use base64::Engine;
use reqwest::Client;
use tokio::process::Command;
use tracing::debug;

use crate::download::fetch_video;
use crate::error::{MediaError, MediaResult};

/// Extract the first frame of a video file as JPEG bytes.
pub async fn extract_first_frame(video_path: &Path) -> MediaResult<Vec<u8>> {
    let ffmpeg = which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    let output = Command::new(ffmpeg)
        .arg("-v")
        .arg("error")
        .arg("-i")
        .arg(video_path)
        .arg("-frames:v")
        .arg("1")
        .arg("-f")
        .arg("image2")
        .arg("-c:v")
        .arg("mjpeg")
        .arg("pipe:1")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() || output.stdout.is_empty() {
        return Err(MediaError::FfmpegFailed {
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    debug!(bytes = output.stdout.len(), "extracted first frame");
    Ok(output.stdout)
}

/// Download a video and return its first frame as a base64-encoded JPEG.
///
/// The intermediate download lives in a temp file that is removed before this
/// returns, whether frame extraction succeeds or not.
pub async fn thumbnail_from_url(client: &Client, url: &str) -> MediaResult<String> {
    let download = fetch_video(client, url).await?;
    let frame = extract_first_frame(download.path()).await?;
    Ok(base64::engine::general_purpose::STANDARD.encode(frame))
}
