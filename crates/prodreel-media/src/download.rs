//! Remote video retrieval.
//!
//! Downloads a remotely-hosted video to a scoped temp file. The size is
//! established with a HEAD probe; when the upstream does not declare a usable
//! `Content-Length`, the streamed bytes are counted instead.

use futures_util::StreamExt;
use reqwest::Client;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

use crate::error::{MediaError, MediaResult};

/// A fully downloaded video held in a temp file.
///
/// The backing file is removed when this value is dropped, on success and
/// failure paths alike.
#[derive(Debug)]
pub struct DownloadedVideo {
    temp: NamedTempFile,
    size: u64,
}

impl DownloadedVideo {
    /// Path to the downloaded content.
    pub fn path(&self) -> &std::path::Path {
        self.temp.path()
    }

    /// Byte size of the downloaded content.
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Download a video from `url` into a temp file, returning its byte size
/// alongside the scoped file.
pub async fn fetch_video(client: &Client, url: &str) -> MediaResult<DownloadedVideo> {
    // Probe for a declared size first; a failed probe is not fatal, it just
    // means the streamed bytes get counted below.
    let declared_len = match client.head(url).send().await {
        Ok(resp) if resp.status().is_success() => resp
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|len| *len > 0),
        Ok(resp) => {
            debug!(status = %resp.status(), "size probe returned non-success, counting bytes");
            None
        }
        Err(e) => {
            warn!("size probe failed, counting bytes: {}", e);
            None
        }
    };

    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(MediaError::Download {
            status: resp.status().as_u16(),
        });
    }

    let temp = tempfile::Builder::new().suffix(".mp4").tempfile()?;
    let mut file = tokio::fs::File::from_std(temp.reopen()?);

    let mut streamed: u64 = 0;
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        streamed += chunk.len() as u64;
    }
    file.flush().await?;

    let size = declared_len.unwrap_or(streamed);
    if size == 0 {
        return Err(MediaError::EmptyDownload);
    }

    debug!(size, path = %temp.path().display(), "downloaded video");
    Ok(DownloadedVideo { temp, size })
}

/// Derive an upload filename from the source URL, falling back to a generic
/// name when the URL has no usable basename.
pub fn filename_from_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|segments| segments.last().map(str::to_string))
        })
        .filter(|name| !name.is_empty() && name.contains('.'))
        .unwrap_or_else(|| "video.mp4".to_string())
}

/// Guess a video MIME type from a filename extension.
pub fn mime_for_filename(filename: &str) -> &'static str {
    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        _ => "video/mp4",
    }
}
