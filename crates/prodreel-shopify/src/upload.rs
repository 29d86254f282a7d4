//! Multipart upload to a negotiated staged target.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::debug;

use crate::error::{ShopifyError, ShopifyResult};
use crate::files::StagedUploadTarget;

/// Statuses the storage endpoints answer a successful POST with.
const ACCEPTED_STATUSES: [u16; 3] = [200, 201, 204];

/// POST a downloaded file to the staged target.
///
/// Every parameter the negotiation returned is forwarded verbatim. The field
/// set is an opaque signed policy, so nothing is added, renamed, or dropped;
/// the binary content follows as a single `file` part. There is no retry; a
/// failure here is terminal for the run.
pub async fn upload_staged(
    http: &Client,
    target: &StagedUploadTarget,
    file_path: &Path,
    filename: &str,
    mime: &str,
) -> ShopifyResult<()> {
    let bytes = tokio::fs::read(file_path).await?;

    let mut form = Form::new();
    for parameter in &target.parameters {
        form = form.text(parameter.name.clone(), parameter.value.clone());
    }
    form = form.part(
        "file",
        Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime)?,
    );

    debug!(url = %target.url, fields = target.parameters.len(), "posting staged upload");
    let response = http.post(&target.url).multipart(form).send().await?;

    let status = response.status().as_u16();
    if !ACCEPTED_STATUSES.contains(&status) {
        let body = response.text().await.unwrap_or_default();
        return Err(ShopifyError::Upload { status, body });
    }
    Ok(())
}
