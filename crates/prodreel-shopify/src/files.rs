//! Typed Admin API file operations.

use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::client::AdminClient;
use crate::error::{ShopifyError, ShopifyResult, UserError};

const STAGED_UPLOADS_CREATE: &str = r#"
mutation StagedUploadsCreate($input: [StagedUploadInput!]!) {
  stagedUploadsCreate(input: $input) {
    stagedTargets { url resourceUrl parameters { name value } }
    userErrors { field message }
  }
}
"#;

const FILE_CREATE: &str = r#"
mutation FileCreate($files: [FileCreateInput!]!) {
  fileCreate(files: $files) {
    files { id fileStatus }
    userErrors { field message }
  }
}
"#;

const FILE_STATUS: &str = r#"
query FileStatus($id: ID!) {
  node(id: $id) { ... on Video { id fileStatus } }
}
"#;

const FILE_UPDATE_ADD_PRODUCT: &str = r#"
mutation FileUpdate($files: [FileUpdateInput!]!) {
  fileUpdate(files: $files) {
    files { id }
    userErrors { field message code }
  }
}
"#;

const FILE_DELETE: &str = r#"
mutation FileDelete($fileIds: [ID!]!) {
  fileDelete(fileIds: $fileIds) {
    deletedFileIds
    userErrors { field message code }
  }
}
"#;

/// One signed-policy form field of a staged target. Forwarded byte-for-byte.
#[derive(Debug, Clone, Deserialize)]
pub struct StagedUploadParameter {
    pub name: String,
    pub value: String,
}

/// A one-time upload slot negotiated with the platform. Lives for one
/// ingestion run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedUploadTarget {
    /// Where the multipart POST goes
    pub url: String,
    /// Canonical source URL of the asset once uploaded
    pub resource_url: String,
    /// Opaque form fields, in the order the platform returned them
    pub parameters: Vec<StagedUploadParameter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StagedUploadsCreateData {
    staged_uploads_create: StagedUploadsCreatePayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StagedUploadsCreatePayload {
    staged_targets: Vec<StagedUploadTarget>,
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
struct FileNode {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileCreateData {
    file_create: FileMutationPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileUpdateData {
    file_update: FileMutationPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileMutationPayload {
    files: Vec<FileNode>,
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
struct NodeData {
    node: Option<FileStatusNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileStatusNode {
    file_status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileDeleteData {
    file_delete: FileDeletePayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileDeletePayload {
    #[serde(default)]
    #[allow(dead_code)]
    deleted_file_ids: Vec<String>,
    user_errors: Vec<UserError>,
}

fn check_user_errors(
    operation: &'static str,
    user_errors: Vec<UserError>,
    request_id: Option<String>,
) -> ShopifyResult<()> {
    if user_errors.is_empty() {
        return Ok(());
    }
    Err(ShopifyError::Validation {
        operation,
        user_errors,
        request_id,
    })
}

impl AdminClient {
    /// Ask the platform for a one-time upload target sized for the asset.
    pub async fn staged_upload_create(
        &self,
        filename: &str,
        mime: &str,
        size: u64,
    ) -> ShopifyResult<StagedUploadTarget> {
        let variables = json!({
            "input": [{
                "filename": filename,
                "mimeType": mime,
                "resource": "VIDEO",
                "httpMethod": "POST",
                "fileSize": size.to_string(),
            }]
        });

        let reply = self
            .execute::<StagedUploadsCreateData>(STAGED_UPLOADS_CREATE, variables)
            .await?;
        let payload = reply.data.staged_uploads_create;
        check_user_errors("stagedUploadsCreate", payload.user_errors, reply.request_id)?;

        payload
            .staged_targets
            .into_iter()
            .next()
            .ok_or_else(|| ShopifyError::Decode("stagedUploadsCreate returned no target".into()))
    }

    /// Register a file record for an uploaded staged resource, returning the
    /// new file id.
    pub async fn file_create(&self, resource_url: &str) -> ShopifyResult<String> {
        let variables = json!({
            "files": [{
                "contentType": "VIDEO",
                "originalSource": resource_url,
            }]
        });

        let reply = self.execute::<FileCreateData>(FILE_CREATE, variables).await?;
        let payload = reply.data.file_create;
        check_user_errors("fileCreate", payload.user_errors, reply.request_id)?;

        let file_id = payload
            .files
            .into_iter()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| ShopifyError::Decode("fileCreate returned no file".into()))?;
        info!(file_id, "created remote file record");
        Ok(file_id)
    }

    /// Current processing status of a file, as reported by the platform.
    pub async fn file_status(&self, file_id: &str) -> ShopifyResult<String> {
        let reply = self
            .execute::<NodeData>(FILE_STATUS, json!({ "id": file_id }))
            .await?;
        reply
            .data
            .node
            .and_then(|node| node.file_status)
            .ok_or_else(|| ShopifyError::Decode(format!("no file status for {file_id}")))
    }

    /// Attach a ready file to a product.
    pub async fn file_attach_to_product(
        &self,
        file_id: &str,
        product_gid: &str,
    ) -> ShopifyResult<()> {
        let variables = json!({
            "files": [{ "id": file_id, "referencesToAdd": [product_gid] }]
        });

        let reply = self
            .execute::<FileUpdateData>(FILE_UPDATE_ADD_PRODUCT, variables)
            .await?;
        check_user_errors("fileUpdate", reply.data.file_update.user_errors, reply.request_id)?;
        info!(file_id, product = product_gid, "attached file to product");
        Ok(())
    }

    /// Delete a remote file record.
    pub async fn file_delete(&self, file_id: &str) -> ShopifyResult<()> {
        let reply = self
            .execute::<FileDeleteData>(FILE_DELETE, json!({ "fileIds": [file_id] }))
            .await?;
        check_user_errors("fileDelete", reply.data.file_delete.user_errors, reply.request_id)
    }
}
