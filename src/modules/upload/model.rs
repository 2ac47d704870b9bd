use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::modules::upload::schema::{UploadEntity, UploadPart};

/// Chunked upload configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_chunk_size: usize,
    pub upload_dir: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InitiateUploadRequest {
    #[validate(length(min = 1, max = 255, message = "File name must be 1-255 characters long"))]
    pub file_name: String,
    pub file_type: Option<String>,
    pub file_size: u64,
    pub folder: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateUploadResponse {
    pub upload_id: Uuid,
}

/// One chunk as received from the multipart form.
#[derive(Debug, Clone)]
pub struct ChunkUpload {
    pub upload_id: Uuid,
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkReceipt {
    pub upload_id: Uuid,
    pub chunk_index: u32,
    pub size: u64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUploadRequest {
    pub upload_id: Uuid,
    #[validate(length(min = 1, message = "At least one part is required"))]
    pub parts: Vec<UploadPart>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUploadResponse {
    pub upload_id: Uuid,
    pub file_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadStatusResponse {
    #[serde(flatten)]
    pub upload: UploadEntity,
    pub parts_count: usize,
    pub received_chunks: usize,
}
