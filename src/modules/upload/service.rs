use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::constants::DEFAULT_UPLOAD_FOLDER;
use crate::modules::upload::{
    model::{
        ChunkReceipt, ChunkUpload, CompleteUploadRequest, CompleteUploadResponse,
        InitiateUploadRequest, UploadConfig, UploadStatusResponse,
    },
    repository::UploadRepository,
    schema::{UploadEntity, UploadPart, UploadStatus},
    storage::ChunkStorage,
};

#[derive(Clone)]
pub struct UploadService<R>
where
    R: UploadRepository + Send + Sync,
{
    upload_repo: Arc<R>,
    storage: ChunkStorage,
    config: UploadConfig,
}

fn validate_file_name(file_name: &str) -> Result<String, error::SystemError> {
    let name = file_name.trim();
    if name.is_empty() || name == "." || name == ".." || name.contains(|c: char| c == '/' || c == '\\') {
        return Err(error::SystemError::bad_request("Invalid file name"));
    }
    Ok(name.to_string())
}

fn normalize_folder(folder: Option<&str>) -> Result<String, error::SystemError> {
    let folder = folder.map(|f| f.trim().trim_matches('/')).unwrap_or_default();
    if folder.is_empty() {
        return Ok(DEFAULT_UPLOAD_FOLDER.to_string());
    }

    let valid = folder
        .split('/')
        .all(|segment| !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('\\'));
    if !valid {
        return Err(error::SystemError::bad_request("Invalid folder"));
    }
    Ok(folder.to_string())
}

impl<R> UploadService<R>
where
    R: UploadRepository + Send + Sync,
{
    pub fn new(upload_repo: Arc<R>, config: UploadConfig) -> Self {
        log::info!("UploadService initialized, storing chunks under {}", config.upload_dir);
        let storage = ChunkStorage::new(&config.upload_dir);
        Self { upload_repo, storage, config }
    }

    pub fn max_chunk_size(&self) -> usize {
        self.config.max_chunk_size
    }

    /// Looks the upload up and enforces ownership.
    async fn find_owned(
        &self,
        user_id: &Uuid,
        upload_id: &Uuid,
    ) -> Result<UploadEntity, error::SystemError> {
        let upload = self
            .upload_repo
            .find_by_id(upload_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Upload not found"))?;

        if upload.user_id != *user_id {
            log::warn!("User {} tried to access upload {} of {}", user_id, upload_id, upload.user_id);
            return Err(error::SystemError::forbidden("You don't have access to this upload"));
        }

        Ok(upload)
    }

    pub async fn initiate(
        &self,
        user_id: Uuid,
        request: InitiateUploadRequest,
    ) -> Result<UploadEntity, error::SystemError> {
        if request.file_size == 0 {
            return Err(error::SystemError::bad_request("File size must be greater than zero"));
        }

        let file_name = validate_file_name(&request.file_name)?;
        let folder = normalize_folder(request.folder.as_deref())?;
        let file_type = match request.file_type.filter(|t| !t.trim().is_empty()) {
            Some(t) => t,
            None => mime_guess::from_path(&file_name).first_or_octet_stream().to_string(),
        };

        let upload = UploadEntity {
            id: Uuid::new_v4(),
            user_id,
            file_name,
            file_type,
            file_size: request.file_size,
            folder,
            parts: Vec::new(),
            status: UploadStatus::Initiated,
            file_url: None,
            created_at: chrono::Utc::now(),
            completed_at: None,
        };

        self.upload_repo.save(&upload).await?;
        log::info!("Upload {} initiated by {} for {}", upload.id, user_id, upload.file_name);

        Ok(upload)
    }

    pub async fn upload_chunk(
        &self,
        user_id: Uuid,
        chunk: ChunkUpload,
    ) -> Result<ChunkReceipt, error::SystemError> {
        if chunk.chunk_index >= chunk.total_chunks {
            return Err(error::SystemError::bad_request(format!(
                "Chunk index {} is out of range for {} chunks",
                chunk.chunk_index, chunk.total_chunks
            )));
        }

        if chunk.bytes.len() > self.config.max_chunk_size {
            return Err(error::SystemError::bad_request(format!(
                "Chunk size exceeds maximum allowed size of {} bytes",
                self.config.max_chunk_size
            )));
        }

        let upload = self.find_owned(&user_id, &chunk.upload_id).await?;
        if upload.status == UploadStatus::Completed {
            return Err(error::SystemError::bad_request("Upload already completed"));
        }

        let size = self
            .storage
            .write_chunk(&user_id, &upload.id, chunk.chunk_index, &chunk.bytes)
            .await?;

        Ok(ChunkReceipt { upload_id: upload.id, chunk_index: chunk.chunk_index, size })
    }

    /// Checks the reported parts against the chunks on disk. Parts must cover
    /// `0..n` exactly, match the stored sizes when given, and add up to the
    /// announced file size. Returns the parts ordered by index.
    async fn reconcile(
        &self,
        upload: &UploadEntity,
        mut parts: Vec<UploadPart>,
    ) -> Result<Vec<UploadPart>, error::SystemError> {
        parts.sort_by_key(|p| p.index);

        let mut total = 0u64;
        for (expected, part) in parts.iter().enumerate() {
            if part.index as usize != expected {
                return Err(error::SystemError::bad_request(format!(
                    "Parts must be numbered 0..{} without gaps or duplicates",
                    parts.len()
                )));
            }

            let stored = self
                .storage
                .chunk_size(&upload.user_id, &upload.id, part.index)
                .await?
                .ok_or_else(|| {
                    error::SystemError::bad_request(format!("Chunk {} was never uploaded", part.index))
                })?;

            if let Some(reported) = part.size {
                if reported != stored {
                    return Err(error::SystemError::bad_request(format!(
                        "Chunk {} has {} bytes, {} reported",
                        part.index, stored, reported
                    )));
                }
            }
            total += stored;
        }

        if total != upload.file_size {
            return Err(error::SystemError::bad_request(format!(
                "Received {} bytes, {} announced",
                total, upload.file_size
            )));
        }

        Ok(parts)
    }

    /// Completion is claimed in the store first, so concurrent calls for the
    /// same upload cannot assemble twice. The claim is released on failure.
    pub async fn complete(
        &self,
        user_id: Uuid,
        request: CompleteUploadRequest,
    ) -> Result<CompleteUploadResponse, error::SystemError> {
        let mut upload = self.find_owned(&user_id, &request.upload_id).await?;
        if upload.status == UploadStatus::Completed {
            return Err(error::SystemError::bad_request("Upload already completed"));
        }

        if !self.upload_repo.claim_completion(&upload.id).await? {
            log::warn!("Upload {} is already being completed", upload.id);
            return Err(error::SystemError::bad_request("Upload is already being completed"));
        }

        let result = self.finish(&mut upload, request.parts).await;
        if result.is_err() {
            if let Err(e) = self.upload_repo.release_completion(&upload.id).await {
                log::error!("Failed to release completion of upload {}: {:?}", upload.id, e);
            }
        }
        result
    }

    async fn finish(
        &self,
        upload: &mut UploadEntity,
        parts: Vec<UploadPart>,
    ) -> Result<CompleteUploadResponse, error::SystemError> {
        let parts = self.reconcile(upload, parts).await?;

        let stored_name = format!("{}-{}", upload.id, upload.file_name);
        let destination = PathBuf::from(&upload.folder).join(&stored_name);
        let indices: Vec<u32> = parts.iter().map(|p| p.index).collect();
        let target = self.storage.assemble(&upload.user_id, &upload.id, &indices, &destination).await?;

        let file_url = format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            upload.folder,
            stored_name
        );

        upload.parts = parts;
        upload.status = UploadStatus::Completed;
        upload.completed_at = Some(chrono::Utc::now());
        upload.file_url = Some(file_url.clone());

        if let Err(e) = self.upload_repo.save(upload).await {
            if let Err(cleanup) = self.storage.discard_file(&target).await {
                log::warn!("Failed to remove assembled file {}: {:?}", target.display(), cleanup);
            }
            return Err(e);
        }

        if let Err(e) = self.storage.discard_chunks(&upload.user_id, &upload.id).await {
            log::warn!("Failed to remove chunks of upload {}: {:?}", upload.id, e);
        }

        log::info!("Upload {} completed with {} parts", upload.id, upload.parts.len());

        Ok(CompleteUploadResponse { upload_id: upload.id, file_url })
    }

    pub async fn get_status(
        &self,
        user_id: Uuid,
        upload_id: Uuid,
    ) -> Result<UploadStatusResponse, error::SystemError> {
        let upload = self.find_owned(&user_id, &upload_id).await?;
        let received_chunks = self.storage.received_chunks(&user_id, &upload_id).await?;

        Ok(UploadStatusResponse { parts_count: upload.parts.len(), received_chunks, upload })
    }
}
