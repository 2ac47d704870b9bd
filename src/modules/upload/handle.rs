use std::str::FromStr;

use actix_multipart::Multipart;
use actix_web::{web, HttpRequest};
use futures_util::TryStreamExt;
use uuid::Uuid;

use crate::api::success::Success;
use crate::api::{error, success};
use crate::middlewares::get_claims;
use crate::modules::upload::{
    model::{
        ChunkReceipt, ChunkUpload, CompleteUploadRequest, CompleteUploadResponse,
        InitiateUploadRequest, InitiateUploadResponse, UploadStatusResponse,
    },
    repository::UploadRepository,
    service::UploadService,
};
use crate::utils::ValidatedJson;

const TEXT_FIELD_LIMIT: usize = 64;

fn parse_field<T: FromStr>(name: &str, data: &[u8]) -> Result<T, error::Error> {
    std::str::from_utf8(data)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| error::Error::bad_request(format!("Invalid field '{name}'")))
}

fn missing(name: &str) -> error::Error {
    error::Error::bad_request(format!("Missing field '{name}'"))
}

/// Reads `uploadId`, `chunkIndex`, `totalChunks` and the binary `chunk` field.
async fn read_chunk_form(
    mut payload: Multipart,
    max_chunk_size: usize,
) -> Result<ChunkUpload, error::Error> {
    let mut upload_id = None;
    let mut chunk_index = None;
    let mut total_chunks = None;
    let mut bytes = None;

    while let Some(mut field) =
        payload.try_next().await.map_err(|e| error::Error::bad_request(e.to_string()))?
    {
        let name = field.name().map(str::to_owned).unwrap_or_default();
        let limit = if name == "chunk" { max_chunk_size } else { TEXT_FIELD_LIMIT };

        let mut data = Vec::new();
        while let Some(part) =
            field.try_next().await.map_err(|e| error::Error::bad_request(e.to_string()))?
        {
            if data.len() + part.len() > limit {
                return Err(error::Error::bad_request(format!("Field '{name}' is too large")));
            }
            data.extend_from_slice(&part);
        }

        match name.as_str() {
            "uploadId" => upload_id = Some(parse_field::<Uuid>(&name, &data)?),
            "chunkIndex" => chunk_index = Some(parse_field::<u32>(&name, &data)?),
            "totalChunks" => total_chunks = Some(parse_field::<u32>(&name, &data)?),
            "chunk" => bytes = Some(data),
            _ => {}
        }
    }

    Ok(ChunkUpload {
        upload_id: upload_id.ok_or_else(|| missing("uploadId"))?,
        chunk_index: chunk_index.ok_or_else(|| missing("chunkIndex"))?,
        total_chunks: total_chunks.ok_or_else(|| missing("totalChunks"))?,
        bytes: bytes.ok_or_else(|| missing("chunk"))?,
    })
}

pub async fn initiate_upload<R>(
    service: web::Data<UploadService<R>>,
    body: ValidatedJson<InitiateUploadRequest>,
    req: HttpRequest,
) -> Result<success::Success<InitiateUploadResponse>, error::Error>
where
    R: UploadRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;

    let upload = service.initiate(user_id, body.0).await?;

    Ok(Success::created(Some(InitiateUploadResponse { upload_id: upload.id }))
        .message("Upload initiated"))
}

pub async fn upload_chunk<R>(
    payload: Multipart,
    service: web::Data<UploadService<R>>,
    req: HttpRequest,
) -> Result<success::Success<ChunkReceipt>, error::Error>
where
    R: UploadRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;

    let chunk = read_chunk_form(payload, service.max_chunk_size()).await?;
    let receipt = service.upload_chunk(user_id, chunk).await?;

    Ok(Success::ok(Some(receipt)).message("Chunk stored"))
}

pub async fn complete_upload<R>(
    service: web::Data<UploadService<R>>,
    body: ValidatedJson<CompleteUploadRequest>,
    req: HttpRequest,
) -> Result<success::Success<CompleteUploadResponse>, error::Error>
where
    R: UploadRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;

    let result = service.complete(user_id, body.0).await?;

    Ok(Success::ok(Some(result)).message("Upload completed"))
}

pub async fn get_upload_status<R>(
    upload_id: web::Path<Uuid>,
    service: web::Data<UploadService<R>>,
    req: HttpRequest,
) -> Result<success::Success<UploadStatusResponse>, error::Error>
where
    R: UploadRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;

    let status = service.get_status(user_id, upload_id.into_inner()).await?;

    Ok(Success::ok(Some(status)))
}
