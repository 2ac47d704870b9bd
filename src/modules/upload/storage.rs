use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::api::error;

/// Local disk layout:
/// `{root}/chunks/{user_id}/{upload_id}/{index}.part` while uploading,
/// `{root}/files/{destination}` once assembled.
#[derive(Debug, Clone)]
pub struct ChunkStorage {
    root: PathBuf,
}

impl ChunkStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn chunk_dir(&self, user_id: &Uuid, upload_id: &Uuid) -> PathBuf {
        self.root.join("chunks").join(user_id.to_string()).join(upload_id.to_string())
    }

    pub fn chunk_path(&self, user_id: &Uuid, upload_id: &Uuid, index: u32) -> PathBuf {
        self.chunk_dir(user_id, upload_id).join(format!("{index}.part"))
    }

    /// Writes the chunk, replacing anything previously stored under the same index.
    pub async fn write_chunk(
        &self,
        user_id: &Uuid,
        upload_id: &Uuid,
        index: u32,
        bytes: &[u8],
    ) -> Result<u64, error::SystemError> {
        tokio::fs::create_dir_all(self.chunk_dir(user_id, upload_id)).await?;
        tokio::fs::write(self.chunk_path(user_id, upload_id, index), bytes).await?;
        Ok(bytes.len() as u64)
    }

    pub async fn chunk_size(
        &self,
        user_id: &Uuid,
        upload_id: &Uuid,
        index: u32,
    ) -> Result<Option<u64>, error::SystemError> {
        match tokio::fs::metadata(self.chunk_path(user_id, upload_id, index)).await {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn received_chunks(
        &self,
        user_id: &Uuid,
        upload_id: &Uuid,
    ) -> Result<usize, error::SystemError> {
        let mut entries = match tokio::fs::read_dir(self.chunk_dir(user_id, upload_id)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut count = 0;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().ends_with(".part") {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn concatenate(
        &self,
        user_id: &Uuid,
        upload_id: &Uuid,
        indices: &[u32],
        target: &Path,
    ) -> Result<(), error::SystemError> {
        let mut out = tokio::fs::File::create(target).await?;
        for index in indices {
            let mut chunk = tokio::fs::File::open(self.chunk_path(user_id, upload_id, *index)).await?;
            tokio::io::copy(&mut chunk, &mut out).await?;
        }
        out.flush().await?;
        Ok(())
    }

    /// Concatenates the chunks in the given order into `files/{destination}`.
    /// The file is written next to its target as `.partial` and renamed into
    /// place, so the target is either absent or complete. Chunks are kept.
    pub async fn assemble(
        &self,
        user_id: &Uuid,
        upload_id: &Uuid,
        indices: &[u32],
        destination: &Path,
    ) -> Result<PathBuf, error::SystemError> {
        let target = self.root.join("files").join(destination);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut partial = target.clone().into_os_string();
        partial.push(".partial");
        let partial = PathBuf::from(partial);

        if let Err(e) = self.concatenate(user_id, upload_id, indices, &partial).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }
        tokio::fs::rename(&partial, &target).await?;

        Ok(target)
    }

    pub async fn discard_chunks(
        &self,
        user_id: &Uuid,
        upload_id: &Uuid,
    ) -> Result<(), error::SystemError> {
        match tokio::fs::remove_dir_all(self.chunk_dir(user_id, upload_id)).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    pub async fn discard_file(&self, path: &Path) -> Result<(), error::SystemError> {
        match tokio::fs::remove_file(path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
