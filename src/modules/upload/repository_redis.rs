use uuid::Uuid;

use crate::{
    api::error,
    configs::RedisCache,
    constants::UPLOAD_KEY_PREFIX,
    modules::upload::{repository::UploadRepository, schema::UploadEntity},
};

/// Upload records expire after `ttl` seconds; every save refreshes the expiry.
#[derive(Clone)]
pub struct UploadRedisRepository {
    cache: RedisCache,
    ttl: u64,
}

impl UploadRedisRepository {
    pub fn new(cache: RedisCache, ttl: u64) -> Self {
        Self { cache, ttl }
    }

    fn key(upload_id: &Uuid) -> String {
        format!("{UPLOAD_KEY_PREFIX}:{upload_id}")
    }

    fn completion_key(upload_id: &Uuid) -> String {
        format!("{UPLOAD_KEY_PREFIX}:{upload_id}:completing")
    }
}

#[async_trait::async_trait]
impl UploadRepository for UploadRedisRepository {
    async fn save(&self, upload: &UploadEntity) -> Result<(), error::SystemError> {
        self.cache.set(&Self::key(&upload.id), upload, self.ttl).await
    }

    async fn find_by_id(
        &self,
        upload_id: &Uuid,
    ) -> Result<Option<UploadEntity>, error::SystemError> {
        self.cache.get::<UploadEntity>(&Self::key(upload_id)).await
    }

    async fn claim_completion(&self, upload_id: &Uuid) -> Result<bool, error::SystemError> {
        self.cache.set_nx(&Self::completion_key(upload_id), &true, self.ttl).await
    }

    async fn release_completion(&self, upload_id: &Uuid) -> Result<(), error::SystemError> {
        self.cache.delete(&Self::completion_key(upload_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced() {
        let id = Uuid::nil();
        assert_eq!(
            UploadRedisRepository::key(&id),
            "upload:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(
            UploadRedisRepository::completion_key(&id),
            "upload:00000000-0000-0000-0000-000000000000:completing"
        );
    }
}
