use uuid::Uuid;

use crate::{api::error, modules::upload::schema::UploadEntity};

#[async_trait::async_trait]
pub trait UploadRepository {
    async fn save(&self, upload: &UploadEntity) -> Result<(), error::SystemError>;

    async fn find_by_id(&self, upload_id: &Uuid)
    -> Result<Option<UploadEntity>, error::SystemError>;

    /// Takes the exclusive right to complete the upload. Returns false when
    /// another completion already holds it.
    async fn claim_completion(&self, upload_id: &Uuid) -> Result<bool, error::SystemError>;

    async fn release_completion(&self, upload_id: &Uuid) -> Result<(), error::SystemError>;
}
