use uuid::Uuid;

use crate::{
    api::error,
    modules::conversation::{model::ConversationSummary, schema::ConversationEntity},
};

#[async_trait::async_trait]
pub trait ConversationRepository {
    /// Returns the conversation only when `user_id` is one of its participants.
    async fn find_for_participant(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError>;

    /// Any conversation that has both users as participants.
    async fn find_between_users(
        &self,
        user_a: &Uuid,
        user_b: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError>;

    async fn find_summaries_by_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ConversationSummary>, error::SystemError>;
}
