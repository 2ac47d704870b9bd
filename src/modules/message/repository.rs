use uuid::Uuid;

use crate::modules::message::model::InsertMessage;
use crate::{api::error, modules::message::schema::MessageEntity};

#[async_trait::async_trait]
pub trait MessageRepository {
    /// Appends to an existing conversation and moves its `last_message_at`.
    async fn create(&self, message: &InsertMessage) -> Result<MessageEntity, error::SystemError>;

    /// Appends to the conversation shared by both users, creating it with exactly
    /// these two participants when none exists yet.
    async fn create_direct(
        &self,
        sender_id: &Uuid,
        recipient_id: &Uuid,
        content: &str,
    ) -> Result<MessageEntity, error::SystemError>;

    /// Marks messages from other senders as read by `reader_id`, then returns the
    /// whole thread oldest first.
    async fn find_thread_marking_read(
        &self,
        conversation_id: &Uuid,
        reader_id: &Uuid,
    ) -> Result<Vec<MessageEntity>, error::SystemError>;

    async fn count_unread(&self, user_id: &Uuid) -> Result<i64, error::SystemError>;
}
