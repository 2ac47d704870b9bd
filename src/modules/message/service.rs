use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::modules::conversation::repository::ConversationRepository;
use crate::modules::message::model::{InsertMessage, SendMessageRequest};
use crate::modules::message::repository::MessageRepository;
use crate::modules::message::schema::MessageEntity;

#[derive(Clone)]
pub struct MessageService<C, M>
where
    C: ConversationRepository + Send + Sync,
    M: MessageRepository + Send + Sync,
{
    conversation_repo: Arc<C>,
    message_repo: Arc<M>,
}

impl<C, M> MessageService<C, M>
where
    C: ConversationRepository + Send + Sync,
    M: MessageRepository + Send + Sync,
{
    pub fn with_dependencies(conversation_repo: Arc<C>, message_repo: Arc<M>) -> Self {
        log::info!("MessageService initialized with dependencies");
        MessageService { conversation_repo, message_repo }
    }

    /// Thread of a conversation the caller participates in. Unknown conversations
    /// and conversations the caller is not part of are both reported as not found.
    pub async fn get_messages(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<Vec<MessageEntity>, error::SystemError> {
        self.conversation_repo
            .find_for_participant(&conversation_id, &user_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Conversation not found"))?;

        self.message_repo.find_thread_marking_read(&conversation_id, &user_id).await
    }

    pub async fn send_message(
        &self,
        sender_id: Uuid,
        request: SendMessageRequest,
    ) -> Result<MessageEntity, error::SystemError> {
        let content = request.content.as_str();
        if content.trim().is_empty() {
            return Err(error::SystemError::bad_request("Message content cannot be empty"));
        }

        match (request.conversation_id, request.recipient_id) {
            (Some(conversation_id), _) => {
                self.conversation_repo
                    .find_for_participant(&conversation_id, &sender_id)
                    .await?
                    .ok_or_else(|| error::SystemError::not_found("Conversation not found"))?;

                self.message_repo
                    .create(&InsertMessage {
                        conversation_id,
                        sender_id,
                        content: content.to_string(),
                    })
                    .await
            }
            (None, Some(recipient_id)) => {
                if recipient_id == sender_id {
                    return Err(error::SystemError::bad_request(
                        "Cannot send a message to yourself",
                    ));
                }

                match self.conversation_repo.find_between_users(&sender_id, &recipient_id).await? {
                    Some(conversation) => {
                        self.message_repo
                            .create(&InsertMessage {
                                conversation_id: conversation.id,
                                sender_id,
                                content: content.to_string(),
                            })
                            .await
                    }
                    None => self.message_repo.create_direct(&sender_id, &recipient_id, content).await,
                }
            }
            (None, None) => Err(error::SystemError::bad_request(
                "Either conversationId or recipientId is required",
            )),
        }
    }

    pub async fn get_unread_count(&self, user_id: Uuid) -> Result<i64, error::SystemError> {
        self.message_repo.count_unread(&user_id).await
    }
}
