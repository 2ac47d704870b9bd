use actix_web::{web, HttpRequest};

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        conversation::repository::ConversationRepository,
        message::{
            model::{MessageQueryRequest, SendMessageRequest, UnreadCountResponse},
            repository::MessageRepository,
            schema::MessageEntity,
            service::MessageService,
        },
    },
    utils::{ValidatedJson, ValidatedQuery},
};

pub async fn get_messages<C, M>(
    message_svc: web::Data<MessageService<C, M>>,
    query: ValidatedQuery<MessageQueryRequest>,
    req: HttpRequest,
) -> Result<success::Success<Vec<MessageEntity>>, error::Error>
where
    C: ConversationRepository + Send + Sync + 'static,
    M: MessageRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;

    let messages = message_svc.get_messages(user_id, query.0.conversation_id).await?;

    Ok(success::Success::ok(Some(messages)).message("Successfully retrieved messages"))
}

pub async fn send_message<C, M>(
    message_svc: web::Data<MessageService<C, M>>,
    body: ValidatedJson<SendMessageRequest>,
    req: HttpRequest,
) -> Result<success::Success<MessageEntity>, error::Error>
where
    C: ConversationRepository + Send + Sync + 'static,
    M: MessageRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;

    let message = message_svc.send_message(user_id, body.0).await?;

    Ok(success::Success::created(Some(message)).message("Message sent successfully"))
}

pub async fn get_unread_count<C, M>(
    message_svc: web::Data<MessageService<C, M>>,
    req: HttpRequest,
) -> Result<success::Success<UnreadCountResponse>, error::Error>
where
    C: ConversationRepository + Send + Sync + 'static,
    M: MessageRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;

    let count = message_svc.get_unread_count(user_id).await?;

    Ok(success::Success::ok(Some(UnreadCountResponse { count })))
}
