use actix_web::{web, HttpRequest};

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::conversation::{
        model::ConversationSummary, repository::ConversationRepository,
        service::ConversationService,
    },
};

pub async fn get_conversations<R>(
    conversation_svc: web::Data<ConversationService<R>>,
    req: HttpRequest,
) -> Result<success::Success<Vec<ConversationSummary>>, error::Error>
where
    R: ConversationRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;

    let conversations = conversation_svc.get_by_user_id(user_id).await?;

    Ok(success::Success::ok(Some(conversations)).message("Successfully retrieved conversations"))
}
