use actix_web::web;

use crate::modules::conversation::{handle::get_conversations, repository::ConversationRepository};

pub fn configure<R>(cfg: &mut web::ServiceConfig)
where
    R: ConversationRepository + Send + Sync + 'static,
{
    cfg.service(
        web::scope("/conversations")
            .service(web::resource("").route(web::get().to(get_conversations::<R>))),
    );
}
