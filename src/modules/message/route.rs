use actix_web::web;

use crate::modules::{
    conversation::repository::ConversationRepository,
    message::{handle::*, repository::MessageRepository},
};

pub fn configure<C, M>(cfg: &mut web::ServiceConfig)
where
    C: ConversationRepository + Send + Sync + 'static,
    M: MessageRepository + Send + Sync + 'static,
{
    cfg.service(
        web::scope("/messages")
            .service(web::resource("/unread").route(web::get().to(get_unread_count::<C, M>)))
            .service(
                web::resource("")
                    .route(web::get().to(get_messages::<C, M>))
                    .route(web::post().to(send_message::<C, M>)),
            ),
    );
}
