use actix_web::web;

use crate::modules::upload::{handle::*, repository::UploadRepository};

pub fn configure<R>(cfg: &mut web::ServiceConfig)
where
    R: UploadRepository + Send + Sync + 'static,
{
    cfg.service(
        web::scope("/uploads")
            .service(web::resource("/initiate").route(web::post().to(initiate_upload::<R>)))
            .service(web::resource("/chunk").route(web::post().to(upload_chunk::<R>)))
            .service(web::resource("/complete").route(web::put().to(complete_upload::<R>)))
            .service(web::resource("/{upload_id}").route(web::get().to(get_upload_status::<R>))),
    );
}
