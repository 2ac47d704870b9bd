use actix_cors::Cors;
use actix_web::{
    self, http, App, HttpServer,
    middleware::{from_fn, Logger},
    web,
};
use std::sync::{Arc, LazyLock};

use crate::{
    configs::{connect_database, RedisCache},
    middlewares::authentication,
    modules::{
        conversation::{repository_pg::ConversationRepositoryPg, service::ConversationService},
        message::{repository_pg::MessageRepositoryPg, service::MessageService},
        upload::{
            model::UploadConfig, repository_redis::UploadRedisRepository, service::UploadService,
        },
    },
};

mod api;
mod configs;
mod constants;
#[cfg(test)]
mod fixtures;
mod middlewares;
mod modules;
mod utils;

pub static ENV: LazyLock<constants::Env> = LazyLock::new(|| {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Environment variables loaded from .env file");
    constants::Env::default()
});

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let db_pool = connect_database().await.map_err(|e| {
        log::error!("Database connection error: {e}");
        std::io::Error::other("Database connection error")
    })?;

    let redis_pool = RedisCache::new().await.map_err(|e| {
        log::error!("Redis connection error: {e}");
        std::io::Error::other("Redis connection error")
    })?;

    let conversation_repo = Arc::new(ConversationRepositoryPg::new(db_pool.clone()));
    let message_repo = Arc::new(MessageRepositoryPg::new(db_pool.clone()));
    let upload_repo = Arc::new(UploadRedisRepository::new(redis_pool, ENV.upload_ttl));

    let conversation_service =
        web::Data::new(ConversationService::with_dependencies(conversation_repo.clone()));
    let message_service =
        web::Data::new(MessageService::with_dependencies(conversation_repo, message_repo));
    let upload_service = web::Data::new(UploadService::new(
        upload_repo,
        UploadConfig {
            max_chunk_size: ENV.max_chunk_size,
            upload_dir: ENV.upload_dir.clone(),
            base_url: ENV.upload_base_url.clone(),
        },
    ));

    log::info!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&ENV.frontend_url)
            .allowed_methods(vec!["GET", "POST", "PUT", "OPTIONS"])
            .allowed_headers(vec![http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(conversation_service.clone())
            .app_data(message_service.clone())
            .app_data(upload_service.clone())
            .service(health_check)
            .service(
                web::scope("/api")
                    .wrap(from_fn(authentication))
                    .configure(modules::conversation::route::configure::<ConversationRepositoryPg>)
                    .configure(
                        modules::message::route::configure::<
                            ConversationRepositoryPg,
                            MessageRepositoryPg,
                        >,
                    )
                    .configure(modules::upload::route::configure::<UploadRedisRepository>),
            )
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(2)
    .run()
    .await
}
