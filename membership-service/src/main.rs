//Third-party-dependencies
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{error, info};

use membership_service::config::AppConfig;
use membership_service::routes;
use membership_service::utils::auth_middleware::Authentication;
use membership_service::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().map_err(|e| {
        error!("❌ Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    let state = web::Data::new(AppState::from_config(&config)?);
    info!(
        "Server started at {} ({:?} storage)",
        config.bind_address, config.storage_backend
    );

    let cors_origin = config.cors_origin.clone();
    HttpServer::new(move || {
        let cors = match &cors_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header(),
            None => Cors::permissive(),
        };

        App::new()
            .app_data(state.clone())
            .wrap(Authentication)
            .wrap(cors)
            .wrap(Logger::default())
            .configure(routes::init_routes)
    })
    .bind(&config.bind_address)?
    .run()
    .await
}
