mod config;
mod error;
mod inference;
mod routes;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use config::Settings;
use inference::model::ModelCell;
use routes::{AppState, configure_routes};
use std::env;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let settings = Settings::load().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::other(e.to_string())
    })?;
    log::info!("Configuration: {:?}", settings);

    let model = ModelCell::new(settings.model_path.clone());
    match model.get_or_load() {
        Ok(gateway) => log::info!("Model ready: {}", gateway.source().display()),
        Err(e) if settings.require_model => {
            log::error!("Failed to load model at startup: {}", e);
            return Err(std::io::Error::other(format!("Model loading failed: {}", e)));
        }
        Err(e) => {
            log::error!(
                "Failed to load model at startup: {}. Uploads will be refused until restart.",
                e
            );
        }
    }

    let bind_address = settings.bind_address();
    let frontend_dir = settings.frontend_dir.display().to_string();
    let state = web::Data::new(AppState::new(model, settings));

    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(state.clone())
            .configure(|cfg| configure_routes(cfg, frontend_dir.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}
