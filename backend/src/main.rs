mod config;
mod inference;
mod pipeline;
mod routes;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use config::AppConfig;
use inference::ModelLoader;
use pipeline::FreshnessPipeline;
use routes::configure_routes;
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

    let config = AppConfig::load().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!(
        "Model backend {} from {}",
        config.model.backend.name(),
        config.model.path.display()
    );
    let pipeline = web::Data::new(FreshnessPipeline::new(ModelLoader::new(config.model.clone())));

    // Preload so the first upload does not pay for the load. A failure leaves
    // the server up and every prediction answers "model unavailable".
    {
        let pipeline = pipeline.clone();
        let loaded = web::block(move || pipeline.loader().get_classifier().is_ok()).await;
        if !matches!(loaded, Ok(true)) {
            log::warn!("Starting without a classifier");
        }
    }

    let bind_address = config.bind_address();
    let frontend_dir = config.server.frontend_dir.clone();
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
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
            .app_data(pipeline.clone())
            .configure(|cfg| configure_routes(cfg, frontend_dir.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}
