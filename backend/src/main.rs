use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use backend::config::AppConfig;
use backend::registry::SqliteRegistry;
use backend::services;
use backend::state::AppState;
use env_logger::Env;
use log::info;
use std::io;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(io::Error::other)?;
    let registry = SqliteRegistry::open(&config.database_url).map_err(io::Error::other)?;
    let state = AppState::from_config(Arc::new(registry), &config);

    let paths = state.docs.paths();
    paths.ensure_template_dir().map_err(io::Error::other)?;
    paths.ensure_doc_dir().map_err(io::Error::other)?;

    info!(
        "environment {}: templates in {}, documents in {}, registry {}",
        config.app_env,
        paths.template_dir().display(),
        paths.doc_dir().display(),
        config.database_url
    );
    info!("Server running at http://{}:{}", config.host, config.port);

    let json_limit = config.max_upload_bytes;
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(services::configure)
            // After `configure`, so the configured limit replaces the default.
            .app_data(services::json_config(json_limit))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
