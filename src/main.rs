mod classifier;
mod config;
mod error;
mod handlers;
mod models;
mod postprocess;
mod predictor;
mod upload;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::predictor::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    info!(version = env!("CARGO_PKG_VERSION"), ?config, "starting freshness");

    let state = web::Data::new(AppState::from_config(&config));
    let addr = config.bind_addr();

    info!("Server running at http://{}:{}", addr.0, addr.1);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(handlers::routes)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
