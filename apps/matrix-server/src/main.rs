//! # Folio Matrix Server
//!
//! Hosts the access gate, the two draft sessions of the authoring console
//! and the public blog/portfolio reads.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;

use config::AppConfig;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env()?;

    tracing::info!(
        "Starting Folio Matrix server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::build(&config)?;

    let status = state.gate.mount().await;
    tracing::info!(?status, "Access gate ready");
    if state.gate.authorized_email().await.is_some() {
        let (posts, projects) = state.console.load_all().await;
        tracing::info!(?posts, ?projects, "Console lists loaded");
    }

    let server_state = state.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(server_state.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    state.console.teardown().await;
    state.gate.teardown();
    tracing::info!("Server stopped");
    Ok(())
}
