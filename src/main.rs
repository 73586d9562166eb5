use anyhow::Context;
use axum::Router;
use dotenvy::dotenv;
use log::info;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use ticketserver::config::AppConfig;
use ticketserver::shared::state::AppState;
use ticketserver::shared::utils::create_conn;
use ticketserver::{masters, tickets};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env()?;
    let pool = create_conn(&config.database_url).context("failed to create database pool")?;
    let state = Arc::new(AppState {
        config: config.clone(),
        conn: pool,
    });

    let app = Router::new()
        .merge(tickets::configure_ticket_routes())
        .merge(masters::configure_masters_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("ticketserver listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
