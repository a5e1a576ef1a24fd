// src/main.rs
mod routes;
mod handlers;
mod models;
mod config;
mod database;
mod middleware;
mod state;
mod dtos;
mod error;
mod auth;
mod pagination;
mod reference;
mod stock;

use axum::{routing::get, Router};
use tracing_subscriber::fmt::init as tracing_init;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use dotenvy::dotenv;
use std::net::SocketAddr;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_init();

    // Load environment variables
    dotenv().ok();

    let config = config::Config::from_env();

    // Create database pool and bring the schema up to date
    let db_pool = database::create_pool(&config.database_url, config.max_connections)
        .await
        .expect("Failed to create database pool");
    database::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    // Create application state
    let app_state = state::AppState::new(db_pool, config.upload_dir.clone());

    // Business routes live under /api; uploaded files are served statically
    let app = Router::new()
        .nest("/api", routes::create_router())
        .route("/", get(|| async { "TradePoint API" }))
        .route("/health", get(health_check))
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Try base_port..base_port+20 to avoid crash when address is in use
    let listener = {
        let mut bound = None;
        for offset in 0u16..=20 {
            let port = config.port.saturating_add(offset);
            let addr = SocketAddr::from((config.host, port));
            match TcpListener::bind(addr).await {
                Ok(l) => { bound = Some((l, addr)); break; }
                Err(e) => {
                    if offset == 0 { tracing::warn!(%addr, error=%e, "Port in use, trying next"); }
                }
            }
        }
        match bound {
            Some((l, addr)) => {
                tracing::info!("Server running on {}", addr);
                l
            }
            None => {
                tracing::error!("Failed to bind to any port starting at {} on {}", config.port, config.host);
                return;
            }
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error=%e, "Server error");
    }
}

async fn health_check() -> &'static str {
    "OK"
}
