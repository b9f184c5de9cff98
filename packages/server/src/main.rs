//! Article draft generator server.

mod app;
mod config;
mod error;
mod routes;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,drafting=debug,sqlx=warn,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting article draft generator");

    let config = ServerConfig::from_env().context("Failed to load configuration")?;
    let port = config.port;

    let app = app::build_app(config)
        .await
        .context("Failed to build application")?;

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind address")?;

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
