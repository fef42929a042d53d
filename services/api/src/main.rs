use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod cloudinary;
mod error;
mod middleware;
mod models;
mod repositories;
mod routes;
mod settings;
mod state;

use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
use tokio::net::TcpListener;

use crate::{
    cloudinary::CloudinaryClient,
    middleware::JwtVerifier,
    repositories::{MIGRATOR, video::VideoRepository},
    settings::Settings,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting video API service");

    let settings = Settings::load().context("Failed to load settings")?;

    // Fail fast when provider credentials are missing
    let credentials = settings
        .cloudinary_credentials()
        .inspect_err(|e| error!("{}", e))?;
    let transcoder = CloudinaryClient::new(
        credentials,
        settings.cloudinary_api_base_url.clone(),
        settings.cloudinary_folder.clone(),
    );

    let identity_verifier = JwtVerifier::from_rsa_pem(&settings.jwt_public_key_pem()?)?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool, &MIGRATOR).await?;

    let app_state = AppState {
        identity_verifier: Arc::new(identity_verifier),
        transcoder: Some(Arc::new(transcoder)),
        video_store: Arc::new(VideoRepository::new(pool.clone())),
        max_upload_bytes: settings.max_upload_bytes,
    };

    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&settings.bind_address).await?;
    info!("Video API service listening on {}", settings.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("Video API service stopped");

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
