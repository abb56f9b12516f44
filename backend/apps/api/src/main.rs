//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod config;

use auth::{Brokers, KakaoBroker, NaverBroker, PgUserRepository, ProviderClient, auth_router};
use axum::{
    Router,
    http::{Method, header},
};
use platform::http_client::build_client;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ServerConfig, auth_config_from_env};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let server = ServerConfig::from_env()?;
    let auth_config = auth_config_from_env()?;
    tracing::debug!(config = ?auth_config, "Auth configuration loaded");

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(auth_config.store_timeout)
        .connect(&server.database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Provider clients share one connection pool
    let http = build_client(auth_config.provider_timeout)?;
    let brokers = Brokers {
        kakao: ProviderClient::Kakao(KakaoBroker::new(http.clone(), auth_config.kakao.clone())),
        naver: ProviderClient::Naver(NaverBroker::new(http, auth_config.naver.clone())),
    };

    let repo = PgUserRepository::new(pool, auth_config.store_timeout);

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(server.frontend_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/api", auth_router(repo, auth_config, brokers))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    tracing::info!("Listening on {}", server.bind_addr);

    let listener = TcpListener::bind(server.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
