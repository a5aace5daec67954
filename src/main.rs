//! Estate Access Service - Main Application Entry Point
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries, row locks)
//! - **Authentication**: Bearer token with SHA-256 hashing
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Seed the bootstrap super admin, if configured
//! 5. Build HTTP router and start serving

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use estate_access_server::{config::Config, db, router::build_router, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info")
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    let estate_offset = config.estate_offset().with_context(|| {
        format!(
            "ESTATE_UTC_OFFSET_MINUTES={} is outside +/-14h",
            config.estate_utc_offset_minutes
        )
    })?;
    tracing::info!(offset = %estate_offset, "Configuration loaded");

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    if let Some((email, token)) = config.seed_admin() {
        db::seed_super_admin(&pool, email, token).await?;
        tracing::info!(email, "Super admin seeded");
    }

    let app = build_router(AppState {
        pool,
        estate_offset,
        log_default_limit: config.access_log_default_limit,
    });

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
