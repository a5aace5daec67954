//! Database connection pool, migrations and the startup admin seed.
//!
//! This module provides utilities for:
//! - Creating and managing a PostgreSQL connection pool
//! - Running database migrations automatically
//! - Ensuring a bootstrap super admin exists

use sha2::{Digest, Sha256};
use sqlx::{Pool, Postgres};

/// Type alias for PostgreSQL connection pool.
pub type DbPool = Pool<Postgres>;

/// Create a new PostgreSQL connection pool.
///
/// # Arguments
///
/// * `database_url` - PostgreSQL connection string
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns an error if:
/// - Database connection string is invalid
/// - Cannot connect to PostgreSQL server
/// - Database authentication fails
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Run database migrations from the `migrations/` directory.
///
/// Migrations are tracked in the `_sqlx_migrations` table, so each one runs
/// only once.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    // The macro reads migrations at compile time from ./migrations directory
    sqlx::migrate!("./migrations").run(pool).await
}

/// SHA-256 hex digest of a bearer token, as stored in `user_tokens`.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Ensure a super admin with `email` exists and accepts `token`.
///
/// Idempotent: rerunning with the same values changes nothing.
pub async fn seed_super_admin(pool: &DbPool, email: &str, token: &str) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let user_id: uuid::Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO users (email, name, role)
        VALUES ($1, 'Super Admin', 'super_admin')
        ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
        RETURNING id
        "#,
    )
    .bind(email)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO user_tokens (user_id, token_hash)
        VALUES ($1, $2)
        ON CONFLICT (token_hash) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(hash_token(token))
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}
