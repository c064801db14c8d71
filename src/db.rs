use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    repository::pg_store::PgStore,
    state::AppState,
};

/// Lazily connecting pool, or `None` when no database is configured.
pub fn create_pool(config: &AppConfig) -> Result<Option<PgPool>, AppError> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL is not set; data endpoints will return 503");
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.db_pool_max_connections)
        .min_connections(config.db_pool_min_connections)
        .acquire_timeout(Duration::from_secs(config.db_pool_acquire_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.db_pool_idle_timeout_seconds))
        .connect_lazy(database_url)
        .map_err(|error| {
            tracing::error!(error = %error, "Invalid DATABASE_URL");
            AppError::Internal("Invalid DATABASE_URL.".to_string())
        })?;
    Ok(Some(pool))
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

pub fn db_pool(state: &AppState) -> AppResult<&PgPool> {
    state.db_pool.as_ref().ok_or_else(|| {
        AppError::Dependency("Database is not configured. Set DATABASE_URL.".to_string())
    })
}

/// Opens the per-request transaction every data handler works in.
pub async fn begin_store(state: &AppState) -> AppResult<PgStore> {
    PgStore::begin(db_pool(state)?).await
}
