use std::{sync::Arc, time::Duration};

use chrono::{NaiveDate, Utc};
use moka::future::Cache;
use sqlx::PgPool;

use crate::{config::AppConfig, db::create_pool, error::AppError};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db_pool: Option<PgPool>,
    /// Lower-cased email to resolved user id.
    pub user_cache: Cache<String, i64>,
}

impl AppState {
    pub fn build(config: AppConfig) -> Result<Self, AppError> {
        let db_pool = create_pool(&config)?;
        let user_cache = Cache::builder()
            .max_capacity(config.user_cache_max_entries)
            .time_to_live(Duration::from_secs(config.user_cache_ttl_seconds.max(1)))
            .build();

        Ok(Self {
            config: Arc::new(config),
            db_pool,
            user_cache,
        })
    }

    /// The calendar date in the configured timezone. Read once per request
    /// and passed down explicitly.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.config.timezone).date_naive()
    }
}

#[cfg(test)]
impl AppState {
    pub fn for_tests() -> Self {
        Self::build(AppConfig::for_tests()).expect("test state")
    }
}
