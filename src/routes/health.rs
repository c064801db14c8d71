use std::time::Duration;

use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let db_ok = match &state.db_pool {
        Some(pool) => {
            match tokio::time::timeout(
                Duration::from_secs(3),
                sqlx::query("SELECT 1").fetch_one(pool),
            )
            .await
            {
                Ok(Ok(_)) => true,
                Ok(Err(error)) => {
                    tracing::error!(error = %error, "Health check DB query failed");
                    false
                }
                Err(_) => {
                    tracing::error!("Health check DB query timed out (3s)");
                    false
                }
            }
        }
        // No database configured, nothing to check.
        None => true,
    };

    let status = if db_ok { "ok" } else { "degraded" };
    Json(json!({
        "status": status,
        "now": Utc::now().to_rfc3339(),
        "today": state.today().to_string(),
        "timezone": state.config.timezone.name(),
        "db": db_ok
    }))
}
