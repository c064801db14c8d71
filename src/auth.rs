use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::{
    db::db_pool,
    error::{AppError, AppResult},
    repository::users::find_user_by_email,
    state::AppState,
};

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    email: Option<String>,
}

impl Claims {
    /// Tokens carry the login email either as `email` or as the subject.
    fn login_email(&self) -> Option<String> {
        self.email
            .as_deref()
            .or(Some(self.sub.as_str()))
            .map(str::trim)
            .filter(|value| value.contains('@'))
            .map(str::to_lowercase)
    }
}

/// Resolves the calling user's id from the request headers.
pub async fn require_user_id(state: &AppState, headers: &HeaderMap) -> AppResult<i64> {
    if state.config.auth_dev_overrides_enabled() {
        if let Some(user_id) = dev_override_user_id(headers)? {
            return Ok(user_id);
        }
    }

    let token = bearer_token(headers)
        .ok_or_else(|| AppError::Unauthorized("Unauthorized: missing bearer token.".to_string()))?;
    let email = verify_token(state, token)?;

    if let Some(user_id) = state.user_cache.get(&email).await {
        return Ok(user_id);
    }

    let pool = db_pool(state)?;
    let user = find_user_by_email(pool, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;
    state.user_cache.insert(email, user.id).await;
    Ok(user.id)
}

fn dev_override_user_id(headers: &HeaderMap) -> AppResult<Option<i64>> {
    let Some(raw) = headers.get("x-user-id") else {
        return Ok(None);
    };
    raw.to_str()
        .ok()
        .and_then(|value| value.trim().parse::<i64>().ok())
        .map(Some)
        .ok_or_else(|| AppError::Unauthorized("Unauthorized: invalid x-user-id header.".to_string()))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn verify_token(state: &AppState, token: &str) -> AppResult<String> {
    let secret = state.config.jwt_secret.as_deref().ok_or_else(|| {
        AppError::Dependency("Authentication is not configured. Set JWT_SECRET.".to_string())
    })?;

    let mut validation = Validation::new(Algorithm::HS256);
    if let Some(issuer) = state.config.jwt_issuer.as_deref() {
        validation.set_issuer(&[issuer]);
    }

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|error| {
            tracing::debug!(error = %error, "Rejected bearer token");
            AppError::Unauthorized("Unauthorized: invalid or expired token.".to_string())
        })?;

    data.claims.login_email().ok_or_else(|| {
        AppError::Unauthorized("Unauthorized: token does not identify a user.".to_string())
    })
}
