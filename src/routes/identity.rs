use axum::{extract::State, http::HeaderMap, Json};

use crate::{
    auth::require_user_id,
    db::db_pool,
    error::{AppError, AppResult},
    models::AppUser,
    repository::users::find_user_by_id,
    state::AppState,
};

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<AppUser>> {
    let user_id = require_user_id(&state, &headers).await?;
    let pool = db_pool(&state)?;
    let user = find_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;
    Ok(Json(user))
}
