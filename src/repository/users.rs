use sqlx::{PgExecutor, Row};

use crate::{
    error::{map_db_error, AppResult},
    models::AppUser,
};

pub async fn find_user_by_id<'e, E>(executor: E, user_id: i64) -> AppResult<Option<AppUser>>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query("SELECT id, email, name FROM app_users WHERE id = $1 LIMIT 1")
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(map_db_error)?;

    row.map(|row| read_user(&row)).transpose()
}

pub async fn find_user_by_email<'e, E>(executor: E, email: &str) -> AppResult<Option<AppUser>>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query(
        "SELECT id, email, name FROM app_users WHERE lower(email) = lower($1) LIMIT 1",
    )
    .bind(email.trim())
    .fetch_optional(executor)
    .await
    .map_err(map_db_error)?;

    row.map(|row| read_user(&row)).transpose()
}

fn read_user(row: &sqlx::postgres::PgRow) -> AppResult<AppUser> {
    Ok(AppUser {
        id: row.try_get("id").map_err(map_db_error)?,
        email: row.try_get("email").map_err(map_db_error)?,
        name: row.try_get("name").map_err(map_db_error)?,
    })
}
