use sqlx::PgPool;

use crate::db::models::Session;

pub(crate) const COLUMNS: &str = "id, token, user_id, expires_at, created_at";

pub(crate) struct CreateSession<'a> {
    pub(crate) id: &'a str,
    pub(crate) token: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) expires_at: time::PrimitiveDateTime,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateSession<'_>,
) -> Result<Session, sqlx::Error> {
    sqlx::query_as::<_, Session>(&format!(
        "INSERT INTO sessions (id, token, user_id, expires_at, created_at) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.token)
    .bind(params.user_id)
    .bind(params.expires_at)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_token(
    pool: &PgPool,
    token: &str,
) -> Result<Option<Session>, sqlx::Error> {
    sqlx::query_as::<_, Session>(&format!("SELECT {COLUMNS} FROM sessions WHERE token = $1"))
        .bind(token)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn delete_expired(
    pool: &PgPool,
    now: time::PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
