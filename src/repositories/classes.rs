use sqlx::{FromRow, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::Class;

pub(crate) const COLUMNS: &str = "id, name, teacher_id, created_at, updated_at";

pub(crate) struct CreateClass<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) teacher_id: Option<&'a str>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Class with the display fields the management screens need.
#[derive(Debug, FromRow)]
pub(crate) struct ClassSummaryRow {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) teacher_name: Option<String>,
    pub(crate) student_count: i64,
    pub(crate) test_count: i64,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

const SUMMARY_SELECT: &str = "\
    SELECT c.id, c.name, c.teacher_id, u.name AS teacher_name, \
           (SELECT COUNT(*) FROM class_students cs WHERE cs.class_id = c.id) AS student_count, \
           (SELECT COUNT(*) FROM tests t WHERE t.class_id = c.id) AS test_count, \
           c.created_at, c.updated_at \
    FROM classes c \
    LEFT JOIN users u ON u.id = c.teacher_id";

pub(crate) async fn create(pool: &PgPool, params: CreateClass<'_>) -> Result<Class, sqlx::Error> {
    sqlx::query_as::<_, Class>(&format!(
        "INSERT INTO classes (id, name, teacher_id, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.teacher_id)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>(&format!("SELECT {COLUMNS} FROM classes WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_summary_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<ClassSummaryRow>, sqlx::Error> {
    sqlx::query_as::<_, ClassSummaryRow>(&format!("{SUMMARY_SELECT} WHERE c.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_summaries(
    pool: &PgPool,
    teacher_id: Option<&str>,
) -> Result<Vec<ClassSummaryRow>, sqlx::Error> {
    match teacher_id {
        Some(teacher_id) => {
            sqlx::query_as::<_, ClassSummaryRow>(&format!(
                "{SUMMARY_SELECT} WHERE c.teacher_id = $1 ORDER BY c.name ASC"
            ))
            .bind(teacher_id)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, ClassSummaryRow>(&format!("{SUMMARY_SELECT} ORDER BY c.name ASC"))
                .fetch_all(pool)
                .await
        }
    }
}

pub(crate) async fn rename(
    pool: &PgPool,
    id: &str,
    name: &str,
    updated_at: PrimitiveDateTime,
) -> Result<Option<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>(&format!(
        "UPDATE classes SET name = $2, updated_at = $3 WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(name)
    .bind(updated_at)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn set_teacher(
    pool: &PgPool,
    id: &str,
    teacher_id: Option<&str>,
    updated_at: PrimitiveDateTime,
) -> Result<Option<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>(&format!(
        "UPDATE classes SET teacher_id = $2, updated_at = $3 WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(teacher_id)
    .bind(updated_at)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM classes WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
