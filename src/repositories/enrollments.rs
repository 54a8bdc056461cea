use sqlx::{FromRow, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::Enrollment;

pub(crate) const COLUMNS: &str = "id, class_id, student_id, registration_number, created_at";

pub(crate) struct CreateEnrollment<'a> {
    pub(crate) id: &'a str,
    pub(crate) class_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) registration_number: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

/// Enrollment joined with the student account for roster listings.
#[derive(Debug, FromRow)]
pub(crate) struct RosterRow {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) student_email: String,
    pub(crate) registration_number: String,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateEnrollment<'_>,
) -> Result<Enrollment, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "INSERT INTO class_students (id, class_id, student_id, registration_number, created_at) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.class_id)
    .bind(params.student_id)
    .bind(params.registration_number)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn exists(
    executor: impl sqlx::PgExecutor<'_>,
    class_id: &str,
    student_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM class_students WHERE class_id = $1 AND student_id = $2)",
    )
    .bind(class_id)
    .bind(student_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_class(
    pool: &PgPool,
    class_id: &str,
) -> Result<Vec<RosterRow>, sqlx::Error> {
    sqlx::query_as::<_, RosterRow>(
        "SELECT cs.id, cs.student_id, u.name AS student_name, u.email AS student_email, \
                cs.registration_number, cs.created_at \
         FROM class_students cs \
         JOIN users u ON u.id = cs.student_id \
         WHERE cs.class_id = $1 \
         ORDER BY cs.registration_number ASC, u.name ASC",
    )
    .bind(class_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn delete(
    pool: &PgPool,
    class_id: &str,
    student_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM class_students WHERE class_id = $1 AND student_id = $2")
        .bind(class_id)
        .bind(student_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
