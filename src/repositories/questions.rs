use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Question;
use crate::db::types::QuestionType;

pub(crate) const COLUMNS: &str = "\
    id, title, description, question_type, marks, options, correct_answer, \
    test_cases, created_by, created_at, updated_at";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) question_type: QuestionType,
    pub(crate) marks: i32,
    pub(crate) options: Option<serde_json::Value>,
    pub(crate) correct_answer: Option<&'a str>,
    pub(crate) test_cases: Option<serde_json::Value>,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Full-row update. The handler merges the patch into the loaded row first,
/// so a type change always lands with a consistent payload.
pub(crate) struct ReplaceQuestion<'a> {
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) question_type: QuestionType,
    pub(crate) marks: i32,
    pub(crate) options: Option<serde_json::Value>,
    pub(crate) correct_answer: Option<&'a str>,
    pub(crate) test_cases: Option<serde_json::Value>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions \
         (id, title, description, question_type, marks, options, correct_answer, \
          test_cases, created_by, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.question_type)
    .bind(params.marks)
    .bind(params.options)
    .bind(params.correct_answer)
    .bind(params.test_cases)
    .bind(params.created_by)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn fetch_by_ids(
    pool: &PgPool,
    ids: &[String],
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    question_type: Option<QuestionType>,
    skip: i64,
    limit: i64,
) -> Result<Vec<Question>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM questions WHERE 1 = 1"));

    if let Some(question_type) = question_type {
        builder.push(" AND question_type = ");
        builder.push_bind(question_type);
    }

    builder.push(" ORDER BY created_at DESC OFFSET ");
    builder.push_bind(skip);
    builder.push(" LIMIT ");
    builder.push_bind(limit);

    builder.build_query_as::<Question>().fetch_all(pool).await
}

pub(crate) async fn count(
    pool: &PgPool,
    question_type: Option<QuestionType>,
) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM questions WHERE 1 = 1");

    if let Some(question_type) = question_type {
        builder.push(" AND question_type = ");
        builder.push_bind(question_type);
    }

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub(crate) async fn replace(
    pool: &PgPool,
    id: &str,
    params: ReplaceQuestion<'_>,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "UPDATE questions SET title = $2, description = $3, question_type = $4, marks = $5, \
         options = $6, correct_answer = $7, test_cases = $8, updated_at = $9 \
         WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.question_type)
    .bind(params.marks)
    .bind(params.options)
    .bind(params.correct_answer)
    .bind(params.test_cases)
    .bind(params.updated_at)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
