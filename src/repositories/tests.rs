use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::{Question, Test};
use crate::db::types::QuestionType;

pub(crate) const COLUMNS: &str =
    "id, title, test_type, class_id, scheduled_at, duration_minutes, created_by, created_at";

pub(crate) struct CreateTest<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) test_type: QuestionType,
    pub(crate) class_id: &'a str,
    pub(crate) scheduled_at: Option<PrimitiveDateTime>,
    pub(crate) duration_minutes: i32,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) struct TestQuestionLink<'a> {
    pub(crate) id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) question_order: i32,
}

pub(crate) struct UpdateTest<'a> {
    pub(crate) title: Option<&'a str>,
    pub(crate) scheduled_at: Option<PrimitiveDateTime>,
    pub(crate) clear_schedule: bool,
    pub(crate) duration_minutes: Option<i32>,
}

/// Test with the joined display fields for management listings.
#[derive(Debug, FromRow)]
pub(crate) struct TestSummaryRow {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) test_type: QuestionType,
    pub(crate) class_id: String,
    pub(crate) class_name: String,
    pub(crate) scheduled_at: Option<PrimitiveDateTime>,
    pub(crate) duration_minutes: i32,
    pub(crate) created_by: String,
    pub(crate) creator_name: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) question_count: i64,
    pub(crate) total_marks: i64,
}

/// One row of a student's test catalog. `has_submission` drives the
/// availability status; the ordering puts unscheduled tests first.
#[derive(Debug, FromRow)]
pub(crate) struct CatalogRow {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) test_type: QuestionType,
    pub(crate) class_name: String,
    pub(crate) scheduled_at: Option<PrimitiveDateTime>,
    pub(crate) duration_minutes: i32,
    pub(crate) creator_name: Option<String>,
    pub(crate) has_submission: bool,
}

const SUMMARY_SELECT: &str = "\
    SELECT t.id, t.title, t.test_type, t.class_id, c.name AS class_name, \
           t.scheduled_at, t.duration_minutes, t.created_by, u.name AS creator_name, \
           t.created_at, \
           (SELECT COUNT(*) FROM test_questions tq WHERE tq.test_id = t.id) AS question_count, \
           (SELECT COALESCE(SUM(q.marks), 0) FROM test_questions tq \
             JOIN questions q ON q.id = tq.question_id WHERE tq.test_id = t.id) AS total_marks \
    FROM tests t \
    JOIN classes c ON c.id = t.class_id \
    LEFT JOIN users u ON u.id = t.created_by";

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateTest<'_>,
    links: &[TestQuestionLink<'_>],
) -> Result<Test, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let test = sqlx::query_as::<_, Test>(&format!(
        "INSERT INTO tests \
         (id, title, test_type, class_id, scheduled_at, duration_minutes, created_by, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.test_type)
    .bind(params.class_id)
    .bind(params.scheduled_at)
    .bind(params.duration_minutes)
    .bind(params.created_by)
    .bind(params.created_at)
    .fetch_one(&mut *tx)
    .await?;

    for link in links {
        sqlx::query(
            "INSERT INTO test_questions (id, test_id, question_id, question_order) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(link.id)
        .bind(params.id)
        .bind(link.question_id)
        .bind(link.question_order)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(test)
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Test>, sqlx::Error> {
    sqlx::query_as::<_, Test>(&format!("SELECT {COLUMNS} FROM tests WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_summary_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<TestSummaryRow>, sqlx::Error> {
    sqlx::query_as::<_, TestSummaryRow>(&format!("{SUMMARY_SELECT} WHERE t.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_summaries(
    pool: &PgPool,
    created_by: Option<&str>,
    skip: i64,
    limit: i64,
) -> Result<Vec<TestSummaryRow>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("{SUMMARY_SELECT} WHERE 1 = 1"));

    if let Some(created_by) = created_by {
        builder.push(" AND t.created_by = ");
        builder.push_bind(created_by);
    }

    builder.push(" ORDER BY t.created_at DESC OFFSET ");
    builder.push_bind(skip);
    builder.push(" LIMIT ");
    builder.push_bind(limit);

    builder.build_query_as::<TestSummaryRow>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, created_by: Option<&str>) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tests t WHERE 1 = 1");

    if let Some(created_by) = created_by {
        builder.push(" AND t.created_by = ");
        builder.push_bind(created_by);
    }

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

/// Questions of a test in paper order.
pub(crate) async fn list_questions(
    pool: &PgPool,
    test_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(
        "SELECT q.id, q.title, q.description, q.question_type, q.marks, q.options, \
                q.correct_answer, q.test_cases, q.created_by, q.created_at, q.updated_at \
         FROM questions q \
         JOIN test_questions tq ON tq.question_id = q.id \
         WHERE tq.test_id = $1 \
         ORDER BY tq.question_order ASC",
    )
    .bind(test_id)
    .fetch_all(pool)
    .await
}

/// Every test of the classes the student is enrolled in, annotated with
/// whether the student already has a submission for it. Unscheduled tests
/// sort ahead of scheduled ones.
pub(crate) async fn catalog_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<CatalogRow>, sqlx::Error> {
    sqlx::query_as::<_, CatalogRow>(
        "SELECT t.id, t.title, t.test_type, c.name AS class_name, t.scheduled_at, \
                t.duration_minutes, u.name AS creator_name, \
                EXISTS (SELECT 1 FROM submissions s \
                         WHERE s.test_id = t.id AND s.student_id = $1) AS has_submission \
         FROM tests t \
         JOIN classes c ON c.id = t.class_id \
         JOIN class_students cs ON cs.class_id = t.class_id AND cs.student_id = $1 \
         LEFT JOIN users u ON u.id = t.created_by \
         ORDER BY t.scheduled_at ASC NULLS FIRST, t.created_at ASC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateTest<'_>,
) -> Result<Option<Test>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("UPDATE tests SET id = id");

    if let Some(title) = params.title {
        builder.push(", title = ");
        builder.push_bind(title);
    }
    if params.clear_schedule {
        builder.push(", scheduled_at = NULL");
    } else if let Some(scheduled_at) = params.scheduled_at {
        builder.push(", scheduled_at = ");
        builder.push_bind(scheduled_at);
    }
    if let Some(duration_minutes) = params.duration_minutes {
        builder.push(", duration_minutes = ");
        builder.push_bind(duration_minutes);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(format!(" RETURNING {COLUMNS}"));

    builder.build_query_as::<Test>().fetch_optional(pool).await
}

pub(crate) async fn replace_questions(
    pool: &PgPool,
    test_id: &str,
    links: &[TestQuestionLink<'_>],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM test_questions WHERE test_id = $1")
        .bind(test_id)
        .execute(&mut *tx)
        .await?;

    for link in links {
        sqlx::query(
            "INSERT INTO test_questions (id, test_id, question_id, question_order) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(link.id)
        .bind(test_id)
        .bind(link.question_id)
        .bind(link.question_order)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tests WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
