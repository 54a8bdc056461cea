use sqlx::{FromRow, PgPool};
use time::PrimitiveDateTime;

use crate::db::types::SubmissionStatus;

pub(crate) struct NewSubmission<'a> {
    pub(crate) id: String,
    pub(crate) test_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) answer: &'a str,
    pub(crate) status: SubmissionStatus,
    pub(crate) score: i32,
    pub(crate) submitted_at: PrimitiveDateTime,
}

/// Submission joined with student and question display fields for the
/// teacher's results view.
#[derive(Debug, FromRow)]
pub(crate) struct TestSubmissionRow {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) question_title: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) student_email: String,
    pub(crate) answer: String,
    pub(crate) status: SubmissionStatus,
    pub(crate) score: i32,
    pub(crate) submitted_at: PrimitiveDateTime,
}

/// Writes one attempt's answers as a single transaction. The unique key on
/// (test_id, question_id, student_id) makes a replayed batch a no-op instead
/// of a duplicate.
pub(crate) async fn insert_batch(
    pool: &PgPool,
    rows: &[NewSubmission<'_>],
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for row in rows {
        let result = sqlx::query(
            "INSERT INTO submissions \
             (id, test_id, question_id, student_id, answer, status, score, submitted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (test_id, question_id, student_id) DO NOTHING",
        )
        .bind(&row.id)
        .bind(row.test_id)
        .bind(row.question_id)
        .bind(row.student_id)
        .bind(row.answer)
        .bind(row.status)
        .bind(row.score)
        .bind(row.submitted_at)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

pub(crate) async fn exists_for_test_and_student(
    executor: impl sqlx::PgExecutor<'_>,
    test_id: &str,
    student_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM submissions WHERE test_id = $1 AND student_id = $2)",
    )
    .bind(test_id)
    .bind(student_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_test(
    pool: &PgPool,
    test_id: &str,
) -> Result<Vec<TestSubmissionRow>, sqlx::Error> {
    sqlx::query_as::<_, TestSubmissionRow>(
        "SELECT s.id, s.question_id, q.title AS question_title, s.student_id, \
                u.name AS student_name, u.email AS student_email, \
                s.answer, s.status, s.score, s.submitted_at \
         FROM submissions s \
         JOIN users u ON u.id = s.student_id \
         JOIN questions q ON q.id = s.question_id \
         WHERE s.test_id = $1 \
         ORDER BY u.name ASC, s.question_id ASC",
    )
    .bind(test_id)
    .fetch_all(pool)
    .await
}
