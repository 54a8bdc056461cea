use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
    PrimitiveDateTime,
};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::types::{QuestionType, SubmissionStatus};
use crate::repositories::submissions::TestSubmissionRow;
use crate::repositories::tests::{CatalogRow, TestSummaryRow};
use crate::schemas::question::QuestionResponse;
use crate::services::catalog::TestAvailability;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TestCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    pub(crate) test_type: QuestionType,
    pub(crate) class_id: String,
    #[serde(default, deserialize_with = "deserialize_option_offset_datetime_flexible")]
    pub(crate) scheduled_at: Option<OffsetDateTime>,
    #[validate(range(min = 1, max = 1440, message = "duration must be between 1 and 1440 minutes"))]
    pub(crate) duration_minutes: i32,
    #[validate(length(min = 1, message = "a test needs at least one question"))]
    pub(crate) question_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TestUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_offset_datetime_flexible")]
    pub(crate) scheduled_at: Option<OffsetDateTime>,
    /// Turns the test into an always-available one.
    #[serde(default)]
    pub(crate) clear_schedule: bool,
    #[serde(default)]
    #[validate(range(min = 1, max = 1440, message = "duration must be between 1 and 1440 minutes"))]
    pub(crate) duration_minutes: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TestQuestionsReplace {
    pub(crate) question_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TestResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) test_type: QuestionType,
    pub(crate) class_id: String,
    pub(crate) class_name: String,
    pub(crate) scheduled_at: Option<String>,
    pub(crate) duration_minutes: i32,
    pub(crate) created_by: String,
    pub(crate) creator_name: Option<String>,
    pub(crate) question_count: i64,
    pub(crate) total_marks: i64,
    pub(crate) created_at: String,
}

impl TestResponse {
    pub(crate) fn from_db(row: TestSummaryRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            test_type: row.test_type,
            class_id: row.class_id,
            class_name: row.class_name,
            scheduled_at: row.scheduled_at.map(format_primitive),
            duration_minutes: row.duration_minutes,
            created_by: row.created_by,
            creator_name: row.creator_name,
            question_count: row.question_count,
            total_marks: row.total_marks,
            created_at: format_primitive(row.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TestDetailResponse {
    #[serde(flatten)]
    pub(crate) test: TestResponse,
    pub(crate) questions: Vec<QuestionResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TestSubmissionResponse {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) question_title: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) student_email: String,
    pub(crate) answer: String,
    pub(crate) status: SubmissionStatus,
    pub(crate) score: i32,
    pub(crate) submitted_at: String,
}

impl TestSubmissionResponse {
    pub(crate) fn from_db(row: TestSubmissionRow) -> Self {
        Self {
            id: row.id,
            question_id: row.question_id,
            question_title: row.question_title,
            student_id: row.student_id,
            student_name: row.student_name,
            student_email: row.student_email,
            answer: row.answer,
            status: row.status,
            score: row.score,
            submitted_at: format_primitive(row.submitted_at),
        }
    }
}

/// One entry of the student's test catalog.
#[derive(Debug, Serialize)]
pub(crate) struct CatalogTestResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) test_type: QuestionType,
    pub(crate) class_name: String,
    pub(crate) scheduled_at: Option<String>,
    pub(crate) duration_minutes: i32,
    pub(crate) creator_name: Option<String>,
    pub(crate) status: TestAvailability,
}

impl CatalogTestResponse {
    pub(crate) fn from_db(row: CatalogRow, status: TestAvailability) -> Self {
        Self {
            id: row.id,
            title: row.title,
            test_type: row.test_type,
            class_name: row.class_name,
            scheduled_at: row.scheduled_at.map(format_primitive),
            duration_minutes: row.duration_minutes,
            creator_name: row.creator_name,
            status,
        }
    }
}

fn parse_offset_datetime_flexible(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(value);
    }

    // Frontend's datetime-local often sends without timezone.
    if raw.len() == 16 && raw.as_bytes().get(10) == Some(&b'T') {
        let candidate = format!("{raw}:00Z");
        if let Ok(value) = OffsetDateTime::parse(&candidate, &Rfc3339) {
            return Some(value);
        }
    }

    if raw.len() == 19 && raw.as_bytes().get(10) == Some(&b'T') {
        let candidate = format!("{raw}Z");
        if let Ok(value) = OffsetDateTime::parse(&candidate, &Rfc3339) {
            return Some(value);
        }
    }

    if let Ok(value) =
        PrimitiveDateTime::parse(raw, &format_description!("[year]-[month]-[day]T[hour]:[minute]"))
    {
        return Some(value.assume_utc());
    }

    None
}

fn deserialize_option_offset_datetime_flexible<'de, D>(
    deserializer: D,
) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        Some(value) => parse_offset_datetime_flexible(&value)
            .ok_or_else(|| D::Error::custom(format!("invalid datetime: {value}")))
            .map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_and_datetime_local() {
        assert!(parse_offset_datetime_flexible("2025-06-10T09:00:00Z").is_some());
        assert!(parse_offset_datetime_flexible("2025-06-10T09:00").is_some());
        assert!(parse_offset_datetime_flexible("2025-06-10T09:00:00").is_some());
        assert!(parse_offset_datetime_flexible("not a date").is_none());
    }
}
