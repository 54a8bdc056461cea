use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use thiserror::Error;
use time::PrimitiveDateTime;

use crate::db::types::{QuestionType, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) name: String,
    pub(crate) role: UserRole,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Session {
    pub(crate) id: String,
    pub(crate) token: String,
    pub(crate) user_id: String,
    pub(crate) expires_at: PrimitiveDateTime,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Class {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Enrollment {
    pub(crate) id: String,
    pub(crate) class_id: String,
    pub(crate) student_id: String,
    pub(crate) registration_number: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) question_type: QuestionType,
    pub(crate) marks: i32,
    pub(crate) options: Option<Json<Vec<String>>>,
    pub(crate) correct_answer: Option<String>,
    pub(crate) test_cases: Option<Json<Vec<TestCase>>>,
    pub(crate) created_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Test {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) test_type: QuestionType,
    pub(crate) class_id: String,
    pub(crate) scheduled_at: Option<PrimitiveDateTime>,
    pub(crate) duration_minutes: i32,
    pub(crate) created_by: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TestCase {
    pub(crate) input: String,
    pub(crate) expected_output: String,
}

/// Type-resolved question payload. Parsed exactly once when a question row is
/// loaded; downstream code matches on the variant instead of re-reading
/// untyped JSON columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum QuestionKind {
    MultipleChoice { options: Vec<String>, correct_option: String },
    ShortAnswer { expected_answer: String },
    Coding { test_cases: Vec<TestCase> },
}

#[derive(Debug, Error)]
pub(crate) enum QuestionShapeError {
    #[error("mcq question {0} is missing options or the correct option letter")]
    MalformedMcq(String),
    #[error("short-answer question {0} is missing the expected answer")]
    MalformedShortAnswer(String),
    #[error("coding question {0} is missing its test cases")]
    MalformedCoding(String),
}

impl Question {
    /// Invariant: exactly one payload family is populated, matching
    /// `question_type`. Rows violating it are rejected at load, not rendered.
    pub(crate) fn kind(&self) -> Result<QuestionKind, QuestionShapeError> {
        match self.question_type {
            QuestionType::Mcq => {
                let options = self
                    .options
                    .as_ref()
                    .map(|json| json.0.clone())
                    .filter(|options| !options.is_empty())
                    .ok_or_else(|| QuestionShapeError::MalformedMcq(self.id.clone()))?;
                let correct_option = self
                    .correct_answer
                    .clone()
                    .filter(|letter| !letter.trim().is_empty())
                    .ok_or_else(|| QuestionShapeError::MalformedMcq(self.id.clone()))?;
                Ok(QuestionKind::MultipleChoice { options, correct_option })
            }
            QuestionType::ShortAnswer => {
                let expected_answer = self
                    .correct_answer
                    .clone()
                    .filter(|answer| !answer.trim().is_empty())
                    .ok_or_else(|| QuestionShapeError::MalformedShortAnswer(self.id.clone()))?;
                Ok(QuestionKind::ShortAnswer { expected_answer })
            }
            QuestionType::Coding => {
                let test_cases = self
                    .test_cases
                    .as_ref()
                    .map(|json| json.0.clone())
                    .filter(|cases| !cases.is_empty())
                    .ok_or_else(|| QuestionShapeError::MalformedCoding(self.id.clone()))?;
                Ok(QuestionKind::Coding { test_cases })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;

    fn question_row(question_type: QuestionType) -> Question {
        let now = primitive_now_utc();
        Question {
            id: "q-1".to_string(),
            title: "Sample".to_string(),
            description: "Sample question".to_string(),
            question_type,
            marks: 5,
            options: None,
            correct_answer: None,
            test_cases: None,
            created_by: "u-1".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn mcq_kind_requires_options_and_letter() {
        let mut row = question_row(QuestionType::Mcq);
        assert!(row.kind().is_err());

        row.options = Some(Json(vec!["Paris".to_string(), "Lyon".to_string()]));
        row.correct_answer = Some("A".to_string());
        assert_eq!(
            row.kind().unwrap(),
            QuestionKind::MultipleChoice {
                options: vec!["Paris".to_string(), "Lyon".to_string()],
                correct_option: "A".to_string(),
            }
        );
    }

    #[test]
    fn short_answer_kind_requires_expected_text() {
        let mut row = question_row(QuestionType::ShortAnswer);
        assert!(row.kind().is_err());

        row.correct_answer = Some("42".to_string());
        assert_eq!(
            row.kind().unwrap(),
            QuestionKind::ShortAnswer { expected_answer: "42".to_string() }
        );
    }

    #[test]
    fn coding_kind_requires_test_cases() {
        let mut row = question_row(QuestionType::Coding);
        assert!(row.kind().is_err());

        row.test_cases = Some(Json(vec![TestCase {
            input: "1 2".to_string(),
            expected_output: "3".to_string(),
        }]));
        assert!(matches!(row.kind().unwrap(), QuestionKind::Coding { .. }));
    }
}
