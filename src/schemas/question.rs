use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::{Question, TestCase};
use crate::db::types::QuestionType;

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionCreate {
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) question_type: QuestionType,
    pub(crate) marks: i32,
    #[serde(default)]
    pub(crate) options: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) correct_answer: Option<String>,
    #[serde(default)]
    pub(crate) test_cases: Option<Vec<TestCaseCreate>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionUpdate {
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) marks: Option<i32>,
    /// Replacing the typed payload requires the full set of fields for the
    /// new type; partial payload patches are rejected.
    #[serde(default)]
    pub(crate) payload: Option<QuestionPayloadUpdate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionPayloadUpdate {
    pub(crate) question_type: QuestionType,
    #[serde(default)]
    pub(crate) options: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) correct_answer: Option<String>,
    #[serde(default)]
    pub(crate) test_cases: Option<Vec<TestCaseCreate>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TestCaseCreate {
    pub(crate) input: String,
    pub(crate) expected_output: String,
}

impl TestCaseCreate {
    pub(crate) fn into_db(self) -> TestCase {
        TestCase { input: self.input, expected_output: self.expected_output }
    }
}

/// Staff-facing view; includes the answer key.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) question_type: QuestionType,
    pub(crate) marks: i32,
    pub(crate) options: Option<Vec<String>>,
    pub(crate) correct_answer: Option<String>,
    pub(crate) test_cases: Option<Vec<TestCase>>,
    pub(crate) created_by: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            title: question.title,
            description: question.description,
            question_type: question.question_type,
            marks: question.marks,
            options: question.options.map(|json| json.0),
            correct_answer: question.correct_answer,
            test_cases: question.test_cases.map(|json| json.0),
            created_by: question.created_by,
            created_at: format_primitive(question.created_at),
            updated_at: format_primitive(question.updated_at),
        }
    }
}
