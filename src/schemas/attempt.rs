use serde::{Deserialize, Serialize};

use crate::db::types::QuestionType;
use crate::services::attempt::{AttemptPhase, AttemptQuestion, AttemptSession};
use crate::services::templates::CodeLanguage;

#[derive(Debug, Deserialize)]
pub(crate) struct AttemptConfirm {
    pub(crate) test_id: String,
    /// The client must show the lock-in warning before sending this.
    #[serde(default)]
    pub(crate) acknowledge_lockdown: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttemptAnswer {
    pub(crate) question_id: String,
    pub(crate) answer: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttemptLanguage {
    pub(crate) question_id: String,
    pub(crate) language: CodeLanguage,
}

/// What the proctored client is expected to enforce while the attempt runs.
#[derive(Debug, Serialize)]
pub(crate) struct LockdownAdvisory {
    pub(crate) request_fullscreen: bool,
    pub(crate) warn_on_navigate: bool,
}

impl LockdownAdvisory {
    pub(crate) fn active() -> Self {
        Self { request_fullscreen: true, warn_on_navigate: true }
    }
}

/// Question as shown during the attempt. Never carries the correct answer or
/// the expected outputs.
#[derive(Debug, Serialize)]
pub(crate) struct AttemptQuestionResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) question_type: QuestionType,
    pub(crate) marks: i32,
    pub(crate) options: Option<Vec<String>>,
}

impl AttemptQuestionResponse {
    pub(crate) fn from_session(question: &AttemptQuestion) -> Self {
        Self {
            id: question.id.clone(),
            title: question.title.clone(),
            description: question.description.clone(),
            question_type: question.question_type(),
            marks: question.marks,
            options: question.options().map(|options| options.to_vec()),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptConfirmResponse {
    pub(crate) test_id: String,
    pub(crate) phase: AttemptPhase,
    pub(crate) lockdown: LockdownAdvisory,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptStartResponse {
    pub(crate) test_id: String,
    pub(crate) phase: AttemptPhase,
    pub(crate) remaining_seconds: u32,
    pub(crate) questions: Vec<AttemptQuestionResponse>,
    pub(crate) lockdown: LockdownAdvisory,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptSnapshotResponse {
    pub(crate) test_id: String,
    pub(crate) phase: AttemptPhase,
    pub(crate) remaining_seconds: u32,
    pub(crate) question_count: usize,
    pub(crate) answered_count: usize,
}

impl AttemptSnapshotResponse {
    pub(crate) fn from_session(session: &AttemptSession) -> Self {
        Self {
            test_id: session.test_id().to_string(),
            phase: session.phase(),
            remaining_seconds: session.remaining_seconds(),
            question_count: session.question_count(),
            answered_count: session.answered_count(),
        }
    }
}

/// Saved progress for one question, returned when a client reconnects.
#[derive(Debug, Serialize)]
pub(crate) struct AttemptProgressResponse {
    #[serde(flatten)]
    pub(crate) question: AttemptQuestionResponse,
    pub(crate) answer: String,
    pub(crate) language: Option<CodeLanguage>,
}

/// Full state a reconnecting client needs to restore the attempt screen.
#[derive(Debug, Serialize)]
pub(crate) struct AttemptResumeResponse {
    #[serde(flatten)]
    pub(crate) snapshot: AttemptSnapshotResponse,
    pub(crate) questions: Vec<AttemptProgressResponse>,
    pub(crate) lockdown: LockdownAdvisory,
}

impl AttemptResumeResponse {
    pub(crate) fn from_session(session: &AttemptSession) -> Self {
        let questions = session
            .questions()
            .iter()
            .map(|question| AttemptProgressResponse {
                answer: session.answer(&question.id).unwrap_or_default().to_string(),
                language: session.language(&question.id),
                question: AttemptQuestionResponse::from_session(question),
            })
            .collect();

        Self {
            snapshot: AttemptSnapshotResponse::from_session(session),
            questions,
            lockdown: LockdownAdvisory::active(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptLanguageResponse {
    pub(crate) question_id: String,
    pub(crate) language: CodeLanguage,
    pub(crate) answer: String,
    pub(crate) template_applied: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptSubmitResponse {
    pub(crate) test_id: String,
    pub(crate) submitted: u64,
    pub(crate) phase: AttemptPhase,
}
