//! In-memory lifecycle of a live test attempt.
//!
//! A student has at most one live attempt, keyed by student id in
//! [`crate::core::state::AppState`]. The session moves through four phases:
//!
//! ```text
//! confirmed --start--> in_progress --begin_submit--> submitting --complete--> closed
//! ```
//!
//! Answers are only writable while in progress. `begin_submit` is a one-shot
//! latch: it hands out graded drafts exactly once per submission attempt, so
//! a manual submit racing the countdown ticker cannot double-insert. If the
//! database write fails the latch is released with [`AttemptSession::submit_failed`]
//! and the drafts can be rebuilt; nothing is lost.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::QuestionKind;
use crate::db::types::{QuestionType, SubmissionStatus};
use crate::repositories::submissions::{self, NewSubmission};
use crate::services::grading;
use crate::services::templates::{self, CodeLanguage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum AttemptPhase {
    Confirmed,
    InProgress,
    Submitting,
    Closed,
}

/// Question snapshot captured when the attempt starts. The stored kind keeps
/// the answer key out of anything serialized back to the student.
#[derive(Debug, Clone)]
pub(crate) struct AttemptQuestion {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) marks: i32,
    pub(crate) kind: QuestionKind,
}

impl AttemptQuestion {
    pub(crate) fn question_type(&self) -> QuestionType {
        match self.kind {
            QuestionKind::MultipleChoice { .. } => QuestionType::Mcq,
            QuestionKind::ShortAnswer { .. } => QuestionType::ShortAnswer,
            QuestionKind::Coding { .. } => QuestionType::Coding,
        }
    }

    pub(crate) fn options(&self) -> Option<&[String]> {
        match &self.kind {
            QuestionKind::MultipleChoice { options, .. } => Some(options),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum AttemptError {
    #[error("The test has not been started yet")]
    NotStarted,
    #[error("The test can only be started once")]
    AlreadyStarted,
    #[error("A submission is already in progress")]
    SubmitInFlight,
    #[error("The attempt is already closed")]
    AlreadyClosed,
    #[error("Question is not part of this test")]
    UnknownQuestion,
    #[error("Language selection only applies to coding questions")]
    NotCodingQuestion,
}

/// One graded answer ready to be written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SubmissionDraft {
    pub(crate) question_id: String,
    pub(crate) answer: String,
    pub(crate) status: SubmissionStatus,
    pub(crate) score: i32,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Countdown {
    Running { remaining_seconds: u32 },
    Expired,
}

#[derive(Debug)]
pub(crate) struct AttemptSession {
    test_id: String,
    phase: AttemptPhase,
    duration_minutes: i32,
    remaining_seconds: u32,
    questions: Vec<AttemptQuestion>,
    answers: HashMap<String, String>,
    languages: HashMap<String, CodeLanguage>,
    submit_in_flight: bool,
}

impl AttemptSession {
    pub(crate) fn confirmed(test_id: &str, duration_minutes: i32) -> Self {
        Self {
            test_id: test_id.to_string(),
            phase: AttemptPhase::Confirmed,
            duration_minutes,
            remaining_seconds: 0,
            questions: Vec::new(),
            answers: HashMap::new(),
            languages: HashMap::new(),
            submit_in_flight: false,
        }
    }

    pub(crate) fn test_id(&self) -> &str {
        &self.test_id
    }

    pub(crate) fn phase(&self) -> AttemptPhase {
        self.phase
    }

    pub(crate) fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub(crate) fn questions(&self) -> &[AttemptQuestion] {
        &self.questions
    }

    pub(crate) fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub(crate) fn answered_count(&self) -> usize {
        self.answers.values().filter(|answer| !answer.is_empty()).count()
    }

    pub(crate) fn answer(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }

    pub(crate) fn language(&self, question_id: &str) -> Option<CodeLanguage> {
        self.languages.get(question_id).copied()
    }

    /// Only a confirmed attempt that was never started can be walked away
    /// from; once the countdown runs the test is locked in.
    pub(crate) fn can_abandon(&self) -> bool {
        self.phase == AttemptPhase::Confirmed
    }

    /// Arms the countdown and freezes the question set for this attempt.
    pub(crate) fn start(&mut self, questions: Vec<AttemptQuestion>) -> Result<(), AttemptError> {
        match self.phase {
            AttemptPhase::Confirmed => {
                self.remaining_seconds = self.duration_minutes.max(0) as u32 * 60;
                self.questions = questions;
                self.answers.clear();
                self.languages.clear();
                self.phase = AttemptPhase::InProgress;
                Ok(())
            }
            AttemptPhase::InProgress => Err(AttemptError::AlreadyStarted),
            AttemptPhase::Submitting => Err(AttemptError::SubmitInFlight),
            AttemptPhase::Closed => Err(AttemptError::AlreadyClosed),
        }
    }

    pub(crate) fn record_answer(
        &mut self,
        question_id: &str,
        answer: String,
    ) -> Result<(), AttemptError> {
        self.require_in_progress()?;
        if !self.questions.iter().any(|question| question.id == question_id) {
            return Err(AttemptError::UnknownQuestion);
        }
        self.answers.insert(question_id.to_string(), answer);
        Ok(())
    }

    /// Switches the editor language for a coding question. The starter
    /// template is written only when no answer text exists, so switching
    /// languages never destroys typed code. Returns the answer now on screen
    /// and whether the template was applied.
    pub(crate) fn select_language(
        &mut self,
        question_id: &str,
        language: CodeLanguage,
    ) -> Result<(String, bool), AttemptError> {
        self.require_in_progress()?;
        let question = self
            .questions
            .iter()
            .find(|question| question.id == question_id)
            .ok_or(AttemptError::UnknownQuestion)?;
        if !matches!(question.kind, QuestionKind::Coding { .. }) {
            return Err(AttemptError::NotCodingQuestion);
        }

        self.languages.insert(question_id.to_string(), language);
        let current = self.answers.get(question_id).map(String::as_str).unwrap_or_default();
        if current.is_empty() {
            let template = templates::starter_template(language).to_string();
            self.answers.insert(question_id.to_string(), template.clone());
            Ok((template, true))
        } else {
            Ok((current.to_string(), false))
        }
    }

    /// One countdown step. Call once per second while the attempt is in
    /// progress; [`Countdown::Expired`] means the time is up and the attempt
    /// must be force-submitted.
    pub(crate) fn tick(&mut self) -> Countdown {
        if self.phase != AttemptPhase::InProgress {
            return Countdown::Running { remaining_seconds: self.remaining_seconds };
        }
        if self.remaining_seconds > 1 {
            self.remaining_seconds -= 1;
            Countdown::Running { remaining_seconds: self.remaining_seconds }
        } else {
            self.remaining_seconds = 0;
            Countdown::Expired
        }
    }

    /// Grades every question against the current answers and latches the
    /// session into the submitting phase. While the latch is held, repeat
    /// calls fail; after [`Self::submit_failed`] the drafts can be taken
    /// again.
    pub(crate) fn begin_submit(&mut self) -> Result<Vec<SubmissionDraft>, AttemptError> {
        match self.phase {
            AttemptPhase::Confirmed => Err(AttemptError::NotStarted),
            AttemptPhase::Closed => Err(AttemptError::AlreadyClosed),
            AttemptPhase::Submitting if self.submit_in_flight => Err(AttemptError::SubmitInFlight),
            AttemptPhase::InProgress | AttemptPhase::Submitting => {
                self.phase = AttemptPhase::Submitting;
                self.submit_in_flight = true;
                Ok(self.build_drafts())
            }
        }
    }

    /// Releases the submit latch after a failed persist. Answers stay intact
    /// and the attempt stays locked; only another submit can move it forward.
    pub(crate) fn submit_failed(&mut self) {
        self.submit_in_flight = false;
    }

    pub(crate) fn complete(&mut self) {
        self.phase = AttemptPhase::Closed;
        self.submit_in_flight = false;
    }

    fn require_in_progress(&self) -> Result<(), AttemptError> {
        match self.phase {
            AttemptPhase::InProgress => Ok(()),
            AttemptPhase::Confirmed => Err(AttemptError::NotStarted),
            AttemptPhase::Submitting => Err(AttemptError::SubmitInFlight),
            AttemptPhase::Closed => Err(AttemptError::AlreadyClosed),
        }
    }

    fn build_drafts(&self) -> Vec<SubmissionDraft> {
        self.questions
            .iter()
            .map(|question| {
                let answer = self.answers.get(&question.id).cloned().unwrap_or_default();
                let (status, score) = grading::grade(&question.kind, question.marks, &answer);
                SubmissionDraft { question_id: question.id.clone(), answer, status, score }
            })
            .collect()
    }
}

/// Writes graded drafts as one submission batch. Shared by the manual submit
/// handler and the countdown ticker.
pub(crate) async fn persist_drafts(
    pool: &PgPool,
    test_id: &str,
    student_id: &str,
    drafts: &[SubmissionDraft],
) -> Result<u64, sqlx::Error> {
    let now = primitive_now_utc();
    let rows: Vec<NewSubmission<'_>> = drafts
        .iter()
        .map(|draft| NewSubmission {
            id: Uuid::new_v4().to_string(),
            test_id,
            question_id: &draft.question_id,
            student_id,
            answer: &draft.answer,
            status: draft.status,
            score: draft.score,
            submitted_at: now,
        })
        .collect();
    submissions::insert_batch(pool, &rows).await
}
