use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::attempt::{
    AttemptAnswer, AttemptConfirm, AttemptConfirmResponse, AttemptLanguage,
    AttemptLanguageResponse, AttemptQuestionResponse, AttemptResumeResponse,
    AttemptSnapshotResponse, AttemptStartResponse, AttemptSubmitResponse, LockdownAdvisory,
};
use crate::services::attempt::{
    self, AttemptError, AttemptPhase, AttemptQuestion, AttemptSession,
};
use crate::services::catalog::{self, TestAvailability};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(confirm_attempt))
        .route("/current", get(current_attempt).delete(abandon_attempt))
        .route("/current/start", post(start_attempt))
        .route("/current/answers", put(record_answer))
        .route("/current/languages", put(select_language))
        .route("/current/submit", post(submit_attempt))
}

fn attempt_error(err: AttemptError) -> ApiError {
    match err {
        AttemptError::UnknownQuestion => ApiError::NotFound(err.to_string()),
        AttemptError::NotCodingQuestion => ApiError::BadRequest(err.to_string()),
        AttemptError::NotStarted
        | AttemptError::AlreadyStarted
        | AttemptError::SubmitInFlight
        | AttemptError::AlreadyClosed => ApiError::Conflict(err.to_string()),
    }
}

/// Locks the student into a test. The client shows the malpractice warning
/// first and sends the acknowledgement; after this only submitting (or
/// abandoning before start) releases the student.
async fn confirm_attempt(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    Json(payload): Json<AttemptConfirm>,
) -> Result<(StatusCode, Json<AttemptConfirmResponse>), ApiError> {
    if !payload.acknowledge_lockdown {
        return Err(ApiError::BadRequest(
            "The test warning must be acknowledged before starting".to_string(),
        ));
    }

    {
        let attempts = state.attempts().lock().await;
        if attempts.contains_key(&student.id) {
            return Err(ApiError::Conflict("You already have an active attempt".to_string()));
        }
    }

    let test = repositories::tests::find_by_id(state.db(), &payload.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load test"))?
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;

    let enrolled = repositories::enrollments::exists(state.db(), &test.class_id, &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check enrollment"))?;
    if !enrolled {
        return Err(ApiError::Forbidden("You are not enrolled in this class"));
    }

    let has_submission =
        repositories::submissions::exists_for_test_and_student(state.db(), &test.id, &student.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check submissions"))?;

    match catalog::availability(test.scheduled_at, has_submission, primitive_now_utc()) {
        TestAvailability::Completed => {
            return Err(ApiError::Conflict("You have already taken this test".to_string()));
        }
        TestAvailability::Upcoming => {
            return Err(ApiError::Conflict("The test is not available yet".to_string()));
        }
        TestAvailability::Available => {}
    }

    let session = AttemptSession::confirmed(&test.id, test.duration_minutes);

    let mut attempts = state.attempts().lock().await;
    if attempts.contains_key(&student.id) {
        return Err(ApiError::Conflict("You already have an active attempt".to_string()));
    }
    attempts.insert(student.id.clone(), session);
    metrics::counter!("attempts_confirmed_total").increment(1);

    Ok((
        StatusCode::CREATED,
        Json(AttemptConfirmResponse {
            test_id: test.id,
            phase: AttemptPhase::Confirmed,
            lockdown: LockdownAdvisory::active(),
        }),
    ))
}

/// Arms the countdown and returns the paper. Questions come back without
/// answer keys or expected outputs.
async fn start_attempt(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<AttemptStartResponse>, ApiError> {
    let test_id = {
        let attempts = state.attempts().lock().await;
        let session = attempts
            .get(&student.id)
            .ok_or_else(|| ApiError::NotFound("No active attempt".to_string()))?;
        session.test_id().to_string()
    };

    let rows = repositories::tests::list_questions(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load test questions"))?;
    if rows.is_empty() {
        return Err(ApiError::Conflict("The test has no questions".to_string()));
    }

    let mut questions = Vec::with_capacity(rows.len());
    for row in rows {
        let kind = row.kind().map_err(|e| ApiError::internal(e, "Malformed question payload"))?;
        questions.push(AttemptQuestion {
            id: row.id,
            title: row.title,
            description: row.description,
            marks: row.marks,
            kind,
        });
    }

    let mut attempts = state.attempts().lock().await;
    let session = attempts
        .get_mut(&student.id)
        .ok_or_else(|| ApiError::NotFound("No active attempt".to_string()))?;
    session.start(questions).map_err(attempt_error)?;

    Ok(Json(AttemptStartResponse {
        test_id,
        phase: session.phase(),
        remaining_seconds: session.remaining_seconds(),
        questions: session.questions().iter().map(AttemptQuestionResponse::from_session).collect(),
        lockdown: LockdownAdvisory::active(),
    }))
}

/// Restores the attempt screen after a reload or reconnect: the paper plus
/// every saved answer and language choice.
async fn current_attempt(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<AttemptResumeResponse>, ApiError> {
    let attempts = state.attempts().lock().await;
    let session = attempts
        .get(&student.id)
        .ok_or_else(|| ApiError::NotFound("No active attempt".to_string()))?;

    Ok(Json(AttemptResumeResponse::from_session(session)))
}

async fn abandon_attempt(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let mut attempts = state.attempts().lock().await;
    let session = attempts
        .get(&student.id)
        .ok_or_else(|| ApiError::NotFound("No active attempt".to_string()))?;

    if !session.can_abandon() {
        return Err(ApiError::Conflict(
            "A test in progress can only be finished by submitting".to_string(),
        ));
    }

    attempts.remove(&student.id);
    Ok(StatusCode::NO_CONTENT)
}

async fn record_answer(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    Json(payload): Json<AttemptAnswer>,
) -> Result<Json<AttemptSnapshotResponse>, ApiError> {
    let mut attempts = state.attempts().lock().await;
    let session = attempts
        .get_mut(&student.id)
        .ok_or_else(|| ApiError::NotFound("No active attempt".to_string()))?;

    session.record_answer(&payload.question_id, payload.answer).map_err(attempt_error)?;

    Ok(Json(AttemptSnapshotResponse::from_session(session)))
}

async fn select_language(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    Json(payload): Json<AttemptLanguage>,
) -> Result<Json<AttemptLanguageResponse>, ApiError> {
    let mut attempts = state.attempts().lock().await;
    let session = attempts
        .get_mut(&student.id)
        .ok_or_else(|| ApiError::NotFound("No active attempt".to_string()))?;

    let (answer, template_applied) =
        session.select_language(&payload.question_id, payload.language).map_err(attempt_error)?;

    Ok(Json(AttemptLanguageResponse {
        question_id: payload.question_id,
        language: payload.language,
        answer,
        template_applied,
    }))
}

/// Grades and persists the whole attempt. On a failed write the attempt
/// stays latched open for a retry; on success it is closed and removed.
async fn submit_attempt(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<AttemptSubmitResponse>, ApiError> {
    let (test_id, drafts) = {
        let mut attempts = state.attempts().lock().await;
        let session = attempts
            .get_mut(&student.id)
            .ok_or_else(|| ApiError::NotFound("No active attempt".to_string()))?;
        let drafts = session.begin_submit().map_err(attempt_error)?;
        (session.test_id().to_string(), drafts)
    };

    let persisted = attempt::persist_drafts(state.db(), &test_id, &student.id, &drafts).await;

    let mut attempts = state.attempts().lock().await;
    match persisted {
        Ok(submitted) => {
            let phase = match attempts.remove(&student.id) {
                Some(mut session) => {
                    session.complete();
                    session.phase()
                }
                None => AttemptPhase::Closed,
            };
            metrics::counter!("attempts_submitted_total", "trigger" => "manual").increment(1);
            tracing::info!(test_id = %test_id, student_id = %student.id, submitted, "attempt submitted");
            Ok(Json(AttemptSubmitResponse { test_id, submitted, phase }))
        }
        Err(err) => {
            if let Some(session) = attempts.get_mut(&student.id) {
                session.submit_failed();
            }
            Err(ApiError::internal(err, "Failed to save submissions"))
        }
    }
}
