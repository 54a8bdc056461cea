use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::{is_foreign_key_violation, ApiError};
use crate::api::guards::CurrentStaff;
use crate::api::pagination::{clamp_page, default_limit, PaginatedResponse};
use crate::api::validation::validate_option_letter;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::{QuestionType, UserRole};
use crate::repositories;
use crate::schemas::question::{
    QuestionCreate, QuestionResponse, QuestionUpdate, TestCaseCreate,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_questions).post(create_question))
        .route("/:question_id", get(get_question).patch(update_question).delete(delete_question))
}

#[derive(Debug, Deserialize)]
struct ListQuestionsQuery {
    #[serde(default)]
    question_type: Option<QuestionType>,
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

/// The typed columns that go with a question type. Exactly the payload for
/// that type must be present, everything else absent.
struct QuestionPayload {
    options: Option<serde_json::Value>,
    correct_answer: Option<String>,
    test_cases: Option<serde_json::Value>,
}

fn build_payload(
    question_type: QuestionType,
    options: Option<Vec<String>>,
    correct_answer: Option<String>,
    test_cases: Option<Vec<TestCaseCreate>>,
) -> Result<QuestionPayload, ApiError> {
    match question_type {
        QuestionType::Mcq => {
            if test_cases.is_some() {
                return Err(ApiError::BadRequest(
                    "An mcq question cannot carry test cases".to_string(),
                ));
            }
            let options = options
                .filter(|options| options.len() >= 2)
                .ok_or_else(|| {
                    ApiError::BadRequest("An mcq question needs at least two options".to_string())
                })?;
            if options.iter().any(|option| option.trim().is_empty()) {
                return Err(ApiError::BadRequest("Options must not be empty".to_string()));
            }
            let correct_answer = correct_answer.ok_or_else(|| {
                ApiError::BadRequest("An mcq question needs a correct answer".to_string())
            })?;
            validate_option_letter(&correct_answer, options.len())?;

            Ok(QuestionPayload {
                options: Some(serde_json::json!(options)),
                correct_answer: Some(correct_answer.trim().to_ascii_uppercase()),
                test_cases: None,
            })
        }
        QuestionType::ShortAnswer => {
            if options.is_some() || test_cases.is_some() {
                return Err(ApiError::BadRequest(
                    "A short-answer question only carries the expected answer".to_string(),
                ));
            }
            let correct_answer = correct_answer
                .filter(|answer| !answer.trim().is_empty())
                .ok_or_else(|| {
                    ApiError::BadRequest(
                        "A short-answer question needs the expected answer".to_string(),
                    )
                })?;

            Ok(QuestionPayload {
                options: None,
                correct_answer: Some(correct_answer),
                test_cases: None,
            })
        }
        QuestionType::Coding => {
            if options.is_some() || correct_answer.is_some() {
                return Err(ApiError::BadRequest(
                    "A coding question only carries test cases".to_string(),
                ));
            }
            let test_cases = test_cases.filter(|cases| !cases.is_empty()).ok_or_else(|| {
                ApiError::BadRequest("A coding question needs at least one test case".to_string())
            })?;
            let test_cases: Vec<_> =
                test_cases.into_iter().map(TestCaseCreate::into_db).collect();

            Ok(QuestionPayload {
                options: None,
                correct_answer: None,
                test_cases: Some(serde_json::json!(test_cases)),
            })
        }
    }
}

async fn list_questions(
    CurrentStaff(_user): CurrentStaff,
    State(state): State<AppState>,
    Query(query): Query<ListQuestionsQuery>,
) -> Result<Json<PaginatedResponse<QuestionResponse>>, ApiError> {
    let (skip, limit) = clamp_page(query.skip, query.limit);
    let items = repositories::questions::list(state.db(), query.question_type, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;
    let total_count = repositories::questions::count(state.db(), query.question_type)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;

    Ok(Json(PaginatedResponse {
        items: items.into_iter().map(QuestionResponse::from_db).collect(),
        total_count,
        skip,
        limit,
    }))
}

async fn get_question(
    CurrentStaff(_user): CurrentStaff,
    State(state): State<AppState>,
    Path(question_id): Path<String>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let question = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    Ok(Json(QuestionResponse::from_db(question)))
}

async fn create_question(
    CurrentStaff(user): CurrentStaff,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title must not be empty".to_string()));
    }
    if payload.marks <= 0 {
        return Err(ApiError::BadRequest("Marks must be positive".to_string()));
    }

    let typed = build_payload(
        payload.question_type,
        payload.options,
        payload.correct_answer,
        payload.test_cases,
    )?;

    let now = primitive_now_utc();
    let question = repositories::questions::create(
        state.db(),
        repositories::questions::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            title: payload.title.trim(),
            description: &payload.description,
            question_type: payload.question_type,
            marks: payload.marks,
            options: typed.options,
            correct_answer: typed.correct_answer.as_deref(),
            test_cases: typed.test_cases,
            created_by: &user.id,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    Ok((StatusCode::CREATED, Json(QuestionResponse::from_db(question))))
}

async fn update_question(
    CurrentStaff(user): CurrentStaff,
    State(state): State<AppState>,
    Path(question_id): Path<String>,
    Json(payload): Json<QuestionUpdate>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let existing = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    can_manage(&user, &existing.created_by)?;

    if let Some(marks) = payload.marks {
        if marks <= 0 {
            return Err(ApiError::BadRequest("Marks must be positive".to_string()));
        }
    }
    if let Some(title) = &payload.title {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("Title must not be empty".to_string()));
        }
    }

    let (question_type, typed) = match payload.payload {
        Some(update) => {
            let typed = build_payload(
                update.question_type,
                update.options,
                update.correct_answer,
                update.test_cases,
            )?;
            (update.question_type, typed)
        }
        None => (
            existing.question_type,
            QuestionPayload {
                options: existing.options.as_ref().map(|json| serde_json::json!(json.0)),
                correct_answer: existing.correct_answer.clone(),
                test_cases: existing.test_cases.as_ref().map(|json| serde_json::json!(json.0)),
            },
        ),
    };

    let title = payload.title.as_deref().map(str::trim).unwrap_or(&existing.title);
    let description = payload.description.as_deref().unwrap_or(&existing.description);
    let marks = payload.marks.unwrap_or(existing.marks);

    let updated = repositories::questions::replace(
        state.db(),
        &question_id,
        repositories::questions::ReplaceQuestion {
            title,
            description,
            question_type,
            marks,
            options: typed.options,
            correct_answer: typed.correct_answer.as_deref(),
            test_cases: typed.test_cases,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update question"))?
    .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    Ok(Json(QuestionResponse::from_db(updated)))
}

async fn delete_question(
    CurrentStaff(user): CurrentStaff,
    State(state): State<AppState>,
    Path(question_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let existing = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    can_manage(&user, &existing.created_by)?;

    match repositories::questions::delete(state.db(), &question_id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(ApiError::NotFound("Question not found".to_string())),
        Err(err) if is_foreign_key_violation(&err) => {
            Err(ApiError::Conflict("Question is used by a test".to_string()))
        }
        Err(err) => Err(ApiError::internal(err, "Failed to delete question")),
    }
}

fn can_manage(user: &User, created_by: &str) -> Result<(), ApiError> {
    match user.role {
        UserRole::Admin => Ok(()),
        _ if user.id == created_by => Ok(()),
        _ => Err(ApiError::Forbidden("Not enough permissions for this question")),
    }
}
