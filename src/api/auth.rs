use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::Duration;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::{validate_email, validate_password_len};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::auth::TokenResponse;
use crate::schemas::user::{UserCreate, UserLogin, UserResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/me", get(me))
}

/// Self-service signup always creates a student account. Teacher and admin
/// accounts are provisioned by an admin.
async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<UserCreate>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    validate_email(&payload.email)?;
    validate_password_len(&payload.password)?;
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name must not be empty".to_string()));
    }

    let existing = repositories::users::exists_by_email(state.db(), &payload.email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if existing {
        return Err(ApiError::Conflict("User with this email already exists".to_string()));
    }

    let now = primitive_now_utc();
    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            email: &payload.email,
            hashed_password: &security::hash_password(&payload.password),
            name: payload.name.trim(),
            role: UserRole::Student,
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create user"))?;

    let response = issue_session(&state, user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<UserLogin>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = repositories::users::find_by_email(state.db(), &payload.email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

    let Some(user) = user else {
        return Err(ApiError::Unauthorized("Incorrect email or password"));
    };

    if !security::verify_password(&payload.password, &user.hashed_password) {
        return Err(ApiError::Unauthorized("Incorrect email or password"));
    }

    let response = issue_session(&state, user).await?;
    Ok(Json(response))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

async fn issue_session(state: &AppState, user: User) -> Result<TokenResponse, ApiError> {
    let now = primitive_now_utc();
    let ttl_hours = state.settings().security().session_ttl_hours;
    let expires_at = now + Duration::hours(ttl_hours as i64);

    let session = repositories::sessions::create(
        state.db(),
        repositories::sessions::CreateSession {
            id: &Uuid::new_v4().to_string(),
            token: &security::generate_session_token(),
            user_id: &user.id,
            expires_at,
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create session"))?;

    Ok(TokenResponse {
        access_token: session.token,
        token_type: "bearer".to_string(),
        expires_at: format_primitive(session.expires_at),
        user: UserResponse::from_db(user),
    })
}
