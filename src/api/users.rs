use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::{is_unique_violation, ApiError};
use crate::api::guards::{CurrentAdmin, CurrentStaff};
use crate::api::pagination::{clamp_page, default_limit, PaginatedResponse};
use crate::api::validation::{validate_email, validate_password_len};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::user::{AdminUserCreate, UserResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(list_users).post(create_user))
}

#[derive(Debug, Deserialize)]
struct ListUsersQuery {
    #[serde(default = "default_role")]
    role: UserRole,
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_role() -> UserRole {
    UserRole::Student
}

/// Teachers browse accounts to enroll students; admins use the same listing
/// to assign teachers to classes.
async fn list_users(
    CurrentStaff(_user): CurrentStaff,
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<PaginatedResponse<UserResponse>>, ApiError> {
    let (skip, limit) = clamp_page(query.skip, query.limit);
    let items = repositories::users::list_by_role(state.db(), query.role, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list users"))?;
    let total_count = repositories::users::count_by_role(state.db(), query.role)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count users"))?;

    Ok(Json(PaginatedResponse {
        items: items.into_iter().map(UserResponse::from_db).collect(),
        total_count,
        skip,
        limit,
    }))
}

async fn create_user(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AdminUserCreate>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate_email(&payload.email)?;
    validate_password_len(&payload.password)?;
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name must not be empty".to_string()));
    }

    let now = primitive_now_utc();
    let created = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            email: &payload.email,
            hashed_password: &security::hash_password(&payload.password),
            name: payload.name.trim(),
            role: payload.role,
            created_at: now,
        },
    )
    .await;

    match created {
        Ok(user) => Ok((StatusCode::CREATED, Json(UserResponse::from_db(user)))),
        Err(err) if is_unique_violation(&err) => {
            Err(ApiError::Conflict("User with this email already exists".to_string()))
        }
        Err(err) => Err(ApiError::internal(err, "Failed to create user")),
    }
}
