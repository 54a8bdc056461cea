use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};
use time::PrimitiveDateTime;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;

pub(crate) struct CurrentUser(pub(crate) User);
/// Admin only.
pub(crate) struct CurrentAdmin(pub(crate) User);
/// Admin or teacher; the management surface is shared.
pub(crate) struct CurrentStaff(pub(crate) User);
/// Student only.
pub(crate) struct CurrentStudent(pub(crate) User);

/// Expired sessions are dead on arrival; nothing renews them.
pub(crate) fn session_expired(expires_at: PrimitiveDateTime, now: PrimitiveDateTime) -> bool {
    expires_at <= now
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let session = repositories::sessions::find_by_token(app_state.db(), token)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load session"))?;

        let Some(session) = session else {
            return Err(ApiError::Unauthorized("Invalid authentication credentials"));
        };

        if session_expired(session.expires_at, primitive_now_utc()) {
            return Err(ApiError::Unauthorized("Invalid authentication credentials"));
        }

        let user = repositories::users::find_by_id(app_state.db(), &session.user_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

        let Some(user) = user else {
            return Err(ApiError::Unauthorized("User not found"));
        };

        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        match user.role {
            UserRole::Admin => Ok(CurrentAdmin(user)),
            UserRole::Teacher | UserRole::Student => {
                Err(ApiError::Forbidden("Admin access required"))
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentStaff {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        match user.role {
            UserRole::Admin | UserRole::Teacher => Ok(CurrentStaff(user)),
            UserRole::Student => Err(ApiError::Forbidden("Teacher access required")),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentStudent {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        match user.role {
            UserRole::Student => Ok(CurrentStudent(user)),
            UserRole::Admin | UserRole::Teacher => {
                Err(ApiError::Forbidden("Student access required"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn session_expiry_is_inclusive() {
        let now = primitive_now_utc();
        assert!(session_expired(now, now));
        assert!(session_expired(now - Duration::seconds(1), now));
        assert!(!session_expired(now + Duration::seconds(1), now));
    }
}
