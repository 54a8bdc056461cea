use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::{is_foreign_key_violation, is_unique_violation, ApiError};
use crate::api::guards::{CurrentAdmin, CurrentStaff};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::class::{
    ClassCreate, ClassResponse, ClassUpdate, EnrollmentCreate, RosterEntryResponse,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_classes).post(create_class))
        .route("/:class_id", get(get_class).patch(update_class).delete(delete_class))
        .route("/:class_id/students", get(list_roster).post(enroll_student))
        .route("/:class_id/students/:student_id", delete(unenroll_student))
}

/// Admins see every class; teachers see the classes assigned to them.
async fn list_classes(
    CurrentStaff(user): CurrentStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<ClassResponse>>, ApiError> {
    let teacher_filter = match user.role {
        UserRole::Admin => None,
        UserRole::Teacher | UserRole::Student => Some(user.id.as_str()),
    };

    let rows = repositories::classes::list_summaries(state.db(), teacher_filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list classes"))?;

    Ok(Json(rows.into_iter().map(ClassResponse::from_db).collect()))
}

async fn get_class(
    CurrentStaff(_user): CurrentStaff,
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<Json<ClassResponse>, ApiError> {
    let row = repositories::classes::find_summary_by_id(state.db(), &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load class"))?
        .ok_or_else(|| ApiError::NotFound("Class not found".to_string()))?;

    Ok(Json(ClassResponse::from_db(row)))
}

async fn create_class(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ClassCreate>,
) -> Result<(StatusCode, Json<ClassResponse>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Class name must not be empty".to_string()));
    }

    if let Some(teacher_id) = &payload.teacher_id {
        require_teacher(&state, teacher_id).await?;
    }

    let now = primitive_now_utc();
    let class = repositories::classes::create(
        state.db(),
        repositories::classes::CreateClass {
            id: &Uuid::new_v4().to_string(),
            name: payload.name.trim(),
            teacher_id: payload.teacher_id.as_deref(),
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create class"))?;

    let row = repositories::classes::find_summary_by_id(state.db(), &class.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load class"))?
        .ok_or_else(|| ApiError::NotFound("Class not found".to_string()))?;

    Ok((StatusCode::CREATED, Json(ClassResponse::from_db(row))))
}

async fn update_class(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(class_id): Path<String>,
    Json(payload): Json<ClassUpdate>,
) -> Result<Json<ClassResponse>, ApiError> {
    if payload.remove_teacher && payload.teacher_id.is_some() {
        return Err(ApiError::BadRequest(
            "teacher_id and remove_teacher are mutually exclusive".to_string(),
        ));
    }

    let now = primitive_now_utc();

    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::BadRequest("Class name must not be empty".to_string()));
        }
        repositories::classes::rename(state.db(), &class_id, name.trim(), now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to update class"))?
            .ok_or_else(|| ApiError::NotFound("Class not found".to_string()))?;
    }

    if payload.remove_teacher {
        repositories::classes::set_teacher(state.db(), &class_id, None, now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to update class"))?
            .ok_or_else(|| ApiError::NotFound("Class not found".to_string()))?;
    } else if let Some(teacher_id) = &payload.teacher_id {
        require_teacher(&state, teacher_id).await?;
        repositories::classes::set_teacher(state.db(), &class_id, Some(teacher_id), now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to update class"))?
            .ok_or_else(|| ApiError::NotFound("Class not found".to_string()))?;
    }

    let row = repositories::classes::find_summary_by_id(state.db(), &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load class"))?
        .ok_or_else(|| ApiError::NotFound("Class not found".to_string()))?;

    Ok(Json(ClassResponse::from_db(row)))
}

async fn delete_class(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    match repositories::classes::delete(state.db(), &class_id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(ApiError::NotFound("Class not found".to_string())),
        Err(err) if is_foreign_key_violation(&err) => {
            Err(ApiError::Conflict("Class still has tests attached".to_string()))
        }
        Err(err) => Err(ApiError::internal(err, "Failed to delete class")),
    }
}

async fn list_roster(
    CurrentStaff(_user): CurrentStaff,
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<Json<Vec<RosterEntryResponse>>, ApiError> {
    require_class(&state, &class_id).await?;

    let rows = repositories::enrollments::list_by_class(state.db(), &class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list enrollments"))?;

    Ok(Json(rows.into_iter().map(RosterEntryResponse::from_db).collect()))
}

async fn enroll_student(
    CurrentStaff(_user): CurrentStaff,
    State(state): State<AppState>,
    Path(class_id): Path<String>,
    Json(payload): Json<EnrollmentCreate>,
) -> Result<(StatusCode, Json<RosterEntryResponse>), ApiError> {
    if payload.registration_number.trim().is_empty() {
        return Err(ApiError::BadRequest("Registration number must not be empty".to_string()));
    }

    require_class(&state, &class_id).await?;

    let student = repositories::users::find_by_id(state.db(), &payload.student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;
    if student.role != UserRole::Student {
        return Err(ApiError::BadRequest("Only student accounts can be enrolled".to_string()));
    }

    let created = repositories::enrollments::create(
        state.db(),
        repositories::enrollments::CreateEnrollment {
            id: &Uuid::new_v4().to_string(),
            class_id: &class_id,
            student_id: &payload.student_id,
            registration_number: payload.registration_number.trim(),
            created_at: primitive_now_utc(),
        },
    )
    .await;

    let enrollment = match created {
        Ok(enrollment) => enrollment,
        Err(err) if is_unique_violation(&err) => {
            return Err(ApiError::Conflict(
                "Student is already enrolled in this class".to_string(),
            ));
        }
        Err(err) => return Err(ApiError::internal(err, "Failed to enroll student")),
    };

    let response = RosterEntryResponse {
        id: enrollment.id,
        student_id: student.id,
        student_name: student.name,
        student_email: student.email,
        registration_number: enrollment.registration_number,
        enrolled_at: crate::core::time::format_primitive(enrollment.created_at),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

async fn unenroll_student(
    CurrentStaff(_user): CurrentStaff,
    State(state): State<AppState>,
    Path((class_id, student_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let removed = repositories::enrollments::delete(state.db(), &class_id, &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to remove enrollment"))?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Enrollment not found".to_string()))
    }
}

async fn require_class(state: &AppState, class_id: &str) -> Result<(), ApiError> {
    repositories::classes::find_by_id(state.db(), class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load class"))?
        .ok_or_else(|| ApiError::NotFound("Class not found".to_string()))?;
    Ok(())
}

async fn require_teacher(state: &AppState, teacher_id: &str) -> Result<User, ApiError> {
    let teacher = repositories::users::find_by_id(state.db(), teacher_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load teacher"))?
        .ok_or_else(|| ApiError::NotFound("Teacher not found".to_string()))?;

    match teacher.role {
        UserRole::Teacher | UserRole::Admin => Ok(teacher),
        UserRole::Student => {
            Err(ApiError::BadRequest("Assigned user must be a teacher".to_string()))
        }
    }
}
