use axum::{extract::State, routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::test::CatalogTestResponse;
use crate::services::catalog;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/tests", get(list_catalog))
}

/// Every test of the student's classes, tagged with its availability. The
/// repository query orders unscheduled tests first, then by schedule.
async fn list_catalog(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<Vec<CatalogTestResponse>>, ApiError> {
    let rows = repositories::tests::catalog_for_student(state.db(), &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load test catalog"))?;

    let now = primitive_now_utc();
    let items = rows
        .into_iter()
        .map(|row| {
            let status = catalog::availability(row.scheduled_at, row.has_submission, now);
            CatalogTestResponse::from_db(row, status)
        })
        .collect();

    Ok(Json(items))
}
