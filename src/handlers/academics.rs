use axum::{extract::State, Extension, Json};

use crate::auth::roles::Role;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::academics_service::{CreateRecordBook, GradeReport, MarkAttendance};
use crate::services::AcademicsService;
use crate::store::models::communication::{AttendanceRecord, RecordBook};
use crate::AppState;

/// POST /academics/recordbook - register a grade sheet for a section.
pub async fn create_record_book(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateRecordBook>,
) -> ApiResult<RecordBook> {
    auth.require_any(&[Role::Moderator])?;

    let record_book = AcademicsService::new(state.store.clone(), state.sheets.clone())
        .create_record_book(auth.id, payload)
        .await?;

    Ok(ApiResponse::created(record_book))
}

/// GET /academics/grades/me - the caller's grades across approved
/// enrollments.
pub async fn my_grades(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Vec<GradeReport>> {
    auth.require_any(&[Role::Student])?;

    let grades = AcademicsService::new(state.store.clone(), state.sheets.clone())
        .my_grades(auth.id)
        .await;

    Ok(ApiResponse::success(grades))
}

/// POST /academics/attendance - mark a student's attendance.
pub async fn mark_attendance(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<MarkAttendance>,
) -> ApiResult<AttendanceRecord> {
    auth.require_any(&[Role::Moderator])?;

    let record = AcademicsService::new(state.store.clone(), state.sheets.clone())
        .mark_attendance(auth.id, payload)
        .await?;

    Ok(ApiResponse::created(record))
}
