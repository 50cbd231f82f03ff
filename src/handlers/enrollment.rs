use axum::{extract::State, Extension, Json};

use crate::auth::roles::Role;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::enrollment_service::SubmitEnrollment;
use crate::services::EnrollmentService;
use crate::store::models::enrollment::Enrollment;
use crate::AppState;

/// POST /enrollment - submit an application for a school year.
///
/// Only accounts still in the base `User` role may apply; approval is what
/// promotes them to `Student`.
pub async fn submit(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<SubmitEnrollment>,
) -> ApiResult<Enrollment> {
    auth.require_any(&[Role::User])?;

    let enrollment = EnrollmentService::new(state.store.clone())
        .submit(auth.id, payload)
        .await?;

    Ok(ApiResponse::created(enrollment))
}

/// GET /enrollment/me - the caller's latest application.
pub async fn my_enrollment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Enrollment> {
    auth.require_any(&[Role::User])?;

    let enrollment = EnrollmentService::new(state.store.clone())
        .my_enrollment(auth.id)
        .await?;

    Ok(ApiResponse::success(enrollment))
}
