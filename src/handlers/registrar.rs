use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::roles::Role;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::enrollment_service::{CreateSection, EnrollmentStats};
use crate::services::{EnrollmentService, UserService};
use crate::store::models::enrollment::Enrollment;
use crate::store::models::section::Section;
use crate::store::models::user::PublicUser;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    #[serde(default)]
    pub section_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReasonRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleRequest {
    pub user_id: Uuid,
    pub role: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub lrn: Option<String>,
}

/// GET /registrar/enrollment/pending
pub async fn pending(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Vec<Enrollment>> {
    auth.require_any(&[Role::Registrar])?;

    Ok(ApiResponse::success(
        EnrollmentService::new(state.store.clone()).pending().await,
    ))
}

/// GET /registrar/enrollment/approved
pub async fn approved(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Vec<Enrollment>> {
    auth.require_any(&[Role::Registrar])?;

    Ok(ApiResponse::success(
        EnrollmentService::new(state.store.clone()).approved().await,
    ))
}

/// GET /registrar/enrollment/archived
pub async fn archived(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Vec<Enrollment>> {
    auth.require_any(&[Role::Registrar])?;

    Ok(ApiResponse::success(
        EnrollmentService::new(state.store.clone()).archived().await,
    ))
}

/// POST /registrar/enrollment/:id/approve - promote the applicant and place
/// them in a section. The body (sectionName) is optional.
pub async fn approve(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    payload: Option<Json<ApproveRequest>>,
) -> ApiResult<Value> {
    auth.require_any(&[Role::Registrar, Role::Admin])?;

    let section_name = payload.and_then(|Json(p)| p.section_name);
    let (enrollment, section) = EnrollmentService::new(state.store.clone())
        .approve(id, section_name)
        .await?;

    Ok(ApiResponse::success(json!({
        "message": "Enrollment approved",
        "enrollment": enrollment,
        "section": section,
    })))
}

/// POST /registrar/enrollment/:id/reject
pub async fn reject(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    payload: Option<Json<ReasonRequest>>,
) -> ApiResult<Enrollment> {
    auth.require_any(&[Role::Registrar, Role::Admin])?;

    let reason = payload.and_then(|Json(p)| p.reason);
    let enrollment = EnrollmentService::new(state.store.clone())
        .reject(id, reason)
        .await?;

    Ok(ApiResponse::success(enrollment))
}

/// POST /registrar/enrollment/:id/archive
pub async fn archive(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    payload: Option<Json<ReasonRequest>>,
) -> ApiResult<Enrollment> {
    auth.require_any(&[Role::Registrar])?;

    let reason = payload.and_then(|Json(p)| p.reason);
    let enrollment = EnrollmentService::new(state.store.clone())
        .archive(id, reason)
        .await?;

    Ok(ApiResponse::success(enrollment))
}

/// POST /registrar/enrollment/:id/restore
pub async fn restore(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Enrollment> {
    auth.require_any(&[Role::Registrar])?;

    let enrollment = EnrollmentService::new(state.store.clone())
        .restore(id)
        .await?;

    Ok(ApiResponse::success(enrollment))
}

/// POST /registrar/sections - create a section ahead of enrollment.
pub async fn create_section(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateSection>,
) -> ApiResult<Section> {
    auth.require_any(&[Role::Registrar])?;

    let section = EnrollmentService::new(state.store.clone())
        .create_section(payload)
        .await?;

    Ok(ApiResponse::created(section))
}

/// GET /registrar/sections
pub async fn sections(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Vec<Section>> {
    auth.require_any(&[Role::Registrar])?;

    Ok(ApiResponse::success(
        EnrollmentService::new(state.store.clone()).sections().await,
    ))
}

/// GET /registrar/stats
pub async fn stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<EnrollmentStats> {
    auth.require_any(&[Role::Registrar])?;

    Ok(ApiResponse::success(
        EnrollmentService::new(state.store.clone()).stats().await,
    ))
}

/// POST /registrar/assign-role - grant Moderator / Admin / SSG.
pub async fn assign_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<AssignRoleRequest>,
) -> ApiResult<PublicUser> {
    auth.require_any(&[Role::Registrar])?;

    let user = UserService::new(state.store.clone())
        .assign_role(payload.user_id, &payload.role, payload.full_name, payload.lrn)
        .await?;

    Ok(ApiResponse::success(user))
}
