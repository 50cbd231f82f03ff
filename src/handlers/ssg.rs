use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::roles::Role;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::election_service::{CreateElection, CreateSsgEvent, Nominate, SsgMember};
use crate::services::ElectionService;
use crate::store::models::ssg::{Candidate, Election, SsgEvent};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub election_id: Uuid,
    pub candidate_id: Uuid,
}

/// POST /ssg/election - open a new election.
pub async fn create_election(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateElection>,
) -> ApiResult<Election> {
    auth.require_any(&[Role::Ssg, Role::Registrar])?;

    let election = ElectionService::new(state.store.clone())
        .create_election(payload)
        .await?;

    Ok(ApiResponse::created(election))
}

/// POST /ssg/nominate - add a candidate to an election.
pub async fn nominate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<Nominate>,
) -> ApiResult<Candidate> {
    auth.require_any(&[Role::Ssg, Role::Registrar])?;

    let candidate = ElectionService::new(state.store.clone())
        .nominate(auth.id, payload)
        .await?;

    Ok(ApiResponse::success(candidate))
}

/// POST /ssg/vote - cast the caller's single vote in an election.
pub async fn vote(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<VoteRequest>,
) -> ApiResult<Election> {
    auth.require_any(&[Role::Student])?;

    let election = ElectionService::new(state.store.clone())
        .vote(auth.id, payload.election_id, payload.candidate_id)
        .await?;

    Ok(ApiResponse::success(election))
}

/// GET /ssg/elections - public listing.
pub async fn elections(State(state): State<AppState>) -> ApiResult<Vec<Election>> {
    Ok(ApiResponse::success(
        ElectionService::new(state.store.clone()).elections().await,
    ))
}

/// GET /ssg/election/:id/tally - standings, highest count first.
pub async fn tally(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<Candidate>> {
    let standings = ElectionService::new(state.store.clone()).tally(id).await?;
    Ok(ApiResponse::success(standings))
}

/// GET /ssg/members - candidates across elections plus SSG-role accounts.
pub async fn members(State(state): State<AppState>) -> ApiResult<Vec<SsgMember>> {
    Ok(ApiResponse::success(
        ElectionService::new(state.store.clone()).members().await,
    ))
}

/// POST /ssg/event - record a student-government event.
pub async fn create_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateSsgEvent>,
) -> ApiResult<SsgEvent> {
    auth.require_any(&[Role::Ssg, Role::Registrar])?;

    let event = ElectionService::new(state.store.clone())
        .create_event(auth.id, payload)
        .await?;

    Ok(ApiResponse::created(event))
}

/// GET /ssg/events - public listing.
pub async fn events(State(state): State<AppState>) -> ApiResult<Vec<SsgEvent>> {
    Ok(ApiResponse::success(
        ElectionService::new(state.store.clone()).events().await,
    ))
}
