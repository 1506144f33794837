//! HTTP handlers for meeting and analysis records.
//! Every handler requires a `Session`; ownership checks live in
//! `MeetingService`.

use crate::{
    auth::Session,
    errors::AppError,
    models::{
        analysis::{Analysis, NewAnalysis},
        meeting::{Meeting, MeetingPatch, NewMeeting},
    },
    services::meetings::CascadeOutcome,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

/// `POST /meetings`
pub async fn create_meeting(
    State(state): State<AppState>,
    session: Session,
    Json(new): Json<NewMeeting>,
) -> Result<impl IntoResponse, AppError> {
    if new.title.trim().is_empty() {
        return Err(AppError::invalid("title must not be empty"));
    }
    let meeting = state.meetings.create_meeting(&session, new).await?;
    Ok((StatusCode::CREATED, Json(meeting)))
}

/// `GET /meetings`: newest first.
pub async fn list_meetings(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Meeting>>, AppError> {
    Ok(Json(state.meetings.list_meetings(&session).await?))
}

/// `GET /meetings/{id}`
pub async fn get_meeting(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Meeting>, AppError> {
    Ok(Json(state.meetings.get_meeting(&session, id).await?))
}

/// `PATCH /meetings/{id}`
pub async fn update_meeting(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(patch): Json<MeetingPatch>,
) -> Result<Json<Meeting>, AppError> {
    if patch.is_empty() {
        return Err(AppError::invalid("no fields to update"));
    }
    Ok(Json(state.meetings.update_meeting(&session, id, patch).await?))
}

/// `DELETE /meetings/{id}`: also removes the meeting's analyses.
pub async fn delete_meeting(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<CascadeOutcome>, AppError> {
    Ok(Json(state.meetings.delete_meeting(&session, id).await?))
}

/// `POST /meetings/{id}/analysis`
pub async fn create_analysis(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(new): Json<NewAnalysis>,
) -> Result<impl IntoResponse, AppError> {
    let analysis = state.meetings.create_analysis(&session, id, new).await?;
    Ok((StatusCode::CREATED, Json(analysis)))
}

/// `GET /meetings/{id}/analysis`
pub async fn get_analysis(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Analysis>, AppError> {
    state
        .meetings
        .get_analysis_for_meeting(&session, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("no analysis for meeting `{}`", id)))
}

/// `DELETE /analysis/{id}`
pub async fn delete_analysis(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.meetings.delete_analysis(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
