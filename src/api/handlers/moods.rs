//! Mood log endpoints.

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;
use utoipa::ToSchema;

use super::{
    DataResponse, DeleteResponse, auth::Principal, error::ApiError, optional_text,
    parse_client_date, parse_record_id, required_text,
};
use crate::store::{Mood, MoodChanges, MoodStore, NewMood, SharedStore};

const MOOD_NOT_FOUND: &str = "Mood not found";

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMoodRequest {
    pub mood: Option<String>,
    pub note: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Default)]
pub struct UpdateMoodRequest {
    pub mood: Option<String>,
    pub note: Option<String>,
    pub date: Option<String>,
}

#[utoipa::path(
    get,
    path = "/mood",
    responses(
        (status = 200, description = "Caller's mood entries, newest first.", body = [Mood]),
        (status = 401, description = "Missing or invalid session cookie."),
    ),
    tag = "moods"
)]
#[instrument(skip_all, fields(owner = %principal.username))]
pub async fn list_moods(
    principal: Principal,
    store: Extension<SharedStore>,
) -> Result<impl IntoResponse, ApiError> {
    let moods = store.list_moods(&principal.username).await?;
    Ok(Json(DataResponse::new(moods)))
}

#[utoipa::path(
    post,
    path = "/mood",
    request_body = CreateMoodRequest,
    responses(
        (status = 201, description = "Mood logged.", body = Mood),
        (status = 400, description = "Invalid input."),
        (status = 401, description = "Missing or invalid session cookie."),
    ),
    tag = "moods"
)]
#[instrument(skip_all, fields(owner = %principal.username))]
pub async fn create_mood(
    principal: Principal,
    store: Extension<SharedStore>,
    payload: Result<Json<CreateMoodRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let mood = NewMood {
        mood: required_text(request.mood, "Mood")?,
        // notes may legitimately be blank
        note: request.note.unwrap_or_default(),
        date: parse_client_date(request.date.as_deref(), "date")?.unwrap_or_else(Utc::now),
    };

    let mood = store.create_mood(&principal.username, mood).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(mood))))
}

#[utoipa::path(
    put,
    path = "/mood/{id}",
    params(("id" = String, Path, description = "Mood entry id")),
    request_body = UpdateMoodRequest,
    responses(
        (status = 200, description = "Mood entry updated.", body = Mood),
        (status = 400, description = "Invalid id or input."),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "Mood entry not found."),
    ),
    tag = "moods"
)]
#[instrument(skip_all, fields(owner = %principal.username))]
pub async fn update_mood(
    principal: Principal,
    store: Extension<SharedStore>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateMoodRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_record_id(&id, "mood")?;
    let Json(request) = payload?;
    let changes = MoodChanges {
        mood: optional_text(request.mood, "Mood")?,
        note: request.note,
        date: parse_client_date(request.date.as_deref(), "date")?,
    };

    store
        .update_mood(&principal.username, id, changes)
        .await?
        .map(|mood| Json(DataResponse::new(mood)))
        .ok_or_else(|| ApiError::NotFound(MOOD_NOT_FOUND.to_string()))
}

#[utoipa::path(
    delete,
    path = "/mood/{id}",
    params(("id" = String, Path, description = "Mood entry id")),
    responses(
        (status = 200, description = "Mood entry deleted.", body = DeleteResponse),
        (status = 400, description = "Invalid id."),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "Mood entry not found."),
    ),
    tag = "moods"
)]
#[instrument(skip_all, fields(owner = %principal.username))]
pub async fn delete_mood(
    principal: Principal,
    store: Extension<SharedStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_record_id(&id, "mood")?;
    if !store.delete_mood(&principal.username, id).await? {
        return Err(ApiError::NotFound(MOOD_NOT_FOUND.to_string()));
    }
    Ok(Json(DeleteResponse {
        success: true,
        message: None,
    }))
}
