//! Journal endpoints.

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
use crate::store::{
    JournalChanges, JournalEntry, JournalStore, NewJournalEntry, SharedStore,
    models::DEFAULT_JOURNAL_MOOD,
};

const ENTRY_NOT_FOUND: &str = "Journal entry not found";
const ENTRY_KIND: &str = "entry";

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateJournalRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub date: Option<String>,
    pub mood: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, ToSchema, Default)]
pub struct UpdateJournalRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub date: Option<String>,
    pub mood: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Trim tags and drop blanks and duplicates, keeping first-seen order.
fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !cleaned.iter().any(|existing| existing == tag) {
            cleaned.push(tag.to_string());
        }
    }
    cleaned
}

#[utoipa::path(
    get,
    path = "/journal",
    responses(
        (status = 200, description = "Caller's journal entries, most recent date first.", body = [JournalEntry]),
        (status = 401, description = "Missing or invalid session cookie."),
    ),
    tag = "journal"
)]
#[instrument(skip_all, fields(owner = %principal.username))]
pub async fn list_entries(
    principal: Principal,
    store: Extension<SharedStore>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = store.list_journal(&principal.username).await?;
    Ok(Json(DataResponse::new(entries)))
}

#[utoipa::path(
    post,
    path = "/journal",
    request_body = CreateJournalRequest,
    responses(
        (status = 201, description = "Journal entry created.", body = JournalEntry),
        (status = 400, description = "Invalid input."),
        (status = 401, description = "Missing or invalid session cookie."),
    ),
    tag = "journal"
)]
#[instrument(skip_all, fields(owner = %principal.username))]
pub async fn create_entry(
    principal: Principal,
    store: Extension<SharedStore>,
    payload: Result<Json<CreateJournalRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let entry = NewJournalEntry {
        title: required_text(request.title, "Title")?,
        content: required_text(request.content, "Content")?,
        date: parse_client_date(request.date.as_deref(), "date")?.unwrap_or_else(Utc::now),
        mood: optional_text(request.mood, "Mood")?
            .unwrap_or_else(|| DEFAULT_JOURNAL_MOOD.to_string()),
        tags: clean_tags(request.tags.unwrap_or_default()),
    };

    let entry = store
        .create_journal_entry(&principal.username, entry)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(entry))))
}

#[utoipa::path(
    get,
    path = "/journal/{id}",
    params(("id" = String, Path, description = "Journal entry id")),
    responses(
        (status = 200, description = "Journal entry.", body = JournalEntry),
        (status = 400, description = "Invalid id."),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "Journal entry not found."),
    ),
    tag = "journal"
)]
#[instrument(skip_all, fields(owner = %principal.username))]
pub async fn get_entry(
    principal: Principal,
    store: Extension<SharedStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_record_id(&id, ENTRY_KIND)?;
    store
        .get_journal_entry(&principal.username, id)
        .await?
        .map(|entry| Json(DataResponse::new(entry)))
        .ok_or_else(|| ApiError::NotFound(ENTRY_NOT_FOUND.to_string()))
}

#[utoipa::path(
    put,
    path = "/journal/{id}",
    params(("id" = String, Path, description = "Journal entry id")),
    request_body = UpdateJournalRequest,
    responses(
        (status = 200, description = "Journal entry updated.", body = JournalEntry),
        (status = 400, description = "Invalid id or input."),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "Journal entry not found."),
    ),
    tag = "journal"
)]
#[instrument(skip_all, fields(owner = %principal.username))]
pub async fn update_entry(
    principal: Principal,
    store: Extension<SharedStore>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateJournalRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_record_id(&id, ENTRY_KIND)?;
    let Json(request) = payload?;
    let changes = JournalChanges {
        title: optional_text(request.title, "Title")?,
        content: optional_text(request.content, "Content")?,
        date: parse_client_date(request.date.as_deref(), "date")?,
        mood: optional_text(request.mood, "Mood")?,
        tags: request.tags.map(clean_tags),
    };

    store
        .update_journal_entry(&principal.username, id, changes)
        .await?
        .map(|entry| Json(DataResponse::new(entry)))
        .ok_or_else(|| ApiError::NotFound(ENTRY_NOT_FOUND.to_string()))
}

#[utoipa::path(
    delete,
    path = "/journal/{id}",
    params(("id" = String, Path, description = "Journal entry id")),
    responses(
        (status = 200, description = "Journal entry deleted.", body = DeleteResponse),
        (status = 400, description = "Invalid id."),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "Journal entry not found."),
    ),
    tag = "journal"
)]
#[instrument(skip_all, fields(owner = %principal.username))]
pub async fn delete_entry(
    principal: Principal,
    store: Extension<SharedStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_record_id(&id, ENTRY_KIND)?;
    if !store
        .delete_journal_entry(&principal.username, id)
        .await?
    {
        return Err(ApiError::NotFound(ENTRY_NOT_FOUND.to_string()));
    }
    Ok(Json(DeleteResponse {
        success: true,
        message: Some("Journal entry deleted successfully".to_string()),
    }))
}
