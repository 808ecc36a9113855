//! Task endpoints.
//!
//! Every handler is scoped to the caller: tasks owned by someone else behave
//! exactly like tasks that do not exist.

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use super::{
    DataResponse, DeleteResponse, auth::Principal, error::ApiError, optional_text,
    parse_client_date, parse_record_id, required_text,
};
use crate::store::{NewTask, SharedStore, Task, TaskChanges, TaskStore};

const TASK_NOT_FOUND: &str = "Task not found";

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<String>,
}

/// Partial update; omitted fields keep their value. A `null` or empty
/// `dueDate` clears it.
#[derive(Debug, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "super::deserialize_present")]
    #[schema(value_type = Option<String>)]
    pub due_date: Option<Option<String>>,
}

#[utoipa::path(
    get,
    path = "/task",
    responses(
        (status = 200, description = "Caller's tasks, earliest due date first.", body = [Task]),
        (status = 401, description = "Missing or invalid session cookie."),
    ),
    tag = "tasks"
)]
#[instrument(skip_all, fields(owner = %principal.username))]
pub async fn list_tasks(
    principal: Principal,
    store: Extension<SharedStore>,
) -> Result<impl IntoResponse, ApiError> {
    let tasks = store.list_tasks(&principal.username).await?;
    debug!("Listing {} tasks", tasks.len());
    Ok(Json(DataResponse::new(tasks)))
}

#[utoipa::path(
    post,
    path = "/task",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created.", body = Task),
        (status = 400, description = "Invalid input."),
        (status = 401, description = "Missing or invalid session cookie."),
    ),
    tag = "tasks"
)]
#[instrument(skip_all, fields(owner = %principal.username))]
pub async fn create_task(
    principal: Principal,
    store: Extension<SharedStore>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let task = NewTask {
        title: required_text(request.title, "Title")?,
        completed: request.completed.unwrap_or(false),
        due_date: parse_client_date(request.due_date.as_deref(), "dueDate")?,
    };

    let task = store.create_task(&principal.username, task).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(task))))
}

#[utoipa::path(
    put,
    path = "/task/{id}",
    params(("id" = String, Path, description = "Task id")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated.", body = Task),
        (status = 400, description = "Invalid id or input."),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "Task not found."),
    ),
    tag = "tasks"
)]
#[instrument(skip_all, fields(owner = %principal.username))]
pub async fn update_task(
    principal: Principal,
    store: Extension<SharedStore>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_record_id(&id, "task")?;
    let Json(request) = payload?;
    let changes = TaskChanges {
        title: optional_text(request.title, "Title")?,
        completed: request.completed,
        due_date: request
            .due_date
            .map(|raw| parse_client_date(raw.as_deref(), "dueDate"))
            .transpose()?,
    };

    match store.update_task(&principal.username, id, changes).await? {
        Some(task) => Ok(Json(DataResponse::new(task))),
        None => Err(ApiError::NotFound(TASK_NOT_FOUND.to_string())),
    }
}

#[utoipa::path(
    delete,
    path = "/task/{id}",
    params(("id" = String, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task deleted.", body = DeleteResponse),
        (status = 400, description = "Invalid id."),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "Task not found."),
    ),
    tag = "tasks"
)]
#[instrument(skip_all, fields(owner = %principal.username))]
pub async fn delete_task(
    principal: Principal,
    store: Extension<SharedStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_record_id(&id, "task")?;
    if store.delete_task(&principal.username, id).await? {
        Ok(Json(DeleteResponse {
            success: true,
            message: None,
        }))
    } else {
        Err(ApiError::NotFound(TASK_NOT_FOUND.to_string()))
    }
}
