//! Task endpoints
//!
//! All handlers run behind the auth middleware and only ever see the
//! caller's own tasks. An id that is malformed, unknown, or owned by
//! someone else is the same 404.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use taskmint_common::{filter_tasks, PriorityFilter, StatusFilter, Task, TaskPatch, TaskStats};
use tracing::{debug, info};
use uuid::Uuid;

use super::json_rejection;
use crate::auth::AuthUser;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::services;
use crate::AppState;

/// Query string of `GET /tasks`; absent means `all`
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub stats: TaskStats,
}

fn task_not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

fn parse_task_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| task_not_found())
}

/// POST /tasks/generate
///
/// Body: `{"transcript": "<text>"}`. A missing, non-string or blank
/// transcript is rejected before the model is called.
pub async fn generate_tasks(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(body) = body.map_err(json_rejection)?;
    let transcript = body
        .get("transcript")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::BadRequest("Transcript is required".to_string()))?;

    debug!(user = %caller.id, chars = transcript.len(), "Generating tasks");

    let batch = services::generate_tasks(&state.db, state.llm.as_ref(), caller.id, transcript)
        .await
        .map_err(|e| e.with_context("Failed to generate tasks"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Tasks generated successfully",
            "tasks": batch.tasks,
        })),
    ))
}

/// GET /tasks?status=..&priority=..
///
/// Filters apply to `tasks` only; `stats` always covers the full set.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<TaskListResponse>> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let status = match query.status.as_deref() {
        Some(raw) => raw.parse::<StatusFilter>()?,
        None => StatusFilter::All,
    };
    let priority = match query.priority.as_deref() {
        Some(raw) => raw.parse::<PriorityFilter>()?,
        None => PriorityFilter::All,
    };

    let all = db::tasks::list_tasks(&state.db, caller.id)
        .await
        .map_err(|e| ApiError::from(e).with_context("Failed to fetch tasks"))?;

    let stats = TaskStats::from_tasks(&all);
    let tasks = filter_tasks(&all, status, priority)
        .into_iter()
        .cloned()
        .collect();

    Ok(Json(TaskListResponse { tasks, stats }))
}

/// GET /tasks/stats
pub async fn task_stats(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<TaskStats>> {
    let all = db::tasks::list_tasks(&state.db, caller.id)
        .await
        .map_err(|e| ApiError::from(e).with_context("Failed to fetch tasks"))?;

    Ok(Json(TaskStats::from_tasks(&all)))
}

/// PATCH /tasks/:id
pub async fn update_task(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<TaskPatch>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let id = parse_task_id(&id)?;
    let Json(patch) = body.map_err(json_rejection)?;
    let patch = patch.validated()?;

    let task = db::tasks::update_task(&state.db, caller.id, id, &patch)
        .await
        .map_err(|e| ApiError::from(e).with_context("Failed to update task"))?;

    info!(user = %caller.id, task = %task.id, "Updated task");

    Ok(Json(json!({
        "message": "Task updated successfully",
        "task": task,
    })))
}

/// DELETE /tasks/:id
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_task_id(&id)?;

    db::tasks::delete_task(&state.db, caller.id, id)
        .await
        .map_err(|e| ApiError::from(e).with_context("Failed to delete task"))?;

    info!(user = %caller.id, task = %id, "Deleted task");

    Ok(Json(json!({ "message": "Task deleted successfully" })))
}

/// DELETE /tasks
pub async fn delete_all_tasks(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    let deleted = db::tasks::delete_all_tasks(&state.db, caller.id)
        .await
        .map_err(|e| ApiError::from(e).with_context("Failed to delete tasks"))?;

    info!(user = %caller.id, deleted, "Deleted all tasks");

    Ok(Json(json!({
        "message": "All tasks deleted successfully",
        "deleted": deleted,
    })))
}

/// GET /tasks/export
///
/// Pretty-printed snapshot in list order, served as a download.
pub async fn export_tasks(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Response> {
    let tasks = db::tasks::list_tasks(&state.db, caller.id)
        .await
        .map_err(|e| ApiError::from(e).with_context("Failed to export tasks"))?;

    let body = serde_json::to_string_pretty(&tasks).map_err(|e| ApiError::Internal {
        message: "Failed to export tasks",
        detail: e.to_string(),
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CONTENT_DISPOSITION, "attachment; filename=tasks.json"),
        ],
        body,
    )
        .into_response())
}
