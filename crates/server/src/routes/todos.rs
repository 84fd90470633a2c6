use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use service::auth::VerifiedIdentity;
use service::todo::domain::{CreateTodoRequest, TodoItem, UpdateTodoRequest};

use super::ServerState;
use crate::errors::{ApiError, ApiJson};

#[derive(Debug, Serialize, Deserialize)]
pub struct TodoList {
    pub items: Vec<TodoItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedTodo {
    pub item: TodoItem,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrl {
    pub upload_url: String,
}

#[utoipa::path(get, path = "/todos", tag = "todos",
    responses((status = 200, description = "Caller's tasks, newest first", body = crate::openapi::TodoListDoc),
               (status = 401, description = "Unauthorized", body = crate::openapi::MessageDoc),
               (status = 500, description = "Failure", body = crate::openapi::MessageDoc)))]
pub async fn list(
    State(state): State<ServerState>,
    Extension(identity): Extension<VerifiedIdentity>,
) -> Result<Json<TodoList>, ApiError> {
    let items = state.todos.list(&identity.subject).await?;
    Ok(Json(TodoList { items }))
}

#[utoipa::path(post, path = "/todos", tag = "todos", request_body = crate::openapi::CreateTodoDoc,
    responses((status = 201, description = "Created", body = crate::openapi::CreatedTodoDoc),
               (status = 401, description = "Unauthorized", body = crate::openapi::MessageDoc),
               (status = 500, description = "Failure", body = crate::openapi::MessageDoc)))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(identity): Extension<VerifiedIdentity>,
    ApiJson(input): ApiJson<CreateTodoRequest>,
) -> Result<(StatusCode, Json<CreatedTodo>), ApiError> {
    let item = state.todos.create(&identity.subject, input).await?;
    Ok((StatusCode::CREATED, Json(CreatedTodo { item })))
}

#[utoipa::path(patch, path = "/todos/{todoId}", tag = "todos", request_body = crate::openapi::UpdateTodoDoc,
    params(("todoId" = String, Path, description = "Task id")),
    responses((status = 200, description = "Updated"),
               (status = 401, description = "Unauthorized", body = crate::openapi::MessageDoc),
               (status = 500, description = "Failure, including unknown task", body = crate::openapi::MessageDoc)))]
pub async fn update(
    State(state): State<ServerState>,
    Extension(identity): Extension<VerifiedIdentity>,
    Path(todo_id): Path<String>,
    ApiJson(input): ApiJson<UpdateTodoRequest>,
) -> Result<StatusCode, ApiError> {
    state.todos.update(&identity.subject, &todo_id, input).await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(delete, path = "/todos/{todoId}", tag = "todos",
    params(("todoId" = String, Path, description = "Task id")),
    responses((status = 200, description = "Deleted (also when already absent)"),
               (status = 401, description = "Unauthorized", body = crate::openapi::MessageDoc),
               (status = 500, description = "Failure", body = crate::openapi::MessageDoc)))]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(identity): Extension<VerifiedIdentity>,
    Path(todo_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.todos.delete(&identity.subject, &todo_id).await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(post, path = "/todos/{todoId}/attachment", tag = "todos",
    params(("todoId" = String, Path, description = "Task id")),
    responses((status = 200, description = "Signed upload URL", body = crate::openapi::UploadUrlDoc),
               (status = 401, description = "Unauthorized", body = crate::openapi::MessageDoc),
               (status = 500, description = "Failure, including unknown task", body = crate::openapi::MessageDoc)))]
pub async fn upload_url(
    State(state): State<ServerState>,
    Extension(identity): Extension<VerifiedIdentity>,
    Path(todo_id): Path<String>,
) -> Result<Json<UploadUrl>, ApiError> {
    let upload_url = state.todos.generate_upload_url(&identity.subject, &todo_id).await?;
    Ok(Json(UploadUrl { upload_url }))
}
