use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, patch, post, put},
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{Claims, jwt::jwt_auth},
    db::entities::{task, todo_list},
    db::{ordering, todo_repo},
    error::AppError,
    guard,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameListRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub is_done: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct MoveTaskRequest {
    /// Any integer; the engine clamps it into the list's range.
    pub order: i32,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub list_id: Uuid,
    pub title: String,
    pub is_done: bool,
    pub order: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/lists", post(create_list).get(my_lists))
        .route("/lists/{list_id}", patch(rename_list).delete(delete_list))
        .route("/lists/{list_id}/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{task_id}", patch(update_task).delete(delete_task))
        .route("/tasks/{task_id}/order", put(move_task))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth))
        .with_state(state)
}

async fn create_list(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Json(body): Json<CreateListRequest>,
) -> Result<(StatusCode, Json<ListResponse>), AppError> {
    let user_id = claims.user_id()?;
    let title = normalize_title(&body.title)?;
    let list = todo_repo::create_list(&state.db, &user_id, title).await?;
    Ok((StatusCode::CREATED, Json(list.into())))
}

async fn my_lists(
    State(state): State<Arc<AppState>>,
    claims: Claims,
) -> Result<Json<Vec<ListResponse>>, AppError> {
    let user_id = claims.user_id()?;
    let lists = todo_repo::lists_for_owner(&state.db, &user_id).await?;
    Ok(Json(lists.into_iter().map(ListResponse::from).collect()))
}

async fn rename_list(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Path(list_id): Path<Uuid>,
    Json(body): Json<RenameListRequest>,
) -> Result<Json<ListResponse>, AppError> {
    let user_id = claims.user_id()?;
    let title = normalize_title(&body.title)?;
    let list = guard::owned_list(&state.db, &list_id, &user_id).await?;
    let list = todo_repo::rename_list(&state.db, list, title).await?;
    Ok(Json(list.into()))
}

async fn delete_list(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Path(list_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let user_id = claims.user_id()?;
    guard::owned_list(&state.db, &list_id, &user_id).await?;
    let deleted = todo_repo::delete_list(&state.db, &list_id).await?;
    if !deleted {
        return Err(AppError::not_found("To-do list not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_tasks(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Path(list_id): Path<Uuid>,
) -> Result<Json<Vec<TaskResponse>>, AppError> {
    let user_id = claims.user_id()?;
    guard::owned_list(&state.db, &list_id, &user_id).await?;
    let tasks = todo_repo::tasks_for_list(&state.db, &list_id).await?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

async fn create_task(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Path(list_id): Path<Uuid>,
    Json(body): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), AppError> {
    let user_id = claims.user_id()?;
    let title = normalize_title(&body.title)?;
    guard::owned_list(&state.db, &list_id, &user_id).await?;
    let task = ordering::append_task(&state.db, list_id, title).await?;
    Ok((StatusCode::CREATED, Json(task.into())))
}

async fn update_task(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Path(task_id): Path<Uuid>,
    Json(body): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, AppError> {
    let user_id = claims.user_id()?;
    let UpdateTaskRequest { title, is_done } = body;
    let title = match title {
        Some(value) => Some(normalize_title(&value)?.to_string()),
        None => None,
    };
    if title.is_none() && is_done.is_none() {
        return Err(AppError::bad_request("Title or is_done required"));
    }
    let task = guard::owned_task(&state.db, &task_id, &user_id).await?;
    let task = todo_repo::update_task(&state.db, task, title, is_done).await?;
    Ok(Json(task.into()))
}

async fn delete_task(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Path(task_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let user_id = claims.user_id()?;
    let task = guard::owned_task(&state.db, &task_id, &user_id).await?;
    ordering::remove_task(&state.db, task.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn move_task(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Path(task_id): Path<Uuid>,
    Json(body): Json<MoveTaskRequest>,
) -> Result<StatusCode, AppError> {
    let user_id = claims.user_id()?;
    let task = guard::owned_task(&state.db, &task_id, &user_id).await?;
    ordering::move_task(&state.db, task.id, body.order).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn normalize_title(title: &str) -> Result<&str, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request("Title required"));
    }
    Ok(trimmed)
}

impl From<todo_list::Model> for ListResponse {
    fn from(model: todo_list::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<task::Model> for TaskResponse {
    fn from(model: task::Model) -> Self {
        Self {
            id: model.id,
            list_id: model.list_id,
            title: model.title,
            is_done: model.is_done,
            order: model.order,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
