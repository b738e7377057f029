//! Ownership checks that run before any list or task operation.
//!
//! Every handler resolves its target through one of these functions first:
//! unknown ids turn into 404 and other users' records into 403, so the
//! repositories and the ordering engine only ever see records the caller is
//! allowed to touch.

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::{
    db::entities::{task, todo_list},
    db::todo_repo,
    error::AppError,
};

const UNACCESSIBLE_LIST_MESSAGE: &str = "This to-do list is not yours!";
const UNACCESSIBLE_TASK_MESSAGE: &str = "This task is not yours!";

pub async fn owned_list(
    db: &DatabaseConnection,
    list_id: &Uuid,
    user_id: &Uuid,
) -> Result<todo_list::Model, AppError> {
    let list = todo_repo::find_list_by_id(db, list_id)
        .await?
        .ok_or_else(|| AppError::not_found("To-do list not found"))?;
    if list.owner_id != *user_id {
        return Err(AppError::forbidden(UNACCESSIBLE_LIST_MESSAGE));
    }
    Ok(list)
}

pub async fn owned_task(
    db: &DatabaseConnection,
    task_id: &Uuid,
    user_id: &Uuid,
) -> Result<task::Model, AppError> {
    let task = todo_repo::find_task_by_id(db, task_id)
        .await?
        .ok_or_else(|| AppError::not_found("Task not found"))?;
    let list = todo_repo::find_list_by_id(db, &task.list_id)
        .await?
        .ok_or_else(|| AppError::not_found("To-do list not found"))?;
    if list.owner_id != *user_id {
        return Err(AppError::forbidden(UNACCESSIBLE_TASK_MESSAGE));
    }
    Ok(task)
}
