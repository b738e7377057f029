use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::prelude::{Task, TodoList};
use super::entities::{task, todo_list};

pub async fn create_list(
    db: &DatabaseConnection,
    owner_id: &Uuid,
    title: &str,
) -> Result<todo_list::Model, sea_orm::DbErr> {
    let model = todo_list::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        owner_id: Set(*owner_id),
        ..Default::default()
    };
    model.insert(db).await
}

/// All lists owned by a user, newest first.
pub async fn lists_for_owner(
    db: &DatabaseConnection,
    owner_id: &Uuid,
) -> Result<Vec<todo_list::Model>, sea_orm::DbErr> {
    TodoList::find()
        .filter(todo_list::Column::OwnerId.eq(*owner_id))
        .order_by_desc(todo_list::Column::CreatedAt)
        .all(db)
        .await
}

pub async fn find_list_by_id(
    db: &DatabaseConnection,
    id: &Uuid,
) -> Result<Option<todo_list::Model>, sea_orm::DbErr> {
    TodoList::find_by_id(*id).one(db).await
}

pub async fn rename_list(
    db: &DatabaseConnection,
    list: todo_list::Model,
    title: &str,
) -> Result<todo_list::Model, sea_orm::DbErr> {
    let mut active: todo_list::ActiveModel = list.into();
    active.title = Set(title.to_string());
    active.updated_at = Set(Utc::now().fixed_offset());
    active.update(db).await
}

/// Tasks cascade at the database level.
pub async fn delete_list(db: &DatabaseConnection, id: &Uuid) -> Result<bool, sea_orm::DbErr> {
    let result = TodoList::delete_by_id(*id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

/// A list's tasks in display order: descending `order`, newest slot first.
pub async fn tasks_for_list(
    db: &DatabaseConnection,
    list_id: &Uuid,
) -> Result<Vec<task::Model>, sea_orm::DbErr> {
    Task::find()
        .filter(task::Column::ListId.eq(*list_id))
        .order_by_desc(task::Column::Order)
        .all(db)
        .await
}

pub async fn find_task_by_id(
    db: &DatabaseConnection,
    id: &Uuid,
) -> Result<Option<task::Model>, sea_orm::DbErr> {
    Task::find_by_id(*id).one(db).await
}

pub async fn update_task(
    db: &DatabaseConnection,
    task: task::Model,
    title: Option<String>,
    is_done: Option<bool>,
) -> Result<task::Model, sea_orm::DbErr> {
    let mut active: task::ActiveModel = task.into();
    if let Some(title) = title {
        active.title = Set(title);
    }
    if let Some(is_done) = is_done {
        active.is_done = Set(is_done);
    }
    active.updated_at = Set(Utc::now().fixed_offset());
    active.update(db).await
}
