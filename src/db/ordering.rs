//! Order maintenance for the tasks of a list.
//!
//! Every list keeps its tasks numbered with a dense `1..=count` range in the
//! `order` column. The three operations here (append, remove, move) are the
//! only writers of that column, and each one runs as a single transaction
//! that leaves the range dense again on commit.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, ExprTrait},
};
use uuid::Uuid;

use super::entities::prelude::{Task, TodoList};
use super::entities::task;

#[derive(Debug, thiserror::Error)]
pub enum OrderingError {
    #[error("task not found (id={0})")]
    TaskNotFound(Uuid),
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),
}

pub type OrderingResult<T> = Result<T, OrderingError>;

/// Create a task at the end of its list: `order = max(order) + 1`, or 1 for
/// an empty list. Existing tasks are untouched.
pub async fn append_task(
    db: &DatabaseConnection,
    list_id: Uuid,
    title: &str,
) -> OrderingResult<task::Model> {
    let txn = db.begin().await?;
    lock_list(&txn, list_id).await?;

    let last = Task::find()
        .filter(task::Column::ListId.eq(list_id))
        .order_by_desc(task::Column::Order)
        .one(&txn)
        .await?;
    let next_order = last.map_or(1, |t| t.order + 1);

    let model = task::ActiveModel {
        id: Set(Uuid::new_v4()),
        list_id: Set(list_id),
        title: Set(title.to_string()),
        is_done: Set(false),
        order: Set(next_order),
        ..Default::default()
    };
    let created = model.insert(&txn).await?;

    txn.commit().await?;
    Ok(created)
}

/// Delete a task and close the gap: every sibling with a greater `order`
/// comes down by one.
pub async fn remove_task(db: &DatabaseConnection, task_id: Uuid) -> OrderingResult<()> {
    let txn = db.begin().await?;
    let task = locked_task(&txn, task_id).await?;

    Task::update_many()
        .col_expr(task::Column::Order, Expr::col(task::Column::Order).sub(1))
        .filter(task::Column::ListId.eq(task.list_id))
        .filter(task::Column::Order.gt(task.order))
        .exec(&txn)
        .await?;
    Task::delete_by_id(task.id).exec(&txn).await?;

    txn.commit().await?;
    Ok(())
}

/// Move a task to `requested_order`, clamped into `1..=count`. Out-of-range
/// requests are how clients say "top" or "bottom" without knowing the list
/// length. The siblings between the old and new position shift by one to
/// make room; everything else keeps its order.
pub async fn move_task(
    db: &DatabaseConnection,
    task_id: Uuid,
    requested_order: i32,
) -> OrderingResult<()> {
    let txn = db.begin().await?;
    let task = locked_task(&txn, task_id).await?;

    let count = Task::find()
        .filter(task::Column::ListId.eq(task.list_id))
        .count(&txn)
        .await?;
    let MovePlan::Move { target, shift } = plan_move(task.order, count, requested_order) else {
        txn.commit().await?;
        return Ok(());
    };

    match shift {
        // Moving toward the front: push [target, old) up by one.
        Shift::TowardFront { lower, upper } => {
            Task::update_many()
                .col_expr(task::Column::Order, Expr::col(task::Column::Order).add(1))
                .filter(task::Column::ListId.eq(task.list_id))
                .filter(task::Column::Order.gte(lower))
                .filter(task::Column::Order.lte(upper))
                .exec(&txn)
                .await?;
        }
        // Moving toward the back: pull (old, target] down by one.
        Shift::TowardBack { lower, upper } => {
            Task::update_many()
                .col_expr(task::Column::Order, Expr::col(task::Column::Order).sub(1))
                .filter(task::Column::ListId.eq(task.list_id))
                .filter(task::Column::Order.gte(lower))
                .filter(task::Column::Order.lte(upper))
                .exec(&txn)
                .await?;
        }
    }

    let mut active = task.into_active_model();
    active.order = Set(target);
    active.updated_at = Set(chrono::Utc::now().fixed_offset());
    active.update(&txn).await?;

    txn.commit().await?;
    Ok(())
}

/// Lock the parent list row for the duration of the transaction. The list
/// row serves as the ordering lock: concurrent append/remove/move calls on
/// the same list queue up here, while other lists stay untouched. SQLite has
/// no row locks and serializes on its writer lock instead.
async fn lock_list(txn: &DatabaseTransaction, list_id: Uuid) -> OrderingResult<()> {
    let _ = TodoList::find_by_id(list_id)
        .lock_exclusive()
        .one(txn)
        .await?;
    Ok(())
}

/// Resolve a task and take its list's ordering lock. The task row is
/// re-read after the lock is held so its `order` cannot be stale.
async fn locked_task(txn: &DatabaseTransaction, task_id: Uuid) -> OrderingResult<task::Model> {
    let task = Task::find_by_id(task_id)
        .one(txn)
        .await?
        .ok_or(OrderingError::TaskNotFound(task_id))?;
    lock_list(txn, task.list_id).await?;
    Task::find_by_id(task_id)
        .one(txn)
        .await?
        .ok_or(OrderingError::TaskNotFound(task_id))
}

#[derive(Debug, PartialEq, Eq)]
enum MovePlan {
    /// The clamped destination equals the current position.
    Stay,
    Move { target: i32, shift: Shift },
}

#[derive(Debug, PartialEq, Eq)]
enum Shift {
    /// `old > target`: the half-open range `[target, old)` gains one.
    TowardFront { lower: i32, upper: i32 },
    /// `old < target`: the half-open range `(old, target]` loses one.
    TowardBack { lower: i32, upper: i32 },
}

fn plan_move(current_order: i32, task_count: u64, requested_order: i32) -> MovePlan {
    // `Ord::max`, spelled out: `ExprTrait` is in scope and also has a `max`.
    let count = Ord::max(i32::try_from(task_count).unwrap_or(i32::MAX), 1);
    let target = requested_order.clamp(1, count);

    if target == current_order {
        return MovePlan::Stay;
    }

    let shift = if target < current_order {
        Shift::TowardFront {
            lower: target,
            upper: current_order - 1,
        }
    } else {
        Shift::TowardBack {
            lower: current_order + 1,
            upper: target,
        }
    };
    MovePlan::Move { target, shift }
}
