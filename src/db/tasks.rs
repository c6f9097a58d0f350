use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::Task;

pub async fn list(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE user_id = ? ORDER BY created_at DESC")
        .bind(user_id)
        .fetch_all(pool)
        .await
}

pub async fn list_by_project(
    pool: &SqlitePool,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "SELECT * FROM tasks WHERE project_id = ? AND user_id = ? ORDER BY created_at DESC",
    )
    .bind(project_id)
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn create(
    pool: &SqlitePool,
    user_id: Uuid,
    project_id: Uuid,
    name: &str,
    hourly_rate: Option<f64>,
) -> Result<Task, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, Task>(
        "INSERT INTO tasks (id, user_id, project_id, name, hourly_rate, is_completed, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, 0, ?, ?) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(user_id)
    .bind(project_id)
    .bind(name)
    .bind(hourly_rate)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(
    pool: &SqlitePool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &SqlitePool,
    id: Uuid,
    user_id: Uuid,
    name: &str,
    hourly_rate: Option<f64>,
    is_completed: bool,
) -> Result<Task, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "UPDATE tasks SET name = ?, hourly_rate = ?, is_completed = ?, updated_at = ?
         WHERE id = ? AND user_id = ? RETURNING *",
    )
    .bind(name)
    .bind(hourly_rate)
    .bind(is_completed)
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Delete a task; its time entries are detached, never purged.
pub async fn delete(pool: &SqlitePool, id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE time_entries SET task_id = NULL WHERE user_id = ? AND task_id = ?")
        .bind(user_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}
