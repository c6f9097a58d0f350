use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::Project;

pub async fn list(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT * FROM projects WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn create(
    pool: &SqlitePool,
    user_id: Uuid,
    name: &str,
    hourly_rate: Option<f64>,
    color: Option<&str>,
) -> Result<Project, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, Project>(
        "INSERT INTO projects (id, user_id, name, hourly_rate, is_active, color, created_at, updated_at)
         VALUES (?, ?, ?, ?, 1, ?, ?, ?) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(user_id)
    .bind(name)
    .bind(hourly_rate)
    .bind(color)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(
    pool: &SqlitePool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ? AND user_id = ?")
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
    is_active: bool,
    color: Option<&str>,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects SET name = ?, hourly_rate = ?, is_active = ?, color = ?, updated_at = ?
         WHERE id = ? AND user_id = ? RETURNING *",
    )
    .bind(name)
    .bind(hourly_rate)
    .bind(is_active)
    .bind(color)
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Delete a project, detaching rather than destroying historical data.
///
/// Entries whose only reference was this project would be left pointing at
/// nothing at all, so they are purged; entries that also reference a task
/// keep the task link with `project_id` nulled. The project's tasks are
/// detached the same way.
pub async fn delete(pool: &SqlitePool, id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM time_entries WHERE user_id = ? AND project_id = ? AND task_id IS NULL",
    )
    .bind(user_id)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE time_entries SET project_id = NULL WHERE user_id = ? AND project_id = ?")
        .bind(user_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE tasks SET project_id = NULL WHERE user_id = ? AND project_id = ?")
        .bind(user_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM projects WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}
