use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::models::TimeEntry;

pub struct NewEntry<'a> {
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub description: Option<&'a str>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_secs: Option<i64>,
    pub is_running: bool,
    pub hourly_rate: Option<f64>,
}

#[derive(Debug, Default, Clone)]
pub struct EntryFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub running: Option<bool>,
}

pub async fn insert(
    pool: &SqlitePool,
    user_id: Uuid,
    entry: NewEntry<'_>,
) -> Result<TimeEntry, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, TimeEntry>(
        "INSERT INTO time_entries
         (id, user_id, project_id, task_id, description, start_time, end_time,
          duration_secs, is_running, hourly_rate, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(user_id)
    .bind(entry.project_id)
    .bind(entry.task_id)
    .bind(entry.description)
    .bind(entry.start_time)
    .bind(entry.end_time)
    .bind(entry.duration_secs)
    .bind(entry.is_running)
    .bind(entry.hourly_rate)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(
    pool: &SqlitePool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<TimeEntry>, sqlx::Error> {
    sqlx::query_as::<_, TimeEntry>("SELECT * FROM time_entries WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_running(
    pool: &SqlitePool,
    user_id: Uuid,
) -> Result<Option<TimeEntry>, sqlx::Error> {
    sqlx::query_as::<_, TimeEntry>(
        "SELECT * FROM time_entries WHERE user_id = ? AND is_running = 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn list(
    pool: &SqlitePool,
    user_id: Uuid,
    filter: &EntryFilter,
) -> Result<Vec<TimeEntry>, sqlx::Error> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM time_entries WHERE user_id = ");
    qb.push_bind(user_id);

    if let Some(from) = filter.from {
        qb.push(" AND start_time >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND start_time <= ").push_bind(to);
    }
    if let Some(project_id) = filter.project_id {
        qb.push(" AND project_id = ").push_bind(project_id);
    }
    if let Some(task_id) = filter.task_id {
        qb.push(" AND task_id = ").push_bind(task_id);
    }
    if let Some(running) = filter.running {
        qb.push(" AND is_running = ").push_bind(running);
    }
    qb.push(" ORDER BY start_time ASC");

    qb.build_query_as::<TimeEntry>().fetch_all(pool).await
}

pub async fn mark_stopped(
    pool: &SqlitePool,
    id: Uuid,
    user_id: Uuid,
    end_time: DateTime<Utc>,
    duration_secs: i64,
) -> Result<TimeEntry, sqlx::Error> {
    sqlx::query_as::<_, TimeEntry>(
        "UPDATE time_entries SET end_time = ?, duration_secs = ?, is_running = 0, updated_at = ?
         WHERE id = ? AND user_id = ? RETURNING *",
    )
    .bind(end_time)
    .bind(duration_secs)
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Full-row update used by the edit path. The rate snapshot is deliberately
/// not a parameter here.
pub async fn update(
    pool: &SqlitePool,
    id: Uuid,
    user_id: Uuid,
    project_id: Option<Uuid>,
    task_id: Option<Uuid>,
    description: Option<&str>,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    duration_secs: Option<i64>,
) -> Result<TimeEntry, sqlx::Error> {
    sqlx::query_as::<_, TimeEntry>(
        "UPDATE time_entries
         SET project_id = ?, task_id = ?, description = ?, start_time = ?,
             end_time = ?, duration_secs = ?, updated_at = ?
         WHERE id = ? AND user_id = ? RETURNING *",
    )
    .bind(project_id)
    .bind(task_id)
    .bind(description)
    .bind(start_time)
    .bind(end_time)
    .bind(duration_secs)
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &SqlitePool, id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM time_entries WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
