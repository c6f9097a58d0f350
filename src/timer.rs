//! Timer lifecycle: start/stop plus manual create, edit and delete of time
//! entries. Enforces the one-running-timer-per-user invariant and computes
//! durations on stop.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db;
use crate::db::time_entries::NewEntry;
use crate::error::AppError;
use crate::events::EventBus;
use crate::models::TimeEntry;
use crate::rates;

const STOP_FIRST: &str = "A timer is already running. Stop it before starting a new one.";

#[derive(Debug, Deserialize)]
pub struct StartTimer {
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StopTimer {
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEntry {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub description: Option<String>,
}

/// Partial edit. `project_id`/`task_id` distinguish "absent" (keep) from
/// explicit `null` (detach) via the double Option.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateEntry {
    pub description: Option<String>,
    #[serde(default)]
    pub project_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub task_id: Option<Option<Uuid>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Wall-clock delta floored to whole seconds. Not clamped: an end before the
/// start yields a negative duration, persisted as-is.
pub fn elapsed_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_milliseconds().div_euclid(1000)
}

async fn check_project(
    pool: &SqlitePool,
    user_id: Uuid,
    project_id: Option<Uuid>,
) -> Result<(), AppError> {
    if let Some(id) = project_id {
        db::projects::find_by_id(pool, id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    }
    Ok(())
}

async fn check_task(
    pool: &SqlitePool,
    user_id: Uuid,
    task_id: Option<Uuid>,
) -> Result<(), AppError> {
    if let Some(id) = task_id {
        db::tasks::find_by_id(pool, id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;
    }
    Ok(())
}

pub async fn start(
    pool: &SqlitePool,
    events: &EventBus,
    user_id: Uuid,
    req: StartTimer,
) -> Result<TimeEntry, AppError> {
    // The conflict check comes before reference validation: with a timer
    // already running the answer is "stop it first" no matter what the new
    // request points at.
    if db::time_entries::find_running(pool, user_id).await?.is_some() {
        return Err(AppError::BadRequest(STOP_FIRST.to_string()));
    }

    check_project(pool, user_id, req.project_id).await?;
    check_task(pool, user_id, req.task_id).await?;

    let rate = rates::resolve_hourly_rate(pool, user_id, req.project_id, req.task_id).await?;

    let entry = db::time_entries::insert(
        pool,
        user_id,
        NewEntry {
            project_id: req.project_id,
            task_id: req.task_id,
            description: req.description.as_deref(),
            start_time: Utc::now(),
            end_time: None,
            duration_secs: None,
            is_running: true,
            hourly_rate: rate,
        },
    )
    .await
    .map_err(|e| match e {
        // Partial unique index backstops the read-then-write check, so two
        // racing starts can't both commit a running entry.
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::BadRequest(STOP_FIRST.to_string())
        }
        _ => AppError::Database(e),
    })?;

    publish(events, user_id, "time-entry-started", &entry);
    Ok(entry)
}

pub async fn stop(
    pool: &SqlitePool,
    events: &EventBus,
    user_id: Uuid,
    entry_id: Uuid,
    req: StopTimer,
) -> Result<TimeEntry, AppError> {
    let entry = db::time_entries::find_by_id(pool, entry_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Time entry not found".to_string()))?;

    if !entry.is_running {
        return Err(AppError::BadRequest("Timer is not running".to_string()));
    }

    let stop_time = req.end_time.unwrap_or_else(Utc::now);
    let duration = elapsed_seconds(entry.start_time, stop_time);

    let entry =
        db::time_entries::mark_stopped(pool, entry_id, user_id, stop_time, duration).await?;

    publish(events, user_id, "time-entry-stopped", &entry);
    Ok(entry)
}

pub async fn create(
    pool: &SqlitePool,
    events: &EventBus,
    user_id: Uuid,
    req: CreateEntry,
) -> Result<TimeEntry, AppError> {
    if req.end_time <= req.start_time {
        return Err(AppError::BadRequest(
            "End time must be after start time".to_string(),
        ));
    }

    check_project(pool, user_id, req.project_id).await?;
    check_task(pool, user_id, req.task_id).await?;

    let rate = rates::resolve_hourly_rate(pool, user_id, req.project_id, req.task_id).await?;
    let duration = elapsed_seconds(req.start_time, req.end_time);

    let entry = db::time_entries::insert(
        pool,
        user_id,
        NewEntry {
            project_id: req.project_id,
            task_id: req.task_id,
            description: req.description.as_deref(),
            start_time: req.start_time,
            end_time: Some(req.end_time),
            duration_secs: Some(duration),
            is_running: false,
            hourly_rate: rate,
        },
    )
    .await?;

    publish(events, user_id, "time-entry-created", &entry);
    Ok(entry)
}

pub async fn update(
    pool: &SqlitePool,
    events: &EventBus,
    user_id: Uuid,
    entry_id: Uuid,
    req: UpdateEntry,
) -> Result<TimeEntry, AppError> {
    let entry = db::time_entries::find_by_id(pool, entry_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Time entry not found".to_string()))?;

    let project_id = match req.project_id {
        Some(new) => {
            check_project(pool, user_id, new).await?;
            new
        }
        None => entry.project_id,
    };
    let task_id = match req.task_id {
        Some(new) => {
            check_task(pool, user_id, new).await?;
            new
        }
        None => entry.task_id,
    };

    let times_changed = req.start_time.is_some() || req.end_time.is_some();
    let start_time = req.start_time.unwrap_or(entry.start_time);
    let end_time = req.end_time.or(entry.end_time);
    let description = req.description.or_else(|| entry.description.clone());

    // Running entries skip the recompute and the end-after-start check
    // entirely; their duration is set on stop.
    let duration_secs = if !entry.is_running && times_changed {
        match end_time {
            Some(end) => {
                if end <= start_time {
                    return Err(AppError::BadRequest(
                        "End time must be after start time".to_string(),
                    ));
                }
                Some(elapsed_seconds(start_time, end))
            }
            None => entry.duration_secs,
        }
    } else {
        entry.duration_secs
    };

    let entry = db::time_entries::update(
        pool,
        entry_id,
        user_id,
        project_id,
        task_id,
        description.as_deref(),
        start_time,
        end_time,
        duration_secs,
    )
    .await?;

    publish(events, user_id, "time-entry-updated", &entry);
    Ok(entry)
}

pub async fn delete(
    pool: &SqlitePool,
    events: &EventBus,
    user_id: Uuid,
    entry_id: Uuid,
) -> Result<(), AppError> {
    db::time_entries::find_by_id(pool, entry_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Time entry not found".to_string()))?;

    db::time_entries::delete(pool, entry_id, user_id).await?;

    events.publish(
        user_id,
        "time-entry-deleted",
        serde_json::json!({ "id": entry_id }),
    );
    Ok(())
}

fn publish(events: &EventBus, user_id: Uuid, name: &str, entry: &TimeEntry) {
    events.publish(
        user_id,
        name,
        serde_json::to_value(entry).unwrap_or(serde_json::Value::Null),
    );
}
