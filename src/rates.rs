//! Hourly-rate resolution: task rate wins over project rate wins over the
//! user's default. The resolved value is snapshotted onto the entry at
//! creation and never re-resolved.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db;

/// Strict priority pick, first non-null wins.
pub fn pick_rate(
    task_rate: Option<f64>,
    project_rate: Option<f64>,
    default_rate: Option<f64>,
) -> Option<f64> {
    task_rate.or(project_rate).or(default_rate)
}

/// Resolve the rate to snapshot onto a new entry. A missing project or task
/// is not an error here, just "no rate at that level"; ownership is checked
/// by the caller before anything is created.
pub async fn resolve_hourly_rate(
    pool: &SqlitePool,
    user_id: Uuid,
    project_id: Option<Uuid>,
    task_id: Option<Uuid>,
) -> Result<Option<f64>, sqlx::Error> {
    let task_rate = match task_id {
        Some(id) => db::tasks::find_by_id(pool, id, user_id)
            .await?
            .and_then(|t| t.hourly_rate),
        None => None,
    };
    if task_rate.is_some() {
        return Ok(task_rate);
    }

    let project_rate = match project_id {
        Some(id) => db::projects::find_by_id(pool, id, user_id)
            .await?
            .and_then(|p| p.hourly_rate),
        None => None,
    };
    if project_rate.is_some() {
        return Ok(project_rate);
    }

    Ok(db::users::find_by_id(pool, user_id)
        .await?
        .and_then(|u| u.default_hourly_rate))
}
