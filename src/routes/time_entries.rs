use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::time_entries::EntryFilter;
use crate::error::AppError;
use crate::models::TimeEntry;
use crate::state::SharedState;
use crate::timer;

#[derive(Deserialize)]
pub struct ListParams {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub running: Option<bool>,
}

impl From<ListParams> for EntryFilter {
    fn from(p: ListParams) -> Self {
        EntryFilter {
            from: p.from,
            to: p.to,
            project_id: p.project_id,
            task_id: p.task_id,
            running: p.running,
        }
    }
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<TimeEntry>>, AppError> {
    let entries = db::time_entries::list(&state.pool, auth.user_id, &params.into()).await?;
    Ok(Json(entries))
}

pub async fn start(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<timer::StartTimer>,
) -> Result<Json<TimeEntry>, AppError> {
    let entry = timer::start(&state.pool, &state.events, auth.user_id, req).await?;
    Ok(Json(entry))
}

/// The active timer, or `null` when idle.
pub async fn current(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Option<TimeEntry>>, AppError> {
    let entry = db::time_entries::find_running(&state.pool, auth.user_id).await?;
    Ok(Json(entry))
}

pub async fn stop(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    body: Option<Json<timer::StopTimer>>,
) -> Result<Json<TimeEntry>, AppError> {
    let req = body
        .map(|Json(b)| b)
        .unwrap_or(timer::StopTimer { end_time: None });
    let entry = timer::stop(&state.pool, &state.events, auth.user_id, id, req).await?;
    Ok(Json(entry))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<timer::CreateEntry>,
) -> Result<Json<TimeEntry>, AppError> {
    let entry = timer::create(&state.pool, &state.events, auth.user_id, req).await?;
    Ok(Json(entry))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TimeEntry>, AppError> {
    let entry = db::time_entries::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Time entry not found".to_string()))?;
    Ok(Json(entry))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<timer::UpdateEntry>,
) -> Result<Json<TimeEntry>, AppError> {
    let entry = timer::update(&state.pool, &state.events, auth.user_id, id, req).await?;
    Ok(Json(entry))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    timer::delete(&state.pool, &state.events, auth.user_id, id).await?;
    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
