use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::time_entries::EntryFilter;
use crate::error::AppError;
use crate::models::TimeEntry;
use crate::reports;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ReportParams {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
}

/// Reports only ever see completed entries.
async fn completed_entries(
    state: &SharedState,
    user_id: Uuid,
    params: ReportParams,
) -> Result<Vec<TimeEntry>, AppError> {
    let filter = EntryFilter {
        from: params.from,
        to: params.to,
        project_id: params.project_id,
        task_id: params.task_id,
        running: Some(false),
    };
    Ok(db::time_entries::list(&state.pool, user_id, &filter).await?)
}

async fn project_names(
    state: &SharedState,
    user_id: Uuid,
) -> Result<HashMap<Uuid, String>, AppError> {
    Ok(db::projects::list(&state.pool, user_id)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect())
}

pub async fn summary(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ReportParams>,
) -> Result<Json<reports::SummaryReport>, AppError> {
    let entries = completed_entries(&state, auth.user_id, params).await?;
    let names = project_names(&state, auth.user_id).await?;
    Ok(Json(reports::summary(&entries, &names)))
}

pub async fn earnings(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ReportParams>,
) -> Result<Json<reports::EarningsReport>, AppError> {
    let entries = completed_entries(&state, auth.user_id, params).await?;
    let names = project_names(&state, auth.user_id).await?;
    Ok(Json(reports::earnings(&entries, &names)))
}

pub async fn export(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ReportParams>,
) -> Result<impl IntoResponse, AppError> {
    let entries = completed_entries(&state, auth.user_id, params).await?;
    let projects = project_names(&state, auth.user_id).await?;
    let tasks: HashMap<Uuid, String> = db::tasks::list(&state.pool, auth.user_id)
        .await?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect();

    let csv = reports::export_csv(&entries, &projects, &tasks);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"time-entries.csv\"",
            ),
        ],
        csv,
    ))
}
