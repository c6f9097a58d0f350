use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::Task;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateTask {
    pub name: String,
    pub hourly_rate: Option<f64>,
}

#[derive(Deserialize)]
pub struct UpdateTask {
    pub name: String,
    pub hourly_rate: Option<f64>,
    pub is_completed: bool,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = db::tasks::list(&state.pool, auth.user_id).await?;
    Ok(Json(tasks))
}

pub async fn list_by_project(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Task>>, AppError> {
    db::projects::find_by_id(&state.pool, project_id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let tasks = db::tasks::list_by_project(&state.pool, project_id, auth.user_id).await?;
    Ok(Json(tasks))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateTask>,
) -> Result<Json<Task>, AppError> {
    if req.name.is_empty() {
        return Err(AppError::BadRequest("Name must not be empty".to_string()));
    }

    db::projects::find_by_id(&state.pool, project_id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let task = db::tasks::create(
        &state.pool,
        auth.user_id,
        project_id,
        &req.name,
        req.hourly_rate,
    )
    .await?;

    state.events.publish(
        auth.user_id,
        "task-created",
        serde_json::to_value(&task).unwrap_or(serde_json::Value::Null),
    );

    Ok(Json(task))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, AppError> {
    let task = db::tasks::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;
    Ok(Json(task))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTask>,
) -> Result<Json<Task>, AppError> {
    if req.name.is_empty() {
        return Err(AppError::BadRequest("Name must not be empty".to_string()));
    }

    let task = db::tasks::update(
        &state.pool,
        id,
        auth.user_id,
        &req.name,
        req.hourly_rate,
        req.is_completed,
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound("Task not found".to_string()),
        _ => AppError::Database(e),
    })?;

    state.events.publish(
        auth.user_id,
        "task-updated",
        serde_json::to_value(&task).unwrap_or(serde_json::Value::Null),
    );

    Ok(Json(task))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    db::tasks::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

    db::tasks::delete(&state.pool, id, auth.user_id).await?;

    state
        .events
        .publish(auth.user_id, "task-deleted", serde_json::json!({ "id": id }));

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
