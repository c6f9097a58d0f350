use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::Project;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub hourly_rate: Option<f64>,
    pub color: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateProject {
    pub name: String,
    pub hourly_rate: Option<f64>,
    pub is_active: bool,
    pub color: Option<String>,
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.is_empty() || name.len() > 200 {
        return Err(AppError::BadRequest(
            "Name must be between 1 and 200 characters".to_string(),
        ));
    }
    Ok(())
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Project>>, AppError> {
    let projects = db::projects::list(&state.pool, auth.user_id).await?;
    Ok(Json(projects))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateProject>,
) -> Result<Json<Project>, AppError> {
    validate_name(&req.name)?;

    let project = db::projects::create(
        &state.pool,
        auth.user_id,
        &req.name,
        req.hourly_rate,
        req.color.as_deref(),
    )
    .await?;

    state.events.publish(
        auth.user_id,
        "project-created",
        serde_json::to_value(&project).unwrap_or(serde_json::Value::Null),
    );

    Ok(Json(project))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, AppError> {
    let project = db::projects::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    Ok(Json(project))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProject>,
) -> Result<Json<Project>, AppError> {
    validate_name(&req.name)?;

    let project = db::projects::update(
        &state.pool,
        id,
        auth.user_id,
        &req.name,
        req.hourly_rate,
        req.is_active,
        req.color.as_deref(),
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound("Project not found".to_string()),
        _ => AppError::Database(e),
    })?;

    state.events.publish(
        auth.user_id,
        "project-updated",
        serde_json::to_value(&project).unwrap_or(serde_json::Value::Null),
    );

    Ok(Json(project))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    db::projects::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    db::projects::delete(&state.pool, id, auth.user_id).await?;

    state
        .events
        .publish(auth.user_id, "project-deleted", serde_json::json!({ "id": id }));

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
