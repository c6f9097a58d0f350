pub mod auth;
pub mod events;
pub mod projects;
pub mod reports;
pub mod tasks;
pub mod time_entries;

use axum::routing::{get, post};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/change-password", post(auth::change_password))
        .route("/api/v1/me", get(auth::me).put(auth::update_me))
        // Projects
        .route("/api/v1/projects", get(projects::list).post(projects::create))
        .route(
            "/api/v1/projects/{id}",
            get(projects::get)
                .put(projects::update)
                .delete(projects::delete),
        )
        // Tasks
        .route(
            "/api/v1/projects/{id}/tasks",
            get(tasks::list_by_project).post(tasks::create),
        )
        .route("/api/v1/tasks", get(tasks::list))
        .route(
            "/api/v1/tasks/{id}",
            get(tasks::get).put(tasks::update).delete(tasks::delete),
        )
        // Time entries
        .route(
            "/api/v1/time-entries",
            get(time_entries::list).post(time_entries::create),
        )
        .route("/api/v1/time-entries/start", post(time_entries::start))
        .route("/api/v1/time-entries/current", get(time_entries::current))
        .route(
            "/api/v1/time-entries/{id}",
            get(time_entries::get)
                .put(time_entries::update)
                .delete(time_entries::delete),
        )
        .route("/api/v1/time-entries/{id}/stop", post(time_entries::stop))
        // Reports
        .route("/api/v1/reports/summary", get(reports::summary))
        .route("/api/v1/reports/earnings", get(reports::earnings))
        .route("/api/v1/reports/export", get(reports::export))
        // Real-time
        .route("/api/v1/events", get(events::subscribe))
}
