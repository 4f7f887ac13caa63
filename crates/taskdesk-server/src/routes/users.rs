use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde_json::{json, Value};

use taskdesk_core::user::CreateUser;
use taskdesk_service::TrackerService;

use crate::auth::CurrentUser;

use super::{to_error, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/{id}", get(get_user))
        .route("/api/users/{id}/subordinates", get(list_subordinates))
        .route(
            "/api/users/{id}/subordinates/{sid}",
            put(add_subordinate).delete(remove_subordinate),
        )
        .route("/api/users/{id}/report", get(subordinate_report))
}

async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .service
        .list_users()
        .map(|u| Json(json!(u)))
        .map_err(to_error)
}

async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<CreateUser>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    state
        .service
        .create_user(&input)
        .map(|u| (StatusCode::CREATED, Json(json!(u))))
        .map_err(to_error)
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .service
        .get_user(id)
        .map(|u| Json(json!(u)))
        .map_err(to_error)
}

async fn list_subordinates(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .service
        .list_subordinates(id)
        .map(|u| Json(json!(u)))
        .map_err(to_error)
}

/// Only the superior themself may manage their subordinate list.
fn require_self(user_id: i64, path_id: i64) -> Result<(), (StatusCode, Json<Value>)> {
    if user_id != path_id {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "denied: you may only manage your own subordinates" })),
        ));
    }
    Ok(())
}

async fn add_subordinate(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path((id, sid)): Path<(i64, i64)>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    require_self(user_id, id)?;
    state
        .service
        .add_subordinate(id, sid)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}

async fn remove_subordinate(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path((id, sid)): Path<(i64, i64)>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    require_self(user_id, id)?;
    state
        .service
        .remove_subordinate(id, sid)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}

/// Tasks assigned to the given subordinate, each with their earliest
/// answer. The caller must be the subordinate's direct manager.
async fn subordinate_report(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .service
        .subordinate_tasks(user_id, id)
        .map(|r| Json(json!(r)))
        .map_err(to_error)
}
