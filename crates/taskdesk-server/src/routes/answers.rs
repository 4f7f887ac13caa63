use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde_json::{json, Value};

use taskdesk_core::answer::CreateComment;
use taskdesk_service::TrackerService;

use crate::auth::CurrentUser;

use super::{to_error, AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/api/answers/{id}/comments",
        get(list_comments).post(add_comment),
    )
}

async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .service
        .list_comments(id)
        .map(|c| Json(json!(c)))
        .map_err(to_error)
}

async fn add_comment(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(input): Json<CreateComment>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    state
        .service
        .add_comment(user_id, id, &input)
        .map(|c| (StatusCode::CREATED, Json(json!(c))))
        .map_err(to_error)
}
