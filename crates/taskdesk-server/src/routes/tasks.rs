use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use taskdesk_core::answer::CreateAnswer;
use taskdesk_core::task::{CreateTask, Priority, Status, TaskFilter, UpdateTask};
use taskdesk_service::TrackerService;

use crate::auth::CurrentUser;

use super::{to_error, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/search", get(search_tasks))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route(
            "/api/tasks/{id}/answers",
            get(list_answers).post(add_answer),
        )
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    q: Option<String>,
    /// Comma-separated tag ids.
    tags: Option<String>,
    status: Option<String>,
    priority: Option<String>,
    /// Comma-separated user ids.
    assignees: Option<String>,
}

fn parse_id_list(raw: Option<&str>) -> Result<Vec<i64>, (StatusCode, Json<Value>)> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            part.trim().parse::<i64>().map_err(|_| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": format!("invalid id: {part}") })),
                )
            })
        })
        .collect()
}

fn bad_request(msg: String) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg })))
}

impl ListQuery {
    fn into_filter(self) -> Result<(TaskFilter, Option<String>), (StatusCode, Json<Value>)> {
        let status = match self.status.as_deref() {
            None | Some("") => None,
            Some(s) => Some(
                Status::from_str(s).ok_or_else(|| bad_request(format!("invalid status: {s}")))?,
            ),
        };
        let priority = match self.priority.as_deref() {
            None | Some("") => None,
            Some(p) => Some(
                Priority::from_str(p)
                    .ok_or_else(|| bad_request(format!("invalid priority: {p}")))?,
            ),
        };
        let filter = TaskFilter {
            tag_ids: parse_id_list(self.tags.as_deref())?,
            status,
            priority,
            assignee_ids: parse_id_list(self.assignees.as_deref())?,
        };
        Ok((filter, self.q))
    }
}

async fn list_tasks(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let (filter, query) = q.into_filter()?;
    state
        .service
        .list_visible(user_id, &filter, query.as_deref())
        .map(|t| Json(json!(t)))
        .map_err(to_error)
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

async fn search_tasks(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .service
        .search(&params.q)
        .map(|hits| Json(json!(hits)))
        .map_err(to_error)
}

async fn create_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(input): Json<CreateTask>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    state
        .service
        .create_task(user_id, &input)
        .map(|t| (StatusCode::CREATED, Json(json!(t))))
        .map_err(to_error)
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .service
        .get_task(id)
        .map(|t| Json(json!(t)))
        .map_err(to_error)
}

async fn update_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(update): Json<UpdateTask>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .service
        .update_task(user_id, id, &update)
        .map(|t| Json(json!(t)))
        .map_err(to_error)
}

async fn delete_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    state
        .service
        .delete_task(user_id, id)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}

async fn list_answers(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .service
        .list_answers(id)
        .map(|a| Json(json!(a)))
        .map_err(to_error)
}

async fn add_answer(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(input): Json<CreateAnswer>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    state
        .service
        .add_answer(user_id, id, &input)
        .map(|a| (StatusCode::CREATED, Json(json!(a))))
        .map_err(to_error)
}
