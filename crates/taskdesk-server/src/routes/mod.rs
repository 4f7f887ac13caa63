pub mod answers;
pub mod health;
pub mod tags;
pub mod tasks;
pub mod users;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::{middleware, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use taskdesk_db::Db;
use taskdesk_service::{LocalService, ServiceError};

use crate::auth::auth_middleware;

pub struct InnerAppState {
    pub service: LocalService,
    pub db: Db,
}

pub type AppState = Arc<InnerAppState>;

pub fn build_router(db: Db) -> Router {
    let state: AppState = Arc::new(InnerAppState {
        service: LocalService::new(db.clone()),
        db,
    });

    let public = Router::new().merge(health::routes());

    let protected = Router::new()
        .merge(tasks::routes())
        .merge(answers::routes())
        .merge(users::routes())
        .merge(tags::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    public
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Map service outcomes onto HTTP statuses. Denied is an authorization
/// gate: the notice in the body is meant to be shown to the user over a
/// safe listing view.
pub(crate) fn to_error(e: ServiceError) -> (StatusCode, Json<Value>) {
    let status = match &e {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ServiceError::Denied(_) => StatusCode::FORBIDDEN,
        ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": e.to_string() })))
}
