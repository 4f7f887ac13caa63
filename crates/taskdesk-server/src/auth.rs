use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::routes::AppState;

/// Identity of the authenticated caller, injected by the middleware as a
/// request extension.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub i64);

/// SHA-256 hash a raw token, returning the hex-encoded digest. Only this
/// digest is ever stored.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Generate a new bearer token: `td_` + 43 chars of base62 random bytes.
pub fn generate_token() -> String {
    use rand::Rng;
    const BASE62: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let random_part: String = (0..43)
        .map(|_| {
            let idx = rng.gen_range(0..BASE62.len());
            BASE62[idx] as char
        })
        .collect();
    format!("td_{random_part}")
}

/// Axum middleware that resolves `Authorization: Bearer <token>` to a
/// concrete user. Every protected operation is user-scoped, so there is
/// no anonymous pass-through.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let token = match token {
        Some(t) => t,
        None => return unauthorized(),
    };

    let token_hash = sha256_hex(token);
    match state.db.find_user_by_token_hash(&token_hash) {
        Ok(Some(user)) => {
            // Best-effort usage stamp; a failure here must not block the
            // request.
            let _ = state.db.touch_token(&token_hash);
            request.extensions_mut().insert(CurrentUser(user.id));
            next.run(request).await
        }
        Ok(None) => unauthorized(),
        Err(e) => {
            tracing::error!(error = %e, "token lookup failed");
            unauthorized()
        }
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "missing or invalid token" })),
    )
        .into_response()
}
