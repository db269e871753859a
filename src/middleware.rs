use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::warn;

use crate::AppState;

pub async fn basic_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(e) = state.auth_service.authorize(request.headers()) {
        warn!("Rejected request to {}: {}", request.uri().path(), e);
        return (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Basic realm=\"Restricted\"")],
            Json(json!({
                "error": "Unauthorized",
                "message": "Missing or invalid credentials"
            })),
        )
            .into_response();
    }

    next.run(request).await
}
