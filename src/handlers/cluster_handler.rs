use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::{
    models::{ApiResponse, ClusterRecord},
    services::reconciler::expiration_after,
    AppState,
};

type HandlerError = (StatusCode, Json<ApiResponse>);

fn internal_error() -> HandlerError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::error("Internal Server Error")),
    )
}

fn not_found(name: &str) -> HandlerError {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error(format!("cluster '{}' not found", name)).with_cluster(name)),
    )
}

/// GET /clusters
pub async fn list_clusters(
    State(state): State<AppState>,
) -> Result<Json<Vec<ClusterRecord>>, HandlerError> {
    match state.cluster_store.list().await {
        Ok(clusters) => Ok(Json(clusters)),
        Err(e) => {
            error!(error = %e, "failed to list clusters");
            Err(internal_error())
        }
    }
}

/// POST /clusters/renew/:name
///
/// Pushes the expiration to now + the configured lifetime. The creation
/// date is left alone.
pub async fn renew_cluster(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse>, HandlerError> {
    let expiration = match expiration_after(Utc::now(), state.config.cluster_lifetime) {
        Ok(expiration) => expiration,
        Err(e) => {
            error!(cluster = %name, error = %e, "failed to compute expiration date");
            return Err(internal_error());
        }
    };

    match state.cluster_store.update_expiration_date(&name, expiration).await {
        Ok(true) => {
            info!(cluster = %name, expiration = %expiration, "Renewed");
            Ok(Json(ApiResponse::ok(
                &name,
                format!("renewed until {}", expiration.to_rfc3339()),
            )))
        }
        Ok(false) => {
            warn!(cluster = %name, "Renew requested for unknown cluster");
            Err(not_found(&name))
        }
        Err(e) => {
            error!(cluster = %name, error = %e, "failed to update expiration date");
            Err(internal_error())
        }
    }
}

/// POST /clusters/ignore/:name
pub async fn ignore_cluster(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse>, HandlerError> {
    set_ignore(&state, &name, true).await
}

/// POST /clusters/unignore/:name
pub async fn unignore_cluster(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse>, HandlerError> {
    set_ignore(&state, &name, false).await
}

async fn set_ignore(
    state: &AppState,
    name: &str,
    ignore: bool,
) -> Result<Json<ApiResponse>, HandlerError> {
    match state.cluster_store.update_ignore(name, ignore).await {
        Ok(true) => {
            info!(cluster = %name, ignore, "Updated ignore flag");
            let verb = if ignore { "ignored" } else { "unignored" };
            Ok(Json(ApiResponse::ok(name, verb)))
        }
        Ok(false) => {
            warn!(cluster = %name, "Ignore flag change requested for unknown cluster");
            Err(not_found(name))
        }
        Err(e) => {
            error!(cluster = %name, error = %e, "failed to update ignore");
            Err(internal_error())
        }
    }
}
