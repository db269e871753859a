pub mod cluster_handler;
pub mod health_handler;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::basic_auth_middleware;
use crate::AppState;

/// Full HTTP surface: cluster controls behind basic auth, health check open.
pub fn router(state: AppState) -> Router {
    let clusters = Router::new()
        .route("/clusters", get(cluster_handler::list_clusters))
        .route("/clusters/renew/:name", post(cluster_handler::renew_cluster))
        .route("/clusters/ignore/:name", post(cluster_handler::ignore_cluster))
        .route("/clusters/unignore/:name", post(cluster_handler::unignore_cluster))
        .route_layer(from_fn_with_state(state.clone(), basic_auth_middleware));

    Router::new()
        // Health check (no auth required)
        .route("/health", get(health_handler::health_check))
        .merge(clusters)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
