use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{
    codes::{create_code, list_codes, validate_code},
    events::{get_event, register_guest},
    health::health_check,
    logs::list_logs,
};
use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Bearer token required
    let authenticated_routes = Router::new()
        .route("/api/v1/codes", post(create_code))
        .route("/api/v1/codes", get(list_codes))
        .route("/api/v1/codes/validate", post(validate_code))
        .route("/api/v1/logs", get(list_logs))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        // Health
        .route("/health", get(health_check))
        // Public event links
        .route("/api/v1/events/{event_id}", get(get_event))
        .route("/api/v1/events/{event_id}/register", post(register_guest))
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
