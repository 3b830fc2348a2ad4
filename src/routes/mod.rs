pub mod health;
pub mod session;

use axum::{
    routing::{get, post},
    Router,
};

use crate::middleware::rate_limit::{new_session_rps_state, session_rps_middleware};
use crate::AppState;

/// Gateway routes. Every per-session route is rate limited per attempt id.
pub fn router(state: AppState, public_rps: u32) -> Router {
    let session_api = Router::new()
        .route(
            "/api/sessions/:id",
            get(session::get_session).delete(session::dispose_session),
        )
        .route("/api/sessions/:id/notices", get(session::drain_notices))
        .route(
            "/api/sessions/:id/fullscreen/acknowledge",
            post(session::acknowledge_fullscreen),
        )
        .route(
            "/api/sessions/:id/fullscreen",
            post(session::fullscreen_changed),
        )
        .route("/api/sessions/:id/focus", post(session::focus_changed))
        .route(
            "/api/sessions/:id/answers",
            axum::routing::patch(session::change_answer),
        )
        .route("/api/sessions/:id/submit", post(session::submit_session))
        .route_layer(axum::middleware::from_fn_with_state(
            new_session_rps_state(public_rps),
            session_rps_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/api/sessions", post(session::start_session))
        .merge(session_api)
        .with_state(state)
}
