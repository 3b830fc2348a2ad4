use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

const WINDOW: Duration = Duration::from_secs(1);
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug)]
struct WindowState {
    start: Instant,
    count: u32,
}

/// Fixed one-second window per session, so one noisy browser tab cannot
/// starve the others.
#[derive(Clone, Debug)]
pub struct SessionRateLimiter {
    rps: u32,
    windows: Arc<Mutex<HashMap<Uuid, WindowState>>>,
}

impl SessionRateLimiter {
    fn new(rps: u32) -> Self {
        Self {
            rps: rps.max(1),
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn allow(&self, attempt_id: Uuid) -> bool {
        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");
        let now = Instant::now();

        if windows.len() > PRUNE_THRESHOLD {
            windows.retain(|_, w| now.duration_since(w.start) < WINDOW);
        }

        let window = windows.entry(attempt_id).or_insert(WindowState {
            start: now,
            count: 0,
        });
        if now.duration_since(window.start) >= WINDOW {
            window.start = now;
            window.count = 0;
        }
        if window.count < self.rps {
            window.count += 1;
            true
        } else {
            false
        }
    }
}

pub async fn session_rps_middleware(
    State(state): State<SessionRateLimiter>,
    Path(attempt_id): Path<Uuid>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !state.allow(attempt_id) {
        tracing::warn!(%attempt_id, "Session event rate limit exceeded");
        return (StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded").into_response();
    }
    next.run(req).await
}

pub fn new_session_rps_state(rps: u32) -> SessionRateLimiter {
    SessionRateLimiter::new(rps)
}
