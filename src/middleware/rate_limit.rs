use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::Error;

const WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Window {
    opened_at: Instant,
    admitted: u32,
}

/// Fixed one-second window shared by every request through the layer.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    per_window: u32,
    window: Arc<Mutex<Window>>,
}

impl RateLimiter {
    pub fn new(rps: u32) -> Self {
        Self {
            per_window: rps.max(1),
            window: Arc::new(Mutex::new(Window {
                opened_at: Instant::now(),
                admitted: 0,
            })),
        }
    }

    fn try_acquire(&self, at: Instant) -> bool {
        let mut window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        if at.saturating_duration_since(window.opened_at) >= WINDOW {
            window.opened_at = at;
            window.admitted = 0;
        }
        if window.admitted >= self.per_window {
            return false;
        }
        window.admitted += 1;
        true
    }
}

pub async fn rps_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !limiter.try_acquire(Instant::now()) {
        tracing::debug!(path = %req.uri().path(), "rate limit exceeded");
        return Error::RateLimited.into_response();
    }
    next.run(req).await
}
