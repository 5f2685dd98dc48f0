use axum::{
    extract::{Request, State},
    http::{Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{error, info, warn};

use super::{ApiError, AppState};
use crate::db::Store;

pub const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

/// Cached reachability of the persistence layer. One background writer
/// refreshes the flag on an interval; the gate middleware reads it without
/// a per-request store round-trip. The dedicated probe always pings live.
pub struct HealthMonitor {
    store: Store,
    healthy: AtomicBool,
}

impl HealthMonitor {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            store,
            healthy: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    /// Ping the store and record the outcome.
    pub async fn refresh(&self) -> bool {
        let healthy = match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                error!("Health check failed: {}", e);
                false
            }
        };
        self.healthy.store(healthy, Ordering::Relaxed);
        healthy
    }

    /// Background refresh loop; spawned once at startup.
    pub async fn run(self: Arc<Self>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.refresh().await;
        }
    }
}

/// Pre-flight gate for every guarded endpoint: short-circuits with 503 and
/// a no-cache directive before any authentication or validation work.
pub async fn health_gate(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if state.health().is_healthy() {
        next.run(request).await
    } else {
        warn!(
            "Health gate rejected {} {}",
            request.method(),
            request.uri().path()
        );
        ApiError::ServiceUnavailable.into_response()
    }
}

/// GET /healthz. Routed with `any` so a non-GET probe gets 400 rather than
/// the router's default 405; the original contract treats any malformed
/// probe as a client error.
pub async fn healthz(State(state): State<Arc<AppState>>, request: Request) -> Response {
    if request.method() != Method::GET
        || request.uri().query().is_some()
        || content_length(&request) > 0
    {
        return (StatusCode::BAD_REQUEST, "").into_response();
    }

    let healthy = state.health().refresh().await;

    if healthy {
        info!("Health check succeeded");
    }

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, [(header::CACHE_CONTROL, NO_CACHE)], "").into_response()
}

fn content_length(request: &Request) -> u64 {
    request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}
