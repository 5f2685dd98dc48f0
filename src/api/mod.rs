use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{any, get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;

pub mod auth;
mod error;
pub mod health;
mod observability;
mod types;
pub mod validation;

mod assignments;
mod submissions;

pub use error::ApiError;
pub use health::HealthMonitor;
pub use types::*;

pub use crate::domain::events::NotificationEvent;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub health: Arc<HealthMonitor>,

    pub event_bus: broadcast::Sender<NotificationEvent>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub const fn health(&self) -> &Arc<HealthMonitor> {
        &self.health
    }

    #[must_use]
    pub const fn event_bus(&self) -> &broadcast::Sender<NotificationEvent> {
        &self.event_bus
    }
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_url,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let health = Arc::new(HealthMonitor::new(store.clone()));
    health.refresh().await;

    let (event_bus, _) = broadcast::channel(100);

    Ok(Arc::new(AppState {
        config,
        store,
        health,
        event_bus,
        prometheus_handle,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    // Layer order matters: the health gate is outermost so it runs before
    // credential verification on every guarded route.
    let guarded = Router::new()
        .route(
            "/assignments",
            post(assignments::create_assignment).get(assignments::list_assignments),
        )
        .route(
            "/assignments/{id}",
            get(assignments::get_assignment)
                .put(assignments::update_assignment)
                .patch(assignments::update_assignment)
                .delete(assignments::delete_assignment),
        )
        .route(
            "/assignments/{id}/submissions",
            post(submissions::create_submission),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_basic_auth,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            health::health_gate,
        ));

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .merge(guarded)
        .route("/healthz", any(health::healthz))
        .route("/metrics", get(observability::get_metrics))
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}
