//! Stockdash API library
//!
//! Bookkeeping engine behind the stock and consumption dashboard: catalog,
//! capped consumption recording, alerts, activity feed and rollups, served
//! over axum.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod metrics;
pub mod middleware_helpers;
pub mod models;
pub mod openapi;
pub mod seed;
pub mod services;
pub mod store;
pub mod tracing;

use axum::{http::HeaderValue, middleware, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};

use crate::clock::Clock;
use crate::config::AppConfig;
use crate::events::EventSender;
use crate::services::{
    analytics::AnalyticsService, catalog::CatalogService, consumption::ConsumptionService,
    notifications::NotificationService, users::UserService,
};
use crate::store::{shared, EntityStore, SharedStore};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub clock: Arc<dyn Clock>,
    pub store: SharedStore,
    pub event_sender: EventSender,
    pub catalog: CatalogService,
    pub consumption: ConsumptionService,
    pub notifications: NotificationService,
    pub analytics: AnalyticsService,
    pub users: UserService,
}

impl AppState {
    /// Wires every service around one shared store.
    pub fn new(
        config: AppConfig,
        store: EntityStore,
        clock: Arc<dyn Clock>,
        event_sender: EventSender,
    ) -> Self {
        let store = shared(store);
        let policy = config.consumption.clone();
        let calendar = policy.calendar();

        Self {
            catalog: CatalogService::new(store.clone()),
            consumption: ConsumptionService::new(
                store.clone(),
                clock.clone(),
                policy,
                event_sender.clone(),
            ),
            notifications: NotificationService::new(
                store.clone(),
                clock.clone(),
                event_sender.clone(),
            ),
            analytics: AnalyticsService::new(store.clone(), clock.clone(), calendar),
            users: UserService::new(store.clone()),
            config: Arc::new(config),
            clock,
            store,
            event_sender,
        }
    }
}

/// Full router: `/api`, health, metrics and Swagger UI, with request id,
/// tracing, metrics, compression and timeout layers. CORS is left to the
/// caller.
pub fn app(state: AppState) -> Router {
    Router::<AppState>::new()
        .route("/", get(|| async { "stockdash-api up" }))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/metrics/json", get(metrics::metrics_json_handler))
        .nest("/health", handlers::health::health_routes())
        .nest("/api", handlers::api_routes())
        .merge(openapi::swagger_ui())
        .layer(middleware::from_fn(metrics::track_http_metrics))
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        // Ensure every request carries a request id for traceability
        .layer(middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

/// CORS from configuration: explicit origins when given, permissive in
/// development or on explicit opt-in, `None` otherwise.
pub fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        Some(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else if config.should_allow_permissive_cors() {
        Some(CorsLayer::permissive())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_prefers_explicit_origins() {
        let mut config = AppConfig::new("127.0.0.1".into(), 8080, "production".into());
        assert!(cors_layer(&config).is_none());

        config.cors_allowed_origins = Some(" , ".into());
        assert!(cors_layer(&config).is_none());

        config.cors_allowed_origins = Some("https://dash.example.com".into());
        assert!(cors_layer(&config).is_some());
    }

    #[test]
    fn cors_is_permissive_in_development() {
        let config = AppConfig::new("127.0.0.1".into(), 8080, "development".into());
        assert!(cors_layer(&config).is_some());
    }
}
