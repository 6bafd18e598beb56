use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use utoipa::ToSchema;

use crate::AppState;

/// Component health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub version: String,
    pub timestamp: String,
    pub uptime_secs: u64,
    pub store: ComponentHealth,
    pub events: ComponentHealth,
}

/// Tracks application start time for uptime calculation
static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Call once at startup
pub fn init_start_time() {
    let _ = START_TIME.get_or_init(Instant::now);
}

fn get_uptime_secs() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness_check))
}

/// Liveness probe: the process answers
#[utoipa::path(
    get,
    path = "/health/live",
    responses((status = 200, description = "Service is running")),
    tag = "health"
)]
pub async fn liveness_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "up",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Readiness: the entity store lock can be taken and events are drained
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "All components up", body = HealthResponse),
        (status = 503, description = "A component is down", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store = match timeout(Duration::from_secs(2), state.store.read()).await {
        Ok(guard) => ComponentHealth {
            status: ComponentStatus::Up,
            message: format!("{} consumptions held", guard.consumptions.len()),
        },
        Err(_) => ComponentHealth {
            status: ComponentStatus::Down,
            message: "store lock not acquired within 2s".to_string(),
        },
    };

    let events = if state.event_sender.is_closed() {
        ComponentHealth {
            status: ComponentStatus::Down,
            message: "event processor stopped".to_string(),
        }
    } else {
        ComponentHealth {
            status: ComponentStatus::Up,
            message: "event processor running".to_string(),
        }
    };

    let status = if store.status == ComponentStatus::Up && events.status == ComponentStatus::Up {
        ComponentStatus::Up
    } else {
        ComponentStatus::Down
    };
    let code = match status {
        ComponentStatus::Up => StatusCode::OK,
        ComponentStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_secs: get_uptime_secs(),
            store,
            events,
        }),
    )
}
