use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};

use super::common::WindowQuery;
use crate::services::analytics::{CaliberConsumption, DashboardStats, StoreConsumption};
use crate::AppState;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(dashboard_stats))
        .route("/consumption-by-store", get(consumption_by_store))
        .route("/consumption-by-caliber", get(consumption_by_caliber))
}

/// Headline counters for the dashboard cards
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses(
        (status = 200, description = "Dashboard counters", body = DashboardStats)
    ),
    tag = "dashboard"
)]
pub async fn dashboard_stats(State(state): State<AppState>) -> Json<DashboardStats> {
    Json(state.analytics.dashboard_stats().await)
}

#[utoipa::path(
    get,
    path = "/api/dashboard/consumption-by-store",
    params(WindowQuery),
    responses(
        (status = 200, description = "Consumption per store over the window", body = [StoreConsumption])
    ),
    tag = "dashboard"
)]
pub async fn consumption_by_store(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Json<Vec<StoreConsumption>> {
    Json(state.analytics.consumption_by_store(query.days()).await)
}

#[utoipa::path(
    get,
    path = "/api/dashboard/consumption-by-caliber",
    params(WindowQuery),
    responses(
        (status = 200, description = "Consumption per caliber with shares and chart colours", body = [CaliberConsumption])
    ),
    tag = "dashboard"
)]
pub async fn consumption_by_caliber(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Json<Vec<CaliberConsumption>> {
    Json(state.analytics.consumption_by_caliber(query.days()).await)
}
