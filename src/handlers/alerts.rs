use axum::{
    extract::{Path, Query, State},
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::common::created_response;
use crate::errors::{ErrorResponse, ServiceError};
use crate::models::{Alert, AlertId};
use crate::services::notifications::CreateAlertRequest;
use crate::AppState;

pub fn alerts_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_alerts).post(create_alert))
        .route("/resolve/:id", post(resolve_alert))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AlertListQuery {
    /// Only unresolved alerts when true
    pub active: Option<bool>,
}

#[utoipa::path(
    get,
    path = "/api/alerts",
    params(AlertListQuery),
    responses((status = 200, description = "Alerts", body = [Alert])),
    tag = "alerts"
)]
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertListQuery>,
) -> Json<Vec<Alert>> {
    Json(
        state
            .notifications
            .alerts(query.active.unwrap_or(false))
            .await,
    )
}

#[utoipa::path(
    post,
    path = "/api/alerts",
    request_body = CreateAlertRequest,
    responses(
        (status = 201, description = "Alert raised", body = Alert),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    ),
    tag = "alerts"
)]
pub async fn create_alert(
    State(state): State<AppState>,
    Json(payload): Json<CreateAlertRequest>,
) -> Result<Response, ServiceError> {
    let alert = state.notifications.create_alert(payload).await?;
    Ok(created_response(alert))
}

/// Resolves an alert. Resolving an already resolved alert returns it unchanged.
#[utoipa::path(
    post,
    path = "/api/alerts/resolve/{id}",
    params(("id" = u64, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert resolved", body = Alert),
        (status = 404, description = "Alert not found", body = ErrorResponse)
    ),
    tag = "alerts"
)]
pub async fn resolve_alert(
    State(state): State<AppState>,
    Path(id): Path<AlertId>,
) -> Result<Json<Alert>, ServiceError> {
    Ok(Json(state.notifications.resolve_alert(id).await?))
}
