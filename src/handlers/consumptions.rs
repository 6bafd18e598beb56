use axum::{
    extract::{Path, Query, State},
    response::{Json, Response},
    routing::get,
    Router,
};

use super::common::created_response;
use crate::errors::{ErrorResponse, ServiceError};
use crate::models::{Consumption, ConsumptionId};
use crate::services::consumption::{ConsumptionFilter, RecordConsumption};
use crate::AppState;

pub fn consumptions_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_consumptions).post(record_consumption))
        .route("/:id", get(get_consumption))
}

/// Lists consumptions. Only the first of `clientId`, `toolId`, `storeId`,
/// `productId` that is present is applied; `start`/`end` apply when none is.
#[utoipa::path(
    get,
    path = "/api/consumptions",
    params(ConsumptionFilter),
    responses(
        (status = 200, description = "Matching consumptions", body = [Consumption])
    ),
    tag = "consumptions"
)]
pub async fn list_consumptions(
    State(state): State<AppState>,
    Query(filter): Query<ConsumptionFilter>,
) -> Json<Vec<Consumption>> {
    Json(state.consumption.list(&filter).await)
}

#[utoipa::path(
    get,
    path = "/api/consumptions/{id}",
    params(("id" = u64, Path, description = "Consumption id")),
    responses(
        (status = 200, description = "Consumption found", body = Consumption),
        (status = 404, description = "Consumption not found", body = ErrorResponse)
    ),
    tag = "consumptions"
)]
pub async fn get_consumption(
    State(state): State<AppState>,
    Path(id): Path<ConsumptionId>,
) -> Result<Json<Consumption>, ServiceError> {
    Ok(Json(state.consumption.get(id).await?))
}

/// Records a usage event, enforcing the tool's daily cap.
#[utoipa::path(
    post,
    path = "/api/consumptions",
    request_body = RecordConsumption,
    responses(
        (status = 201, description = "Consumption recorded", body = Consumption),
        (status = 400, description = "Invalid quantity or daily cap exceeded", body = ErrorResponse),
        (status = 404, description = "Unknown reference (strict mode only)", body = ErrorResponse)
    ),
    tag = "consumptions"
)]
pub async fn record_consumption(
    State(state): State<AppState>,
    Json(payload): Json<RecordConsumption>,
) -> Result<Response, ServiceError> {
    let recorded = state.consumption.record(payload).await?;
    Ok(created_response(recorded.consumption))
}
