use axum::{
    extract::{Query, State},
    response::{Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::common::created_response;
use crate::errors::{ErrorResponse, ServiceError};
use crate::models::Activity;
use crate::services::notifications::CreateActivityRequest;
use crate::AppState;

pub fn activities_routes() -> Router<AppState> {
    Router::new().route("/", get(list_activities).post(create_activity))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityListQuery {
    /// Keep only the newest N entries
    pub limit: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/api/activities",
    params(ActivityListQuery),
    responses((status = 200, description = "Activity feed, newest first", body = [Activity])),
    tag = "activities"
)]
pub async fn list_activities(
    State(state): State<AppState>,
    Query(query): Query<ActivityListQuery>,
) -> Json<Vec<Activity>> {
    Json(state.notifications.activities(query.limit).await)
}

#[utoipa::path(
    post,
    path = "/api/activities",
    request_body = CreateActivityRequest,
    responses(
        (status = 201, description = "Activity logged", body = Activity),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    ),
    tag = "activities"
)]
pub async fn create_activity(
    State(state): State<AppState>,
    Json(payload): Json<CreateActivityRequest>,
) -> Result<Response, ServiceError> {
    let activity = state.notifications.create_activity(payload).await?;
    Ok(created_response(activity))
}
