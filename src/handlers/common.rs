use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// `?days=N` on the dashboard rollups
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WindowQuery {
    /// Look-back window in days, 7 when omitted
    pub days: Option<i64>,
}

impl WindowQuery {
    pub const DEFAULT_DAYS: i64 = 7;

    pub fn days(&self) -> i64 {
        self.days.unwrap_or(Self::DEFAULT_DAYS)
    }
}
