//! Maps `core::FlowError` onto HTTP responses (spec §6/§7): `NotFound`→404,
//! `Validation`→400, `QueueFull`→429, everything else→500.

use axum::{http::StatusCode, response::IntoResponse, Json};
use core::FlowError;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

pub struct ApiError(pub FlowError);

impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        Self(err)
    }
}

impl From<db::DbError> for ApiError {
    fn from(err: db::DbError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            FlowError::NotFound(_) => StatusCode::NOT_FOUND,
            FlowError::Validation(_) => StatusCode::BAD_REQUEST,
            FlowError::QueueFull => StatusCode::TOO_MANY_REQUESTS,
            FlowError::UpstreamUnavailable(_) | FlowError::Budget(_) | FlowError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorBody { error: self.0.to_string(), kind: self.0.kind() };
        (status, Json(body)).into_response()
    }
}
