//! JSON error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futarchy_core::ChartError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error carrying a [`ChartError`]
#[derive(Debug)]
pub struct ApiError(pub ChartError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ChartError::NotFound(_) => StatusCode::NOT_FOUND,
            ChartError::InvalidTicker(_) => StatusCode::BAD_REQUEST,
            ChartError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ChartError::Network(_) | ChartError::Upstream(_) | ChartError::Parse(_) => {
                StatusCode::BAD_GATEWAY
            }
            ChartError::Config(_) | ChartError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ChartError> for ApiError {
    fn from(error: ChartError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ChartError::not_found("x"), StatusCode::NOT_FOUND),
            (ChartError::invalid_ticker("x"), StatusCode::BAD_REQUEST),
            (ChartError::rate_limited("x"), StatusCode::TOO_MANY_REQUESTS),
            (ChartError::upstream("x"), StatusCode::BAD_GATEWAY),
            (ChartError::network("x"), StatusCode::BAD_GATEWAY),
            (ChartError::parse("x"), StatusCode::BAD_GATEWAY),
            (ChartError::internal("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError(error).status(), status);
        }
    }
}
