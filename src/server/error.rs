use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::common::errors::{ErrorKind, RelayError};

/// Error envelope returned by every API route
#[derive(Debug)]
pub struct ApiError {
    pub message: String,
    pub source: RelayError,
}

impl ApiError {
    pub fn new(message: impl Into<String>, source: RelayError) -> Self {
        Self {
            message: message.into(),
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.source.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Upstream | ErrorKind::NotFound | ErrorKind::Configuration => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.message, self.source)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match &self.source {
            RelayError::Validation(msg) => msg.clone(),
            other => other.to_string(),
        };

        let body = json!({
            "message": self.message,
            "success": false,
            "error": error,
        });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = ApiError::new("bad", RelayError::Validation("Missing required parameters: ticker".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = ApiError::new("failed", RelayError::NotFound("BTCUSDT".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = ApiError::new("failed", RelayError::upstream(10006, "rate limit"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
