//! Meeting assistant error types.
//!
//! Errors map to HTTP responses with a `{"error": {"code", "message"}}`
//! body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AssistantError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            AssistantError::BadRequest(_) => 400,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl IntoResponse for AssistantError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AssistantError::BadRequest(reason) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", reason),
        };

        (
            status,
            Json(ErrorResponse {
                error: ErrorDetail { code, message },
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_bad_request_keeps_message() {
        let response = AssistantError::BadRequest("call_id is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        assert_eq!(body["error"]["message"], "call_id is required");
    }

    #[test]
    fn test_status_code() {
        assert_eq!(AssistantError::BadRequest(String::new()).status_code(), 400);
    }
}
