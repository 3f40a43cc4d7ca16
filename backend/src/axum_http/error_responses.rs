use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
    /// Present on 5xx responses; matches the event shipped to the error tracker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Payload too large")]
    PayloadTooLarge,

    /// A provider error the caller is meant to read.
    #[error("{message}")]
    Upstream { message: String },

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Upstream { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub fn new_event_id() -> String {
    Uuid::new_v4().simple().to_string()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (message, event_id) = match self {
            AppError::BadRequest(msg) => (msg, None),
            AppError::Upstream { message } => {
                let event_id = new_event_id();
                error!(
                    event_id = %event_id,
                    status = status.as_u16(),
                    error = %message,
                    "http: upstream provider error"
                );
                (message, Some(event_id))
            }
            AppError::Internal(cause) => {
                let event_id = new_event_id();
                error!(
                    event_id = %event_id,
                    status = status.as_u16(),
                    error = ?cause,
                    "http: internal error"
                );
                // Cause stays in the log, never in the body.
                ("Internal Server Error".to_string(), Some(event_id))
            }
            other => (other.to_string(), None),
        };

        let body = Json(ErrorResponse {
            code: status.as_u16(),
            message,
            event_id,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn internal_error_hides_cause_and_carries_event_id() {
        let response = AppError::Internal(anyhow::anyhow!("db password wrong")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Internal Server Error");
        assert_eq!(body["event_id"].as_str().unwrap().len(), 32);
    }

    #[tokio::test]
    async fn upstream_error_exposes_message() {
        let response = AppError::Upstream {
            message: "error: access_denied | user cancelled".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["message"], "error: access_denied | user cancelled");
        assert!(body["event_id"].is_string());
    }

    #[tokio::test]
    async fn client_errors_have_no_event_id() {
        let response = AppError::PayloadTooLarge.into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body_json(response).await.get("event_id").is_none());

        let response = AppError::BadRequest("state mismatch".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "state mismatch");
    }
}
