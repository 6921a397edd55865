//! HTTP 错误响应
//!
//! 统一错误到状态码的转换，响应体为 `{code, reason, message}`。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use imaginekube_common::Error;
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: u16,
    reason: String,
    message: String,
}

/// 处理函数返回的错误
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// 不区分错误类型，一律作为内部错误
    pub fn internal(err: Error) -> Self {
        error!("{}", err);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::NotFound { .. } | Error::ResourceNotSupported(_) => StatusCode::NOT_FOUND,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::Config(_) | Error::Kubernetes(_) | Error::Upstream(_) | Error::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            error!("{}", err);
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            code: self.status.as_u16(),
            reason: self
                .status
                .canonical_reason()
                .unwrap_or_default()
                .replace(' ', ""),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::not_found("pods", "x"), StatusCode::NOT_FOUND),
            (Error::ResourceNotSupported("foos".to_string()), StatusCode::NOT_FOUND),
            (Error::BadRequest("x".to_string()), StatusCode::BAD_REQUEST),
            (Error::Forbidden("x".to_string()), StatusCode::FORBIDDEN),
            (Error::Upstream("x".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Kubernetes("x".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Config("x".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
        assert_eq!(
            ApiError::internal(Error::not_found("pods", "x")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_body() {
        let response = ApiError::from(Error::not_found("pods", "web")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], 404);
        assert_eq!(body["reason"], "NotFound");
        assert!(body["message"].as_str().unwrap().contains("web"));
    }
}
