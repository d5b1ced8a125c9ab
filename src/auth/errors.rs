//! 认证error类型定义

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 认证error
#[derive(Debug, Error)]
pub enum AuthError {
    /// Transport or HTTP-level failure talking to the identity provider (timeouts included)
    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider answered with its own non-zero error code
    #[error("{message}")]
    ProviderRejected { code: i64, message: String },

    #[error("Identity provider returned an empty response")]
    ProviderResponseEmpty,

    #[error("User creation failed")]
    UserCreationFailed,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Token expired")]
    TokenExpired,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: missing authority {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Numeric code carried by the response envelope; also used as the HTTP status.
    pub fn envelope_code(&self) -> u16 {
        match self {
            Self::TokenInvalid
            | Self::TokenExpired
            | Self::Unauthorized => 401,

            Self::ProviderUnavailable(_)
            | Self::ProviderRejected { .. }
            | Self::ProviderResponseEmpty
            | Self::UserCreationFailed => 406,

            Self::Forbidden(_) => 403,

            Self::ValidationError(_) => 400,

            Self::Configuration(_)
            | Self::StorageError(_)
            | Self::InternalError(_) => 500,
        }
    }

    /// fetchHTTP状态码
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.envelope_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// fetcherror代码（用于日志）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ProviderUnavailable(_) => "provider_unavailable",
            Self::ProviderRejected { .. } => "provider_rejected",
            Self::ProviderResponseEmpty => "provider_response_empty",
            Self::UserCreationFailed => "user_creation_failed",
            Self::TokenInvalid => "token_invalid",
            Self::TokenExpired => "token_expired",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::ValidationError(_) => "validation_error",
            Self::Configuration(_) => "configuration_error",
            Self::StorageError(_) => "storage_error",
            Self::InternalError(_) => "server_error",
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

/// 实现 IntoResponse，使 AuthError 可以直接作为 Axum 响应
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.envelope_code();

        if status.is_server_error() {
            tracing::error!(error_code = self.error_code(), "request failed: {}", self);
        } else {
            tracing::debug!(error_code = self.error_code(), "request rejected: {}", self);
        }

        let body = Json(json!({
            "code": code,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_codes() {
        assert_eq!(AuthError::TokenInvalid.envelope_code(), 401);
        assert_eq!(AuthError::TokenExpired.envelope_code(), 401);
        assert_eq!(AuthError::ProviderResponseEmpty.envelope_code(), 406);
        assert_eq!(
            AuthError::ProviderRejected { code: 40029, message: "invalid code".into() }
                .envelope_code(),
            406
        );
        assert_eq!(AuthError::ValidationError("x".into()).envelope_code(), 400);
        assert_eq!(AuthError::StorageError("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_provider_rejection_message_is_passed_through() {
        let err = AuthError::ProviderRejected { code: 40029, message: "invalid code".into() };
        assert_eq!(err.to_string(), "invalid code");
        assert_eq!(err.error_code(), "provider_rejected");
    }

    #[tokio::test]
    async fn test_into_response_envelope() {
        let response = AuthError::TokenExpired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], 401);
        assert_eq!(body["message"], "Token expired");
    }
}
