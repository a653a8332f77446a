//! Error types for Cafe API.
//!
//! Every failure leaves the server as the standard envelope,
//! `{ "success": false, "message": "..." }`, with an HTTP status that
//! mirrors the failure class:
//!
//! ```text
//! ValidationError / bad input ─────────► 400
//! missing or dead token ───────────────► 401  message "Unauthorized"
//! role lacks authority ────────────────► 403
//! unknown order / user / item ─────────► 404
//! illegal transition, stale write,
//! duplicate username ──────────────────► 409
//! storage / hashing failures ──────────► 500  detail logged, not sent
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use cafe_core::action::ApiResponse;
use cafe_core::{CoreError, ValidationError};
use cafe_db::DbError;

/// Cafe API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the client. Internal details stay in the log.
    pub fn response_message(&self) -> String {
        match self {
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let ApiError::Internal(detail) = &self {
            tracing::error!(error = %detail, "Action failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Action rejected");
        }

        let body: ApiResponse<()> = ApiResponse::fail(self.response_message());
        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::OrderNotFound(_) | CoreError::ItemNotFound { .. } => {
                ApiError::NotFound(error.to_string())
            }
            CoreError::InvalidTransition { .. }
            | CoreError::InvalidItemTransition { .. }
            | CoreError::TerminalOrder { .. } => ApiError::Conflict(error.to_string()),
            CoreError::Forbidden { .. } => ApiError::Forbidden(error.to_string()),
            CoreError::UntrackedItem { .. }
            | CoreError::EmptyOrder
            | CoreError::CartTooLarge { .. }
            | CoreError::QuantityTooLarge { .. } => ApiError::BadRequest(error.to_string()),
            CoreError::Validation(inner) => inner.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::BadRequest(error.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::NotFound { .. } => ApiError::NotFound(error.to_string()),
            DbError::UniqueViolation { .. } | DbError::Conflict { .. } | DbError::Busy => {
                ApiError::Conflict(error.to_string())
            }
            DbError::ForeignKeyViolation { .. } => ApiError::BadRequest(error.to_string()),
            DbError::Rule(rule) => rule.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cafe_core::{OrderStatus, Role};

    #[test]
    fn test_unauthorized_message_is_literal() {
        let err = ApiError::Unauthorized;
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.response_message(), "Unauthorized");
    }

    #[test]
    fn test_internal_detail_hidden() {
        let err = ApiError::Internal("disk I/O error at page 42".to_string());
        assert_eq!(err.response_message(), "Internal server error");
    }

    #[test]
    fn test_rule_mapping() {
        let illegal: ApiError = DbError::Rule(CoreError::InvalidTransition {
            order_id: "ORD-1".to_string(),
            from: OrderStatus::Open,
            to: OrderStatus::Closed,
            role: Role::Kitchen,
        })
        .into();
        assert_eq!(illegal.status_code(), StatusCode::CONFLICT);

        let forbidden: ApiError = CoreError::forbidden(Role::Waiter, "edit orders").into();
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);

        let stale: ApiError = DbError::conflict("Order", "ORD-1", "READY", "SERVED").into();
        assert_eq!(stale.status_code(), StatusCode::CONFLICT);

        let missing: ApiError = DbError::not_found("Order", "ORD-9").into();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let invalid: ApiError = CoreError::EmptyOrder.into();
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
    }
}
