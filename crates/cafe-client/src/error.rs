//! # Client Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Transport     │  │   Envelope      │  │     Local               │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Network        │  │  Api            │  │  CartError              │ │
//! │  │  Http           │  │  Unauthorized   │  │  (before any request)   │ │
//! │  │                 │  │  Decode         │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Unauthorized ──► session cleared ──► dashboard forced to log out       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use cafe_core::ValidationError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Marker the server puts in every authentication failure message.
const UNAUTHORIZED_MARKER: &str = "Unauthorized";

/// Failure of a call to the action endpoint.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection refused, timeout, TLS failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx status without a readable envelope.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The server answered with `success` other than `true`.
    #[error("{0}")]
    Api(String),

    /// Missing, expired or revoked session.
    ///
    /// ## When This Occurs
    /// - HTTP 401
    /// - Any failure message containing "Unauthorized"
    /// - A staff call made with no one logged in
    #[error("{0}")]
    Unauthorized(String),

    /// Body was not the expected JSON.
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Classifies a failed envelope.
    pub fn from_failure(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 401 || message.contains(UNAUTHORIZED_MARKER) {
            ClientError::Unauthorized(message)
        } else {
            ClientError::Api(message)
        }
    }

    /// True if the session is gone and the user must log in again.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            ClientError::Unauthorized(_) => true,
            ClientError::Http { status, .. } => *status == 401,
            _ => false,
        }
    }
}

/// Rejections raised by the order builder before anything is sent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CartError {
    #[error("Please add items to the order")]
    Empty,

    #[error("Quantity cannot exceed {max}")]
    QuantityTooLarge { max: i64 },

    #[error("An order cannot have more than {max} items")]
    TooManyItems { max: usize },

    #[error("Please select a table")]
    MissingLocation,

    /// Mode and location are fixed while adding to an existing order.
    #[error("Order #{order_id} keeps its mode and location")]
    Locked { order_id: String },

    #[error("This cart {0}")]
    WrongTarget(&'static str),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
