//! # Error Types
//!
//! Domain-specific error types for cafe-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cafe-core errors (this file)                                          │
//! │  ├── CoreError        - Lifecycle and business rule violations         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  cafe-db errors                                                        │
//! │  └── DbError          - Storage failures, stale compare-and-set        │
//! │                                                                         │
//! │  cafe-api errors                                                       │
//! │  └── ApiError         - HTTP status + {success:false, message}         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Envelope     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::{ItemStatus, OrderStatus, Role};

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Order id does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Line item id does not exist on the order.
    #[error("Item {item_id} not found on order {order_id}")]
    ItemNotFound { order_id: String, item_id: String },

    /// Requested order status is not a legal next state for this role.
    ///
    /// ## When This Occurs
    /// - Waiter asks for OUT_FOR_DELIVERY on a Dine-in order
    /// - Kitchen asks for CLOSED
    /// - A stale dashboard asks for PREPARING on an order already READY
    #[error("Order {order_id}: cannot move from {from} to {to} as {role}")]
    InvalidTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
        role: Role,
    },

    /// Requested item status is not legal for this role / order state.
    #[error("Item {item_id} on order {order_id}: cannot move from {from} to {to}")]
    InvalidItemTransition {
        order_id: String,
        item_id: String,
        from: ItemStatus,
        to: ItemStatus,
    },

    /// Order is CLOSED or CANCELLED and accepts no further changes.
    #[error("Order {order_id} is {status} and can no longer be changed")]
    TerminalOrder { order_id: String, status: OrderStatus },

    /// The delivery-fee line item carries no preparation status.
    #[error("{item_id} is not a trackable item")]
    UntrackedItem { item_id: String },

    /// Role lacks authority for an action that is not a status transition.
    #[error("{role} is not allowed to {action}")]
    Forbidden { role: Role, action: String },

    /// Order has no food items.
    #[error("Order must contain at least one item")]
    EmptyOrder,

    /// Order has exceeded maximum allowed line items.
    #[error("Order cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a Forbidden error.
    pub fn forbidden(role: Role, action: impl Into<String>) -> Self {
        CoreError::Forbidden {
            role,
            action: action.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed email or mobile number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., same item twice in one order).
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub(crate) fn format(field: &str, reason: &str) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_error_message() {
        let err = CoreError::InvalidTransition {
            order_id: "ORD-1".to_string(),
            from: OrderStatus::Ready,
            to: OrderStatus::OutForDelivery,
            role: Role::Waiter,
        };
        assert_eq!(
            err.to_string(),
            "Order ORD-1: cannot move from READY to OUT_FOR_DELIVERY as waiter"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("mobile");
        assert_eq!(err.to_string(), "mobile is required");

        let err = ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        };
        assert_eq!(err.to_string(), "password must be at least 6 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("address").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
