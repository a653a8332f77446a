//! # cafe-core: Pure Business Logic for Cafe Ops
//!
//! Everything that decides *what is allowed* lives here: which status an
//! order may move to, who may move it, what an order costs. No I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cafe Ops Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   Order builder / role dashboards (cafe-client)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ GET|POST /exec?action=...              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │   Action endpoint (cafe-api)                                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cafe-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  pricing  │  │ lifecycle │  │  action   │  │   │
//! │  │   │  Order    │  │ subtotal  │  │ tables    │  │ envelope  │  │   │
//! │  │   │  LineItem │  │ discount  │  │ roles     │  │ payloads  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │   cafe-db: SQLite repositories, compare-and-set status writes   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Orders, line items, menu, users and the status enums
//! - [`money`] - Whole-unit money with round-half-up percentages
//! - [`pricing`] - Subtotal, discount, final amount, delivery surcharge
//! - [`lifecycle`] - Order/item state machine and role visibility tables
//! - [`action`] - Request payloads and the `{success, message, data}` envelope
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use cafe_core::{pricing, FulfillmentMode, LineItem};
//!
//! let items = vec![
//!     LineItem::new("masala-chai", "Masala Chai", 2, 100),
//!     LineItem::new("poha", "Poha", 1, 50),
//! ];
//!
//! let quote = pricing::quote(&items, FulfillmentMode::Delivery);
//! assert_eq!(quote.food_subtotal.amount(), 250);
//! assert_eq!(quote.delivery_fee.amount(), 50);
//! assert_eq!(quote.total.amount(), 300);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod action;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Item id of the synthetic delivery-fee line item.
///
/// The fee travels as a line item so that anything summing line items
/// (kitchen ticket, receipt, stored total) agrees with the order total.
pub const DELIVERY_FEE_ITEM_ID: &str = "DELIVERY_FEE";

/// Display name of the delivery-fee line item.
pub const DELIVERY_FEE_NAME: &str = "Delivery Fee";

/// Flat delivery surcharge in whole currency units.
pub const DELIVERY_FEE: i64 = 50;

/// Food subtotal at or above which delivery is free.
pub const FREE_DELIVERY_THRESHOLD: i64 = 500;

/// Pseudo-location used for Takeaway and Delivery orders.
pub const COUNTER_LOCATION_ID: &str = "COUNTER";

/// Maximum distinct line items in a single order.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Catches fat-finger input (100 instead of 10) at the counter.
pub const MAX_ITEM_QUANTITY: i64 = 99;

/// Highest unit price a menu item may carry.
///
/// `MAX_CART_ITEMS × MAX_ITEM_QUANTITY × MAX_ITEM_PRICE` stays far below
/// `i64::MAX`, so order totals built from menu prices cannot overflow.
pub const MAX_ITEM_PRICE: i64 = 1_000_000;
