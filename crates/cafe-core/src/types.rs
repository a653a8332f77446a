//! # Domain Types
//!
//! Core domain types shared by the endpoint, the store and the client.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │    LineItem     │   │    MenuItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  order_id       │──►│  item_id        │   │  item_id        │       │
//! │  │  status         │   │  name, qty      │   │  category       │       │
//! │  │  mode           │   │  price          │   │  *_order        │       │
//! │  │  total          │   │  status         │   │  price          │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  OrderStatus    │   │   ItemStatus    │   │ FulfillmentMode │       │
//! │  │  OPEN … CLOSED  │   │  OPEN … SERVED  │   │  Dine-in        │       │
//! │  │  (10 states)    │   │  (5 states)     │   │  Takeaway       │       │
//! │  └─────────────────┘   └─────────────────┘   │  Delivery       │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Names
//! Order records keep the column-style field names the dashboards consume
//! (`"Order ID"`, `"Order Status"`, `"Mode"`, ...). Line items, menu items
//! and users use camelCase.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::{DELIVERY_FEE, DELIVERY_FEE_ITEM_ID, DELIVERY_FEE_NAME};

// =============================================================================
// Order Status
// =============================================================================

/// Order-level status.
///
/// ```text
/// OPEN → PREPARING → {PARTIALLY_READY | READY} → {SERVED | HANDED_OVER | OUT_FOR_DELIVERY}
///                                                         OUT_FOR_DELIVERY → DELIVERED
/// SERVED | HANDED_OVER | DELIVERED → CLOSED        (manager)
/// any non-terminal → CANCELLED                     (manager)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum OrderStatus {
    Open,
    Preparing,
    PartiallyReady,
    Ready,
    Served,
    HandedOver,
    OutForDelivery,
    Delivered,
    Closed,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 10] = [
        OrderStatus::Open,
        OrderStatus::Preparing,
        OrderStatus::PartiallyReady,
        OrderStatus::Ready,
        OrderStatus::Served,
        OrderStatus::HandedOver,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Closed,
        OrderStatus::Cancelled,
    ];

    /// Wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "OPEN",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::PartiallyReady => "PARTIALLY_READY",
            OrderStatus::Ready => "READY",
            OrderStatus::Served => "SERVED",
            OrderStatus::HandedOver => "HANDED_OVER",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Closed => "CLOSED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// CLOSED and CANCELLED accept no further mutation.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Closed | OrderStatus::Cancelled)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Open
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::format("status", "unknown order status"))
    }
}

// =============================================================================
// Item Status
// =============================================================================

/// Per-line-item preparation status.
///
/// Absent on the wire means OPEN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ItemStatus {
    Open,
    Preparing,
    Ready,
    Served,
    HandedOver,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 5] = [
        ItemStatus::Open,
        ItemStatus::Preparing,
        ItemStatus::Ready,
        ItemStatus::Served,
        ItemStatus::HandedOver,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Open => "OPEN",
            ItemStatus::Preparing => "PREPARING",
            ItemStatus::Ready => "READY",
            ItemStatus::Served => "SERVED",
            ItemStatus::HandedOver => "HANDED_OVER",
        }
    }

    /// Position along OPEN → PREPARING → READY → handed off.
    pub const fn rank(&self) -> u8 {
        match self {
            ItemStatus::Open => 0,
            ItemStatus::Preparing => 1,
            ItemStatus::Ready => 2,
            ItemStatus::Served | ItemStatus::HandedOver => 3,
        }
    }

    /// READY or already handed to the customer.
    pub const fn is_ready_or_beyond(&self) -> bool {
        self.rank() >= 2
    }

    /// SERVED or HANDED_OVER. The kitchen no longer touches these.
    pub const fn is_handed_off(&self) -> bool {
        matches!(self, ItemStatus::Served | ItemStatus::HandedOver)
    }
}

impl Default for ItemStatus {
    fn default() -> Self {
        ItemStatus::Open
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::format("status", "unknown item status"))
    }
}

// =============================================================================
// Fulfillment Mode
// =============================================================================

/// How the order reaches the customer. Decides the surcharge and the
/// status reached from READY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum FulfillmentMode {
    #[serde(rename = "Dine-in")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Dine-in"))]
    DineIn,
    Takeaway,
    Delivery,
}

impl FulfillmentMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            FulfillmentMode::DineIn => "Dine-in",
            FulfillmentMode::Takeaway => "Takeaway",
            FulfillmentMode::Delivery => "Delivery",
        }
    }

    /// Dine-in orders are seated at a table; the rest use the counter.
    pub const fn uses_counter(&self) -> bool {
        !matches!(self, FulfillmentMode::DineIn)
    }
}

impl fmt::Display for FulfillmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Role
// =============================================================================

/// Staff role carried by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Kitchen,
    Waiter,
    Delivery,
    Manager,
    Admin,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Kitchen,
        Role::Waiter,
        Role::Delivery,
        Role::Manager,
        Role::Admin,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Kitchen => "kitchen",
            Role::Waiter => "waiter",
            Role::Delivery => "delivery",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    /// Manager-only actions (close, cancel, edit, menu) are open to admins too.
    pub const fn is_manager(&self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }

    /// User management is admin-only.
    pub const fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ValidationError::format("role", "unknown role"))
    }
}

// =============================================================================
// Payment Mode
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum PaymentMode {
    Cash,
    Card,
    #[serde(rename = "UPI")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "UPI"))]
    Upi,
}

impl Default for PaymentMode {
    fn default() -> Self {
        PaymentMode::Cash
    }
}

// =============================================================================
// Discount Rate
// =============================================================================

/// Discount percentage held in basis points (1000 = 10%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiscountRate(u32);

impl DiscountRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Converts the percentage typed into the close dialog. Negative and
    /// non-finite input becomes zero.
    pub fn from_percent(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return DiscountRate(0);
        }
        DiscountRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Percentage for display and storage.
    #[inline]
    pub fn percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One ordered menu item with its own preparation status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineItem {
    pub item_id: String,
    pub name: String,
    pub qty: i64,
    /// Unit price in whole units.
    pub price: Money,
    #[serde(default)]
    pub status: ItemStatus,
}

impl LineItem {
    /// New OPEN line item.
    pub fn new(item_id: impl Into<String>, name: impl Into<String>, qty: i64, price: i64) -> Self {
        LineItem {
            item_id: item_id.into(),
            name: name.into(),
            qty,
            price: Money::new(price),
            status: ItemStatus::Open,
        }
    }

    /// The synthetic delivery-fee line (qty 1, flat fee).
    pub fn delivery_fee() -> Self {
        LineItem::new(DELIVERY_FEE_ITEM_ID, DELIVERY_FEE_NAME, 1, DELIVERY_FEE)
    }

    /// True for the delivery-fee sentinel.
    #[inline]
    pub fn is_delivery_fee(&self) -> bool {
        self.item_id == DELIVERY_FEE_ITEM_ID
    }

    /// price × qty.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.price.times(self.qty)
    }
}

// =============================================================================
// Order
// =============================================================================

/// An order record as exposed by the `orders` read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    #[serde(rename = "Order ID")]
    pub order_id: String,

    #[serde(rename = "Order Status")]
    pub status: OrderStatus,

    #[serde(rename = "Mode")]
    pub mode: FulfillmentMode,

    /// Table id for Dine-in, `COUNTER` otherwise.
    #[serde(rename = "Location ID")]
    pub location_id: String,

    #[serde(rename = "Customer Name", default)]
    pub customer_name: String,

    #[serde(rename = "Mobile", default)]
    pub mobile: String,

    /// Required only for Delivery.
    #[serde(rename = "Address", default)]
    pub address: String,

    /// Sum of all line items, delivery fee included.
    #[serde(rename = "Total")]
    pub total: Money,

    #[serde(rename = "Discount Percent", default)]
    pub discount_percent: Option<f64>,

    #[serde(rename = "Discount Amount", default)]
    pub discount_amount: Option<Money>,

    /// Set when the order is closed.
    #[serde(rename = "Final Amount", default)]
    pub final_amount: Option<Money>,

    #[serde(rename = "Payment Mode", default)]
    pub payment_mode: Option<PaymentMode>,

    /// Username of the staff member who placed the order, if any.
    #[serde(rename = "Staff Member", default)]
    pub staff_member: Option<String>,

    #[serde(rename = "Cancel Reason", default)]
    pub cancel_reason: Option<String>,

    #[serde(rename = "Ordered At")]
    #[ts(as = "String")]
    pub ordered_at: DateTime<Utc>,

    #[serde(rename = "Updated At")]
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    pub items: Vec<LineItem>,
}

impl Order {
    /// Line items excluding the delivery-fee sentinel.
    pub fn food_items(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter().filter(|item| !item.is_delivery_fee())
    }

    /// The delivery-fee sentinel, if present.
    pub fn delivery_fee_item(&self) -> Option<&LineItem> {
        self.items.iter().find(|item| item.is_delivery_fee())
    }

    /// Finds a food line item by id.
    pub fn item(&self, item_id: &str) -> Option<&LineItem> {
        self.food_items().find(|item| item.item_id == item_id)
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// =============================================================================
// Menu
// =============================================================================

/// A sellable menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MenuItem {
    pub item_id: String,
    pub name: String,
    pub category: String,
    pub category_order: i64,
    pub item_order: i64,
    pub price: Money,
    /// Hidden from the public menu when false.
    #[serde(default = "default_true")]
    pub available: bool,
}

fn default_true() -> bool {
    true
}

/// A seating location (table) or the `COUNTER` pseudo-location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Location {
    pub location_id: String,
    pub name: String,
}

// =============================================================================
// Users & Sessions
// =============================================================================

/// Staff member as listed by `getUsers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserProfile {
    pub username: String,
    pub name: String,
    pub role: Role,
}

/// Logged-in user as returned by `login` and held for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionUser {
    pub username: String,
    pub name: String,
    pub role: Role,
    /// Opaque bearer token.
    pub token: String,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::PartiallyReady).unwrap(),
            "\"PARTIALLY_READY\""
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::OutForDelivery).unwrap(),
            "\"OUT_FOR_DELIVERY\""
        );
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("DONE".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_mode_wire_names() {
        assert_eq!(
            serde_json::to_string(&FulfillmentMode::DineIn).unwrap(),
            "\"Dine-in\""
        );
        let mode: FulfillmentMode = serde_json::from_str("\"Takeaway\"").unwrap();
        assert_eq!(mode, FulfillmentMode::Takeaway);
    }

    #[test]
    fn test_item_status_defaults_to_open() {
        let item: LineItem =
            serde_json::from_str(r#"{"itemId":"poha","name":"Poha","qty":2,"price":60}"#).unwrap();
        assert_eq!(item.status, ItemStatus::Open);
        assert_eq!(item.line_total().amount(), 120);
    }

    #[test]
    fn test_item_status_progress_checks() {
        assert!(!ItemStatus::Open.is_handed_off());
        assert!(!ItemStatus::Preparing.is_handed_off());
        assert!(!ItemStatus::Ready.is_handed_off());
        assert!(ItemStatus::Served.is_handed_off());
        assert!(ItemStatus::HandedOver.is_handed_off());

        assert!(!ItemStatus::Preparing.is_ready_or_beyond());
        assert!(ItemStatus::Ready.is_ready_or_beyond());
        assert!(ItemStatus::HandedOver.is_ready_or_beyond());
    }

    #[test]
    fn test_delivery_fee_item() {
        let fee = LineItem::delivery_fee();
        assert!(fee.is_delivery_fee());
        assert_eq!(fee.qty, 1);
        assert_eq!(fee.price.amount(), 50);
    }

    #[test]
    fn test_order_wire_field_names() {
        let now = Utc::now();
        let order = Order {
            order_id: "ORD-1".to_string(),
            status: OrderStatus::Open,
            mode: FulfillmentMode::Delivery,
            location_id: "COUNTER".to_string(),
            customer_name: "Asha".to_string(),
            mobile: "9876543210".to_string(),
            address: "12 MG Road".to_string(),
            total: Money::new(300),
            discount_percent: None,
            discount_amount: None,
            final_amount: None,
            payment_mode: None,
            staff_member: None,
            cancel_reason: None,
            ordered_at: now,
            updated_at: now,
            items: vec![LineItem::new("poha", "Poha", 1, 250), LineItem::delivery_fee()],
        };

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["Order ID"], "ORD-1");
        assert_eq!(json["Order Status"], "OPEN");
        assert_eq!(json["Mode"], "Delivery");
        assert_eq!(json["Location ID"], "COUNTER");
        assert_eq!(json["Total"], 300);
        assert_eq!(json["items"][0]["itemId"], "poha");

        assert_eq!(order.food_items().count(), 1);
        assert!(order.delivery_fee_item().is_some());
        assert!(order.item("DELIVERY_FEE").is_none());
    }

    #[test]
    fn test_role_authority() {
        assert!(Role::Manager.is_manager());
        assert!(Role::Admin.is_manager());
        assert!(!Role::Waiter.is_manager());
        assert!(Role::Admin.is_admin());
        assert!(!Role::Manager.is_admin());
        assert_eq!("delivery".parse::<Role>().unwrap(), Role::Delivery);
    }

    #[test]
    fn test_discount_rate_from_percent() {
        assert_eq!(DiscountRate::from_percent(10.0).bps(), 1000);
        assert_eq!(DiscountRate::from_percent(12.5).bps(), 1250);
        assert!(DiscountRate::from_percent(-5.0).is_zero());
        assert!(DiscountRate::from_percent(f64::NAN).is_zero());
    }
}
