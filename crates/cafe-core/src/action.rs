//! # Action Payloads
//!
//! The wire vocabulary of the `/exec` endpoint: the response envelope, the
//! read actions and the tagged mutation payloads.
//!
//! ## Request Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Reads      GET  /exec?action=orders&token=…                           │
//! │             (ReadAction, token optional for public reads)              │
//! │                                                                         │
//! │  Mutations  POST /exec?action=closeOrder                               │
//! │             { "action": "closeOrder", "token": "…", "orderId": "…" }   │
//! │             (ActionRequest, tagged by "action")                        │
//! │                                                                         │
//! │  Response   { "success": true,  "data": … }                            │
//! │             { "success": false, "message": "Unauthorized" }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The bearer token may also travel in the `Authorization` header; the
//! endpoint accepts either.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{FulfillmentMode, ItemStatus, LineItem, OrderStatus, PaymentMode, Role};

// =============================================================================
// Envelope
// =============================================================================

/// `{ success, message?, data? }`.
///
/// A missing `success` field decodes as `false`: only an explicit
/// `"success": true` counts as success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Success carrying data.
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// Failure with a human-readable message.
    pub fn fail(message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Success with only a message.
    pub fn ok_message(message: impl Into<String>) -> Self {
        ApiResponse {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Collapses the envelope into a Result. The error is the server message,
    /// or a generic one when the server sent none.
    pub fn into_result(self) -> Result<Option<T>, String> {
        if self.success {
            Ok(self.data)
        } else {
            Err(self
                .message
                .unwrap_or_else(|| "Request failed".to_string()))
        }
    }
}

// =============================================================================
// Reads
// =============================================================================

/// Actions served over GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum ReadAction {
    /// Public: available menu items, display-ordered.
    Menu,
    /// Public: tables and the counter.
    Locations,
    /// Token: orders visible to the caller's role.
    Orders,
    /// Token (admin): staff accounts.
    GetUsers,
    /// Token (manager): every menu item, available or not.
    GetManagerMenu,
}

impl ReadAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReadAction::Menu => "menu",
            ReadAction::Locations => "locations",
            ReadAction::Orders => "orders",
            ReadAction::GetUsers => "getUsers",
            ReadAction::GetManagerMenu => "getManagerMenu",
        }
    }

    /// Reads that need no session.
    pub const fn is_public(&self) -> bool {
        matches!(self, ReadAction::Menu | ReadAction::Locations)
    }
}

impl fmt::Display for ReadAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Mutations
// =============================================================================

/// A POST body, discriminated by its `action` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "action", rename_all = "camelCase")]
#[ts(export)]
pub enum ActionRequest {
    // ----- Orders -----
    CreateOrder(CreateOrder),
    UpdateOrderStatus(UpdateOrderStatus),
    UpdateItemStatus(UpdateItemStatus),
    CloseOrder(CloseOrder),
    CancelOrder(CancelOrder),
    EditOrder(EditOrder),

    // ----- Session -----
    Login(Login),
    Logout,
    ChangePassword(ChangePassword),

    // ----- User admin -----
    AdminResetPassword(AdminResetPassword),
    CreateUser(CreateUser),
    DeleteUser(DeleteUser),
    UpdateUser(UpdateUser),

    // ----- Menu -----
    UpdateMenuItem(MenuItemUpdate),
    BatchUpdateMenuItems(BatchUpdateMenuItems),

    // ----- Public -----
    Newsletter(Newsletter),
}

impl ActionRequest {
    /// Wire name of the action, used in log fields.
    pub const fn name(&self) -> &'static str {
        match self {
            ActionRequest::CreateOrder(_) => "createOrder",
            ActionRequest::UpdateOrderStatus(_) => "updateOrderStatus",
            ActionRequest::UpdateItemStatus(_) => "updateItemStatus",
            ActionRequest::CloseOrder(_) => "closeOrder",
            ActionRequest::CancelOrder(_) => "cancelOrder",
            ActionRequest::EditOrder(_) => "editOrder",
            ActionRequest::Login(_) => "login",
            ActionRequest::Logout => "logout",
            ActionRequest::ChangePassword(_) => "changePassword",
            ActionRequest::AdminResetPassword(_) => "adminResetPassword",
            ActionRequest::CreateUser(_) => "createUser",
            ActionRequest::DeleteUser(_) => "deleteUser",
            ActionRequest::UpdateUser(_) => "updateUser",
            ActionRequest::UpdateMenuItem(_) => "updateMenuItem",
            ActionRequest::BatchUpdateMenuItems(_) => "batchUpdateMenuItems",
            ActionRequest::Newsletter(_) => "newsletter",
        }
    }
}

/// New order from the order builder. Totals are recomputed server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateOrder {
    pub mode: FulfillmentMode,
    /// Table id for Dine-in; ignored otherwise.
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub address: String,
    pub items: Vec<LineItem>,
    /// Public submission key, required when no staff token is sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateOrderResult {
    pub order_id: String,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateOrderStatus {
    pub order_id: String,
    pub next_status: OrderStatus,
    /// Raise food items along with the order. Defaults to true.
    #[serde(default = "default_true")]
    pub cascade: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateItemStatus {
    pub order_id: String,
    #[serde(alias = "orderItemId")]
    pub item_id: String,
    pub next_status: ItemStatus,
}

/// Close dialog submission. Percent wins over amount when both are set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CloseOrder {
    pub order_id: String,
    /// Total the dialog showed. Informational; the stored total is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Money>,
    #[serde(default)]
    pub discount_percent: f64,
    #[serde(default)]
    pub discount_amount: Money,
    #[serde(default)]
    pub payment_mode: PaymentMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CloseOrderResult {
    pub order_id: String,
    pub discount_percent: f64,
    pub discount_amount: Money,
    pub final_amount: Money,
    pub payment_mode: PaymentMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CancelOrder {
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Replaces the food items of an order. Statuses of surviving items are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EditOrder {
    pub order_id: String,
    pub items: Vec<LineItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Login {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ChangePassword {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AdminResetPassword {
    pub target_username: String,
    pub new_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateUser {
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DeleteUser {
    pub target_username: String,
}

/// Name and/or role change. Absent fields are left alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateUser {
    pub target_username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Partial menu item update. Absent fields are left alone.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MenuItemUpdate {
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl MenuItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.available.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BatchUpdateMenuItems {
    pub updates: Vec<MenuItemUpdate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Newsletter {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Unit Tests
// =============================================================================
