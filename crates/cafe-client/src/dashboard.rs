//! # Role Dashboards
//!
//! Application state and view-models for the staff dashboard.
//!
//! ## State
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Dashboard<B>                                   │
//! │                                                                         │
//! │  user ─────────► role ─► tabs          (lifecycle::visible_statuses)    │
//! │  active_tab ───────────► visible_orders (tab + role_sees_mode)          │
//! │  orders (cache) ───────► order_actions / item_actions per card          │
//! │                                                                         │
//! │  mutation ──► await backend ──► refresh() ──► cache replaced            │
//! │       │                                                                 │
//! │       └── Unauthorized ──► logged out, cache dropped                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is updated optimistically: the cache only ever holds what the
//! server last returned.

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use cafe_core::action::{CloseOrder, CloseOrderResult};
use cafe_core::lifecycle::{
    can_cancel, can_close, next_states_for, role_sees_mode, serve_all_targets, visible_statuses,
};
use cafe_core::pricing::{self, CloseQuote, PriceBreakdown};
use cafe_core::{
    DiscountRate, FulfillmentMode, ItemStatus, LineItem, Money, Order, OrderStatus, PaymentMode,
    Role, SessionUser,
};

use crate::api::StaffBackend;
use crate::error::{ClientError, ClientResult};

// =============================================================================
// View-Models
// =============================================================================

/// A button on an order card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum OrderAction {
    /// Moves the whole order to `to`.
    Advance { to: OrderStatus },
    /// Moves every READY item to the mode's handoff status.
    ServeAll { mode: FulfillmentMode },
    Cancel,
    Edit,
    Close,
}

impl OrderAction {
    pub fn label(&self) -> &'static str {
        match self {
            OrderAction::Advance { to } => to.as_str(),
            OrderAction::ServeAll {
                mode: FulfillmentMode::Takeaway,
            } => "Hand Over",
            OrderAction::ServeAll { .. } => "Serve All",
            OrderAction::Cancel => "Cancel",
            OrderAction::Edit => "Edit",
            OrderAction::Close => "Close",
        }
    }
}

/// A checkbox next to a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ItemAction {
    /// Kitchen "Mark Ready" box; ticked when the item is READY. Toggling
    /// sends `next`.
    ReadyToggle { checked: bool, next: ItemStatus },
    /// Floor "Serve" box on a READY Dine-in item.
    Serve { next: ItemStatus },
}

/// Buttons a role gets on an order card.
///
/// ## Rules
/// - Kitchen gets nothing once food is (partly) ready.
/// - A waiter on a READY Dine-in or Takeaway order gets one "Serve All" /
///   "Hand Over" button instead of a status button.
/// - Otherwise: the legal next statuses for the role, without CLOSED.
/// - Managers add Cancel and Edit on live orders, Close once handed off.
pub fn order_actions(role: Role, order: &Order) -> Vec<OrderAction> {
    let status = order.status;

    if role == Role::Kitchen && matches!(status, OrderStatus::Ready | OrderStatus::PartiallyReady) {
        return Vec::new();
    }

    let mut actions = Vec::new();

    if status == OrderStatus::Ready && role == Role::Waiter && order.mode != FulfillmentMode::Delivery
    {
        actions.push(OrderAction::ServeAll { mode: order.mode });
    } else {
        actions.extend(
            next_states_for(status, order.mode, role)
                .into_iter()
                .filter(|next| *next != OrderStatus::Closed)
                .map(|to| OrderAction::Advance { to }),
        );
    }

    if role.is_manager() {
        if can_cancel(role, status) {
            actions.push(OrderAction::Cancel);
            actions.push(OrderAction::Edit);
        }
        if can_close(role, status) {
            actions.push(OrderAction::Close);
        }
    }

    actions
}

/// Checkboxes a role gets next to a line item.
pub fn item_actions(role: Role, order: &Order, item: &LineItem) -> Vec<ItemAction> {
    if item.is_delivery_fee() || order.is_terminal() {
        return Vec::new();
    }

    let mut actions = Vec::new();

    let cooking = matches!(
        order.status,
        OrderStatus::Preparing | OrderStatus::PartiallyReady
    );
    let handed_off = matches!(item.status, ItemStatus::Served | ItemStatus::HandedOver);
    if (role == Role::Kitchen || role.is_manager()) && cooking && !handed_off {
        let checked = item.status == ItemStatus::Ready;
        actions.push(ItemAction::ReadyToggle {
            checked,
            next: if checked {
                ItemStatus::Preparing
            } else {
                ItemStatus::Ready
            },
        });
    }

    let serving = matches!(order.status, OrderStatus::PartiallyReady | OrderStatus::Ready);
    if (role == Role::Waiter || role.is_manager())
        && serving
        && order.mode == FulfillmentMode::DineIn
        && item.status == ItemStatus::Ready
    {
        actions.push(ItemAction::Serve {
            next: ItemStatus::Served,
        });
    }

    actions
}

// =============================================================================
// Close Dialog
// =============================================================================

/// The manager's close dialog. The base is the order total, delivery fee
/// included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseForm {
    pub order_id: String,
    pub base: Money,
    pub discount_percent: f64,
    pub discount_amount: Money,
    pub payment_mode: PaymentMode,
}

impl CloseForm {
    pub fn new(order: &Order) -> Self {
        CloseForm {
            order_id: order.order_id.clone(),
            base: order.total,
            discount_percent: 0.0,
            discount_amount: Money::zero(),
            payment_mode: PaymentMode::default(),
        }
    }

    /// Typing a percentage fills in the matching amount.
    pub fn set_percent(&mut self, percent: f64) {
        self.discount_percent = percent;
        self.discount_amount = self.base.percent(DiscountRate::from_percent(percent));
    }

    /// Typing an amount clears the percentage.
    pub fn set_amount(&mut self, amount: Money) {
        self.discount_percent = 0.0;
        self.discount_amount = amount;
    }

    pub fn set_payment_mode(&mut self, mode: PaymentMode) {
        self.payment_mode = mode;
    }

    pub fn preview(&self) -> CloseQuote {
        pricing::close_quote(self.base, self.discount_percent, self.discount_amount)
    }

    pub fn to_request(&self) -> CloseOrder {
        CloseOrder {
            order_id: self.order_id.clone(),
            subtotal: Some(self.base),
            discount_percent: self.discount_percent,
            discount_amount: self.discount_amount,
            payment_mode: self.payment_mode,
        }
    }
}

// =============================================================================
// Edit Dialog
// =============================================================================

/// The manager's edit dialog: adjust or drop the food items of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditForm {
    pub order_id: String,
    pub mode: FulfillmentMode,
    pub items: Vec<LineItem>,
}

impl EditForm {
    pub fn new(order: &Order) -> Self {
        EditForm {
            order_id: order.order_id.clone(),
            mode: order.mode,
            items: order.food_items().cloned().collect(),
        }
    }

    /// Adjusts a line; it is dropped at zero.
    pub fn change_qty(&mut self, item_id: &str, delta: i64) {
        if let Some(idx) = self.items.iter().position(|item| item.item_id == item_id) {
            self.items[idx].qty += delta;
            if self.items[idx].qty <= 0 {
                self.items.remove(idx);
            }
        }
    }

    pub fn remove(&mut self, item_id: &str) {
        self.items.retain(|item| item.item_id != item_id);
    }

    pub fn quote(&self) -> PriceBreakdown {
        pricing::quote(&self.items, self.mode)
    }

    /// Items to submit, delivery fee recomputed.
    pub fn to_items(&self) -> Vec<LineItem> {
        pricing::apply_delivery_fee(self.items.clone(), self.mode)
    }
}

// =============================================================================
// Dashboard State
// =============================================================================

/// Result of a "Serve All" / "Hand Over" batch.
#[derive(Debug)]
pub struct ServeAllReport {
    pub target: ItemStatus,
    pub updated: usize,
    /// Items the server rejected, with the reason.
    pub failed: Vec<(String, ClientError)>,
}

impl ServeAllReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// One logged-in staff member's dashboard.
pub struct Dashboard<B> {
    backend: B,
    user: SessionUser,
    active_tab: OrderStatus,
    orders: Vec<Order>,
    logged_out: bool,
}

impl<B: StaffBackend> Dashboard<B> {
    /// Opens on the role's first tab with an empty cache; call
    /// [`Dashboard::refresh`] to load.
    pub fn new(backend: B, user: SessionUser) -> Self {
        let active_tab = visible_statuses(user.role)
            .first()
            .copied()
            .unwrap_or_default();

        Dashboard {
            backend,
            user,
            active_tab,
            orders: Vec::new(),
            logged_out: false,
        }
    }

    // =========================================================================
    // Read Side
    // =========================================================================

    pub fn user(&self) -> &SessionUser {
        &self.user
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn tabs(&self) -> &'static [OrderStatus] {
        visible_statuses(self.role())
    }

    pub fn active_tab(&self) -> OrderStatus {
        self.active_tab
    }

    /// Switches tab. Returns false for a status the role has no tab for.
    pub fn select_tab(&mut self, status: OrderStatus) -> bool {
        if !self.tabs().contains(&status) {
            return false;
        }
        self.active_tab = status;
        true
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn order(&self, order_id: &str) -> Option<&Order> {
        self.orders.iter().find(|order| order.order_id == order_id)
    }

    fn on_tab(&self, status: OrderStatus) -> impl Iterator<Item = &Order> {
        let role = self.role();
        self.orders
            .iter()
            .filter(move |order| order.status == status && role_sees_mode(role, order.mode))
    }

    /// Orders on the active tab that this role handles.
    pub fn visible_orders(&self) -> Vec<&Order> {
        self.on_tab(self.active_tab).collect()
    }

    /// Badge count for a tab.
    pub fn tab_count(&self, status: OrderStatus) -> usize {
        self.on_tab(status).count()
    }

    pub fn actions_for(&self, order: &Order) -> Vec<OrderAction> {
        order_actions(self.role(), order)
    }

    pub fn item_actions_for(&self, order: &Order, item: &LineItem) -> Vec<ItemAction> {
        item_actions(self.role(), order, item)
    }

    pub fn is_logged_out(&self) -> bool {
        self.logged_out
    }

    /// Close dialog for a cached order the role may close.
    pub fn open_close(&self, order_id: &str) -> Option<CloseForm> {
        self.order(order_id)
            .filter(|order| can_close(self.role(), order.status))
            .map(CloseForm::new)
    }

    /// Edit dialog for a cached live order, managers only.
    pub fn open_edit(&self, order_id: &str) -> Option<EditForm> {
        self.order(order_id)
            .filter(|order| can_cancel(self.role(), order.status))
            .map(EditForm::new)
    }

    // =========================================================================
    // Write Side
    // =========================================================================

    /// Reloads the order cache.
    pub async fn refresh(&mut self) -> ClientResult<()> {
        self.ensure_active()?;
        match self.backend.orders().await {
            Ok(orders) => {
                self.orders = orders;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Status button.
    pub async fn advance(&mut self, order_id: &str, next: OrderStatus) -> ClientResult<()> {
        self.ensure_active()?;
        let result = self.backend.update_order_status(order_id, next, true).await;
        self.settle(result).await.map(|_| ())
    }

    /// Kitchen or serve checkbox.
    pub async fn set_item_status(
        &mut self,
        order_id: &str,
        item_id: &str,
        next: ItemStatus,
    ) -> ClientResult<()> {
        self.ensure_active()?;
        let result = self.backend.update_item_status(order_id, item_id, next).await;
        self.settle(result).await.map(|_| ())
    }

    /// Sends every READY item of the order to the handoff status at once,
    /// waits for all of them, then reloads once.
    pub async fn serve_all(&mut self, order_id: &str) -> ClientResult<ServeAllReport> {
        self.ensure_active()?;

        let order = self
            .order(order_id)
            .ok_or_else(|| ClientError::Api(format!("Order {} is not loaded", order_id)))?;
        let (target, ready) = serve_all_targets(order).ok_or_else(|| {
            ClientError::Api("Delivery orders leave the counter as a whole".to_string())
        })?;
        let item_ids: Vec<String> = ready.into_iter().map(|item| item.item_id.clone()).collect();

        let backend = &self.backend;
        let results = join_all(
            item_ids
                .iter()
                .map(|item_id| backend.update_item_status(order_id, item_id, target)),
        )
        .await;

        let mut report = ServeAllReport {
            target,
            updated: 0,
            failed: Vec::new(),
        };
        for (item_id, result) in item_ids.into_iter().zip(results) {
            match result {
                Ok(_) => report.updated += 1,
                Err(e) => report.failed.push((item_id, e)),
            }
        }

        if let Some(idx) = report.failed.iter().position(|(_, e)| e.is_unauthorized()) {
            let (_, error) = report.failed.swap_remove(idx);
            return Err(self.fail(error));
        }

        info!(order_id, updated = report.updated, failed = report.failed.len(), "Serve all finished");
        self.refresh().await?;
        Ok(report)
    }

    pub async fn cancel(&mut self, order_id: &str, reason: Option<String>) -> ClientResult<()> {
        self.ensure_active()?;
        let result = self.backend.cancel_order(order_id, reason).await;
        self.settle(result).await.map(|_| ())
    }

    pub async fn save_edit(&mut self, form: &EditForm) -> ClientResult<()> {
        self.ensure_active()?;
        let result = self
            .backend
            .edit_order(&form.order_id, form.to_items())
            .await;
        self.settle(result).await.map(|_| ())
    }

    pub async fn close(&mut self, form: &CloseForm) -> ClientResult<CloseOrderResult> {
        self.ensure_active()?;
        let result = self.backend.close_order(form.to_request()).await;
        self.settle(result).await
    }

    /// Ends the session. The dashboard is unusable afterwards.
    pub async fn logout(&mut self) -> ClientResult<()> {
        let result = self.backend.logout().await;
        self.end_session();
        result
    }

    fn ensure_active(&self) -> ClientResult<()> {
        if self.logged_out {
            return Err(ClientError::Unauthorized(
                "Unauthorized: logged out".to_string(),
            ));
        }
        Ok(())
    }

    /// Mutation finished: on success reload, on failure classify.
    async fn settle<T>(&mut self, result: ClientResult<T>) -> ClientResult<T> {
        let value = result.map_err(|e| self.fail(e))?;
        self.refresh().await?;
        Ok(value)
    }

    fn fail(&mut self, error: ClientError) -> ClientError {
        if error.is_unauthorized() {
            warn!(username = %self.user.username, "Session rejected, forcing logout");
            self.end_session();
        }
        error
    }

    fn end_session(&mut self) {
        self.logged_out = true;
        self.orders.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{order, user, FakeBackend};

    use FulfillmentMode::{Delivery, DineIn, Takeaway};

    // -------------------------------------------------------------------------
    // Order actions
    // -------------------------------------------------------------------------

    #[test]
    fn test_kitchen_actions() {
        let open = order("A", OrderStatus::Open, DineIn);
        assert_eq!(
            order_actions(Role::Kitchen, &open),
            vec![OrderAction::Advance {
                to: OrderStatus::Preparing
            }]
        );

        for status in [OrderStatus::PartiallyReady, OrderStatus::Ready] {
            assert!(order_actions(Role::Kitchen, &order("A", status, DineIn)).is_empty());
        }
    }

    #[test]
    fn test_waiter_serve_all_labels() {
        let dine_in = order("A", OrderStatus::Ready, DineIn);
        let actions = order_actions(Role::Waiter, &dine_in);
        assert_eq!(actions, vec![OrderAction::ServeAll { mode: DineIn }]);
        assert_eq!(actions[0].label(), "Serve All");

        let takeaway = order("B", OrderStatus::Ready, Takeaway);
        assert_eq!(order_actions(Role::Waiter, &takeaway)[0].label(), "Hand Over");

        assert!(order_actions(Role::Waiter, &order("C", OrderStatus::Ready, Delivery)).is_empty());
    }

    #[test]
    fn test_delivery_actions() {
        let ready = order("A", OrderStatus::Ready, Delivery);
        assert_eq!(
            order_actions(Role::Delivery, &ready),
            vec![OrderAction::Advance {
                to: OrderStatus::OutForDelivery
            }]
        );
        let out = order("A", OrderStatus::OutForDelivery, Delivery);
        assert_eq!(order_actions(Role::Delivery, &out)[0].label(), "DELIVERED");
    }

    #[test]
    fn test_manager_actions() {
        let ready = order("A", OrderStatus::Ready, Takeaway);
        assert_eq!(
            order_actions(Role::Manager, &ready),
            vec![
                OrderAction::Advance {
                    to: OrderStatus::HandedOver
                },
                OrderAction::Cancel,
                OrderAction::Edit,
            ]
        );

        let served = order("B", OrderStatus::Served, DineIn);
        assert_eq!(
            order_actions(Role::Admin, &served),
            vec![OrderAction::Cancel, OrderAction::Edit, OrderAction::Close]
        );

        for status in [OrderStatus::Closed, OrderStatus::Cancelled] {
            assert!(order_actions(Role::Manager, &order("C", status, DineIn)).is_empty());
        }
    }

    // -------------------------------------------------------------------------
    // Item actions
    // -------------------------------------------------------------------------

    #[test]
    fn test_kitchen_checkbox_toggles() {
        let mut o = order("A", OrderStatus::PartiallyReady, DineIn);
        o.items[0].status = ItemStatus::Ready;
        o.items[1].status = ItemStatus::Preparing;

        assert_eq!(
            item_actions(Role::Kitchen, &o, &o.items[0]),
            vec![ItemAction::ReadyToggle {
                checked: true,
                next: ItemStatus::Preparing
            }]
        );
        assert_eq!(
            item_actions(Role::Kitchen, &o, &o.items[1]),
            vec![ItemAction::ReadyToggle {
                checked: false,
                next: ItemStatus::Ready
            }]
        );

        o.items[0].status = ItemStatus::Served;
        assert!(item_actions(Role::Kitchen, &o, &o.items[0]).is_empty());
    }

    #[test]
    fn test_serve_checkbox_dine_in_only() {
        let mut dine_in = order("A", OrderStatus::Ready, DineIn);
        dine_in.items[0].status = ItemStatus::Ready;
        assert_eq!(
            item_actions(Role::Waiter, &dine_in, &dine_in.items[0]),
            vec![ItemAction::Serve {
                next: ItemStatus::Served
            }]
        );
        assert!(item_actions(Role::Kitchen, &dine_in, &dine_in.items[0]).is_empty());

        let mut takeaway = order("B", OrderStatus::Ready, Takeaway);
        takeaway.items[0].status = ItemStatus::Ready;
        assert!(item_actions(Role::Waiter, &takeaway, &takeaway.items[0]).is_empty());
    }

    #[test]
    fn test_manager_gets_both_checkboxes() {
        let mut o = order("A", OrderStatus::PartiallyReady, DineIn);
        o.items[0].status = ItemStatus::Ready;
        assert_eq!(item_actions(Role::Manager, &o, &o.items[0]).len(), 2);
    }

    // -------------------------------------------------------------------------
    // Dialogs
    // -------------------------------------------------------------------------

    #[test]
    fn test_close_form() {
        let mut served = order("A", OrderStatus::Served, DineIn);
        served.total = Money::new(250);
        let mut form = CloseForm::new(&served);

        form.set_percent(10.0);
        assert_eq!(form.discount_amount, Money::new(25));
        assert_eq!(form.preview().final_amount, Money::new(225));

        form.set_amount(Money::new(40));
        assert_eq!(form.discount_percent, 0.0);
        assert_eq!(form.preview().final_amount, Money::new(210));

        form.set_payment_mode(PaymentMode::Upi);
        let request = form.to_request();
        assert_eq!(request.subtotal, Some(Money::new(250)));
        assert_eq!(request.payment_mode, PaymentMode::Upi);
    }

    #[test]
    fn test_edit_form_recomputes_fee() {
        let mut o = order("A", OrderStatus::Preparing, Delivery);
        o.items = vec![
            LineItem::new("pizza", "Pizza", 3, 200),
            LineItem::new("chai", "Chai", 1, 30),
            LineItem::delivery_fee(),
        ];
        let mut form = EditForm::new(&o);
        assert_eq!(form.items.len(), 2);
        assert_eq!(form.quote().delivery_fee, Money::zero());

        form.change_qty("pizza", -2);
        assert_eq!(form.quote().delivery_fee, Money::new(50));
        assert_eq!(form.to_items().len(), 3);

        form.change_qty("chai", -1);
        form.remove("pizza");
        assert!(form.items.is_empty());
        assert!(form.to_items().is_empty());
    }

    // -------------------------------------------------------------------------
    // Dashboard state
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_tabs_and_visibility() {
        let backend = Arc::new(FakeBackend::with_orders(vec![
            order("A", OrderStatus::Ready, DineIn),
            order("B", OrderStatus::Ready, Delivery),
            order("C", OrderStatus::Served, DineIn),
            order("D", OrderStatus::Open, DineIn),
        ]));
        let mut dashboard = Dashboard::new(backend, user(Role::Waiter));
        dashboard.refresh().await.unwrap();

        assert_eq!(dashboard.active_tab(), OrderStatus::PartiallyReady);
        assert!(!dashboard.select_tab(OrderStatus::Open));
        assert!(dashboard.select_tab(OrderStatus::Ready));

        let visible: Vec<&str> = dashboard
            .visible_orders()
            .iter()
            .map(|o| o.order_id.as_str())
            .collect();
        assert_eq!(visible, vec!["A"]);
        assert_eq!(dashboard.tab_count(OrderStatus::Served), 1);
    }

    #[tokio::test]
    async fn test_mutation_then_reload() {
        let backend = Arc::new(FakeBackend::with_orders(vec![order(
            "A",
            OrderStatus::Open,
            DineIn,
        )]));
        let mut dashboard = Dashboard::new(backend.clone(), user(Role::Kitchen));
        dashboard.refresh().await.unwrap();

        dashboard.advance("A", OrderStatus::Preparing).await.unwrap();
        assert_eq!(dashboard.order("A").unwrap().status, OrderStatus::Preparing);
        assert_eq!(
            backend.calls(),
            vec!["orders", "updateOrderStatus:A:PREPARING", "orders"]
        );

        dashboard
            .set_item_status("A", "chai", ItemStatus::Ready)
            .await
            .unwrap();
        assert_eq!(
            dashboard.order("A").unwrap().status,
            OrderStatus::PartiallyReady
        );
    }

    #[tokio::test]
    async fn test_rejection_keeps_cache() {
        let backend = Arc::new(FakeBackend::with_orders(vec![order(
            "A",
            OrderStatus::Open,
            DineIn,
        )]));
        let mut dashboard = Dashboard::new(backend.clone(), user(Role::Kitchen));
        dashboard.refresh().await.unwrap();

        backend.reject_next("Illegal transition");
        let err = dashboard.advance("A", OrderStatus::Preparing).await.unwrap_err();
        assert!(!err.is_unauthorized());
        assert!(!dashboard.is_logged_out());
        assert_eq!(dashboard.order("A").unwrap().status, OrderStatus::Open);
    }

    #[tokio::test]
    async fn test_unauthorized_forces_logout() {
        let backend = Arc::new(FakeBackend::with_orders(vec![order(
            "A",
            OrderStatus::Open,
            DineIn,
        )]));
        let mut dashboard = Dashboard::new(backend.clone(), user(Role::Manager));
        dashboard.refresh().await.unwrap();

        backend.reject_next("Unauthorized");
        let err = dashboard.refresh().await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(dashboard.is_logged_out());
        assert!(dashboard.orders().is_empty());

        // Nothing reaches the backend any more.
        let calls = backend.calls().len();
        assert!(dashboard.refresh().await.is_err());
        assert_eq!(backend.calls().len(), calls);
    }

    #[tokio::test]
    async fn test_serve_all() {
        let mut o = order("A", OrderStatus::Ready, DineIn);
        for item in &mut o.items {
            item.status = ItemStatus::Ready;
        }
        let backend = Arc::new(FakeBackend::with_orders(vec![o]));
        let mut dashboard = Dashboard::new(backend.clone(), user(Role::Waiter));
        dashboard.refresh().await.unwrap();

        let report = dashboard.serve_all("A").await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.updated, 2);
        assert_eq!(report.target, ItemStatus::Served);
        assert_eq!(dashboard.order("A").unwrap().status, OrderStatus::Served);

        // One reload after the whole batch.
        let reloads = backend.calls().iter().filter(|c| *c == "orders").count();
        assert_eq!(reloads, 2);
    }

    #[tokio::test]
    async fn test_serve_all_reports_failures() {
        let mut o = order("A", OrderStatus::Ready, Takeaway);
        for item in &mut o.items {
            item.status = ItemStatus::Ready;
        }
        let backend = Arc::new(FakeBackend::with_orders(vec![o]));
        backend.fail_item("chai");
        let mut dashboard = Dashboard::new(backend.clone(), user(Role::Waiter));
        dashboard.refresh().await.unwrap();

        let report = dashboard.serve_all("A").await.unwrap();
        assert_eq!(report.target, ItemStatus::HandedOver);
        assert_eq!(report.updated, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "chai");
        assert_eq!(dashboard.order("A").unwrap().status, OrderStatus::Ready);
    }

    #[tokio::test]
    async fn test_close_and_logout() {
        let mut o = order("A", OrderStatus::Served, DineIn);
        o.total = Money::new(200);
        let backend = Arc::new(FakeBackend::with_orders(vec![o]));
        let mut dashboard = Dashboard::new(backend.clone(), user(Role::Manager));
        dashboard.refresh().await.unwrap();

        let mut form = dashboard.open_close("A").unwrap();
        form.set_percent(5.0);
        let result = dashboard.close(&form).await.unwrap();
        assert_eq!(result.final_amount, Money::new(190));
        assert_eq!(dashboard.order("A").unwrap().status, OrderStatus::Closed);
        assert!(dashboard.open_close("A").is_none());

        dashboard.logout().await.unwrap();
        assert!(dashboard.is_logged_out());
        assert!(backend.calls().contains(&"logout".to_string()));
    }
}
