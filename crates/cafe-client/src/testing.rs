//! In-memory backend and fixtures for dashboard and poller tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use cafe_core::action::{CloseOrder, CloseOrderResult};
use cafe_core::lifecycle::{cascade_items, derive_order_status};
use cafe_core::pricing::{self, close_quote};
use cafe_core::{
    FulfillmentMode, ItemStatus, LineItem, Order, OrderStatus, Role, SessionUser,
};

use crate::api::StaffBackend;
use crate::error::{ClientError, ClientResult};

/// Two-item order whose items sit at the status implied by `status`.
pub(crate) fn order(id: &str, status: OrderStatus, mode: FulfillmentMode) -> Order {
    let item_status = match status {
        OrderStatus::Open => ItemStatus::Open,
        OrderStatus::Preparing | OrderStatus::PartiallyReady => ItemStatus::Preparing,
        _ => ItemStatus::Ready,
    };
    let mut items = vec![
        LineItem::new("chai", "Masala Chai", 2, 30),
        LineItem::new("toastie", "Grilled Cheese", 1, 110),
    ];
    for item in &mut items {
        item.status = item_status;
    }
    let now = Utc::now();

    Order {
        order_id: id.to_string(),
        status,
        mode,
        location_id: "T1".to_string(),
        customer_name: String::new(),
        mobile: String::new(),
        address: String::new(),
        total: pricing::line_sum(&items),
        discount_percent: None,
        discount_amount: None,
        final_amount: None,
        payment_mode: None,
        staff_member: None,
        cancel_reason: None,
        ordered_at: now,
        updated_at: now,
        items,
    }
}

pub(crate) fn user(role: Role) -> SessionUser {
    SessionUser {
        username: format!("{}-1", role.as_str()),
        name: "Test".to_string(),
        role,
        token: "token".to_string(),
    }
}

#[derive(Default)]
struct State {
    orders: Vec<Order>,
    calls: Vec<String>,
    reject_next: Option<String>,
    failing_items: HashSet<String>,
}

/// Applies mutations to its own order list the way the server would,
/// without checking roles.
#[derive(Default)]
pub(crate) struct FakeBackend {
    state: Mutex<State>,
}

impl FakeBackend {
    pub(crate) fn with_orders(orders: Vec<Order>) -> Self {
        FakeBackend {
            state: Mutex::new(State {
                orders,
                ..State::default()
            }),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// The next call of any kind fails with `message`. A message containing
    /// "Unauthorized" fails as an expired session.
    pub(crate) fn reject_next(&self, message: &str) {
        self.state.lock().unwrap().reject_next = Some(message.to_string());
    }

    /// Item updates for `item_id` fail until the end of the test.
    pub(crate) fn fail_item(&self, item_id: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_items
            .insert(item_id.to_string());
    }

    pub(crate) fn set_orders(&self, orders: Vec<Order>) {
        self.state.lock().unwrap().orders = orders;
    }

    fn call<T>(
        &self,
        name: String,
        apply: impl FnOnce(&mut State) -> ClientResult<T>,
    ) -> ClientResult<T> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(name);
        if let Some(message) = state.reject_next.take() {
            return Err(ClientError::from_failure(400, message));
        }
        apply(&mut state)
    }
}

fn find<'a>(orders: &'a mut [Order], order_id: &str) -> ClientResult<&'a mut Order> {
    orders
        .iter_mut()
        .find(|order| order.order_id == order_id)
        .ok_or_else(|| ClientError::Api(format!("Order {} not found", order_id)))
}

#[async_trait]
impl StaffBackend for FakeBackend {
    async fn orders(&self) -> ClientResult<Vec<Order>> {
        self.call("orders".to_string(), |state| Ok(state.orders.clone()))
    }

    async fn update_order_status(
        &self,
        order_id: &str,
        next: OrderStatus,
        cascade: bool,
    ) -> ClientResult<Order> {
        let name = format!("updateOrderStatus:{}:{}", order_id, next);
        self.call(name, |state| {
            let order = find(&mut state.orders, order_id)?;
            order.status = next;
            if cascade {
                cascade_items(&mut order.items, next);
            }
            Ok(order.clone())
        })
    }

    async fn update_item_status(
        &self,
        order_id: &str,
        item_id: &str,
        next: ItemStatus,
    ) -> ClientResult<Order> {
        let name = format!("updateItemStatus:{}:{}:{}", order_id, item_id, next);
        self.call(name, |state| {
            if state.failing_items.contains(item_id) {
                return Err(ClientError::Api("Item was updated elsewhere".to_string()));
            }
            let order = find(&mut state.orders, order_id)?;
            let item = order
                .items
                .iter_mut()
                .find(|item| item.item_id == item_id)
                .ok_or_else(|| ClientError::Api(format!("Item {} not found", item_id)))?;
            item.status = next;
            order.status = derive_order_status(order.status, order.mode, &order.items);
            Ok(order.clone())
        })
    }

    async fn close_order(&self, request: CloseOrder) -> ClientResult<CloseOrderResult> {
        let name = format!("closeOrder:{}", request.order_id);
        self.call(name, |state| {
            let order = find(&mut state.orders, &request.order_id)?;
            let quote = close_quote(order.total, request.discount_percent, request.discount_amount);
            order.status = OrderStatus::Closed;
            order.discount_percent = Some(quote.discount_percent);
            order.discount_amount = Some(quote.discount);
            order.final_amount = Some(quote.final_amount);
            order.payment_mode = Some(request.payment_mode);
            Ok(CloseOrderResult {
                order_id: request.order_id.clone(),
                discount_percent: quote.discount_percent,
                discount_amount: quote.discount,
                final_amount: quote.final_amount,
                payment_mode: request.payment_mode,
            })
        })
    }

    async fn cancel_order(&self, order_id: &str, reason: Option<String>) -> ClientResult<Order> {
        self.call(format!("cancelOrder:{}", order_id), |state| {
            let order = find(&mut state.orders, order_id)?;
            order.status = OrderStatus::Cancelled;
            order.cancel_reason = reason;
            Ok(order.clone())
        })
    }

    async fn edit_order(&self, order_id: &str, items: Vec<LineItem>) -> ClientResult<Order> {
        self.call(format!("editOrder:{}", order_id), |state| {
            let order = find(&mut state.orders, order_id)?;
            order.total = pricing::line_sum(&items);
            order.items = items;
            Ok(order.clone())
        })
    }

    async fn logout(&self) -> ClientResult<()> {
        self.call("logout".to_string(), |_| Ok(()))
    }
}
