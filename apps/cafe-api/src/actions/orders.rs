//! Order actions: create, list, status changes, close, cancel, edit.
//!
//! Totals are always recomputed here from menu prices; whatever total or
//! price the client sent is ignored.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::info;

use cafe_core::action::{
    CancelOrder, CloseOrder, CloseOrderResult, CreateOrder, CreateOrderResult, EditOrder,
    UpdateItemStatus, UpdateOrderStatus,
};
use cafe_core::validation::{validate_delivery_details, validate_discount, validate_line_items};
use cafe_core::{
    lifecycle, pricing, FulfillmentMode, ItemStatus, LineItem, MenuItem, Order, OrderStatus,
    COUNTER_LOCATION_ID,
};
use cafe_db::repository::order::generate_order_id;

use super::{authenticate, check_public_key, reply, Caller, Reply};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `orders`: every order the caller's role works with, newest first.
pub async fn list(state: &AppState, caller: &Caller) -> ApiResult<Reply> {
    let orders: Vec<Order> = state
        .db
        .orders()
        .list()
        .await?
        .into_iter()
        .filter(|order| lifecycle::role_sees_order(caller.role, order))
        .collect();

    reply(orders)
}

/// `createOrder`: public order page (with the shared key) or a staff
/// member placing an order from the dashboard (with a token).
pub async fn create(state: &AppState, req: CreateOrder, token: Option<&str>) -> ApiResult<Reply> {
    let staff = match token {
        Some(_) => Some(authenticate(state, token).await?),
        None => {
            check_public_key(state, req.secret.as_deref())?;
            None
        }
    };

    let location_id = resolve_location(state, req.mode, req.location_id.as_deref()).await?;
    validate_delivery_details(req.mode, &req.customer_name, &req.mobile, &req.address)?;

    let menu = menu_index(state).await?;
    let items = price_items(&menu, req.items, &HashSet::new())?;
    let items = pricing::apply_delivery_fee(items, req.mode);
    let total = pricing::line_sum(&items);

    let now = Utc::now();
    let order = Order {
        order_id: generate_order_id(),
        status: OrderStatus::Open,
        mode: req.mode,
        location_id,
        customer_name: req.customer_name.trim().to_string(),
        mobile: req.mobile.trim().to_string(),
        address: req.address.trim().to_string(),
        total,
        discount_percent: None,
        discount_amount: None,
        final_amount: None,
        payment_mode: None,
        staff_member: staff.map(|caller| caller.username),
        cancel_reason: None,
        ordered_at: now,
        updated_at: now,
        items,
    };

    state.db.orders().insert(&order).await?;

    info!(
        order_id = %order.order_id,
        mode = %order.mode,
        location_id = %order.location_id,
        total = %order.total,
        staff = order.staff_member.as_deref().unwrap_or("-"),
        "Order placed"
    );

    reply(CreateOrderResult {
        order_id: order.order_id,
        total: order.total,
    })
}

/// `updateOrderStatus`
pub async fn update_status(
    state: &AppState,
    caller: &Caller,
    req: UpdateOrderStatus,
) -> ApiResult<Reply> {
    let order = state
        .db
        .orders()
        .transition(&req.order_id, req.next_status, caller.role, req.cascade)
        .await?;
    reply(order)
}

/// `updateItemStatus`: one item, then the order status is re-derived.
pub async fn update_item(
    state: &AppState,
    caller: &Caller,
    req: UpdateItemStatus,
) -> ApiResult<Reply> {
    let order = state
        .db
        .orders()
        .update_item_status(&req.order_id, &req.item_id, req.next_status, caller.role)
        .await?;
    reply(order)
}

/// `closeOrder`: settles against the stored total.
pub async fn close(state: &AppState, caller: &Caller, req: CloseOrder) -> ApiResult<Reply> {
    validate_discount(req.discount_percent, req.discount_amount)?;

    let order = state
        .db
        .orders()
        .close(
            &req.order_id,
            caller.role,
            req.discount_percent,
            req.discount_amount,
            req.payment_mode,
        )
        .await?;

    if let Some(shown) = req.subtotal {
        if shown != order.total {
            info!(order_id = %order.order_id, %shown, stored = %order.total, "Close dialog showed a stale total");
        }
    }

    reply(CloseOrderResult {
        order_id: order.order_id,
        discount_percent: order.discount_percent.unwrap_or_default(),
        discount_amount: order.discount_amount.unwrap_or_default(),
        final_amount: order.final_amount.unwrap_or(order.total),
        payment_mode: order.payment_mode.unwrap_or(req.payment_mode),
    })
}

/// `cancelOrder`
pub async fn cancel(state: &AppState, caller: &Caller, req: CancelOrder) -> ApiResult<Reply> {
    let reason = req
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|reason| !reason.is_empty());

    let order = state
        .db
        .orders()
        .cancel(&req.order_id, caller.role, reason)
        .await?;
    reply(order)
}

/// `editOrder`: replaces the food items. Items already on the order may
/// stay even if the menu has since marked them unavailable.
pub async fn edit(state: &AppState, caller: &Caller, req: EditOrder) -> ApiResult<Reply> {
    caller.require_manager("edit orders")?;

    let existing = state.db.orders().get(&req.order_id).await?;
    let kept: HashSet<String> = existing
        .food_items()
        .map(|item| item.item_id.clone())
        .collect();

    let menu = menu_index(state).await?;
    let items = price_items(&menu, req.items, &kept)?;

    let order = state
        .db
        .orders()
        .replace_items(&req.order_id, caller.role, items)
        .await?;
    reply(order)
}

// =============================================================================
// Helpers
// =============================================================================

/// Dine-in needs a real table; everything else is served at the counter.
async fn resolve_location(
    state: &AppState,
    mode: FulfillmentMode,
    requested: Option<&str>,
) -> ApiResult<String> {
    if mode.uses_counter() {
        return Ok(COUNTER_LOCATION_ID.to_string());
    }

    let location_id = requested
        .map(str::trim)
        .filter(|id| !id.is_empty() && *id != COUNTER_LOCATION_ID)
        .ok_or_else(|| ApiError::bad_request("Select a table for Dine-in orders"))?;

    if !state.db.menu().location_exists(location_id).await? {
        return Err(ApiError::bad_request(format!("Unknown table: {}", location_id)));
    }
    Ok(location_id.to_string())
}

async fn menu_index(state: &AppState) -> ApiResult<HashMap<String, MenuItem>> {
    Ok(state
        .db
        .menu()
        .list_all()
        .await?
        .into_iter()
        .map(|item| (item.item_id.clone(), item))
        .collect())
}

/// Drops any client-sent delivery fee, validates the rest and replaces
/// names and prices with the menu's. New items start OPEN.
fn price_items(
    menu: &HashMap<String, MenuItem>,
    items: Vec<LineItem>,
    allow_unavailable: &HashSet<String>,
) -> ApiResult<Vec<LineItem>> {
    let items: Vec<LineItem> = items
        .into_iter()
        .filter(|item| !item.is_delivery_fee())
        .collect();

    validate_line_items(&items)?;

    items
        .into_iter()
        .map(|mut item| {
            let entry = menu
                .get(&item.item_id)
                .ok_or_else(|| ApiError::bad_request(format!("Unknown menu item: {}", item.item_id)))?;

            if !entry.available && !allow_unavailable.contains(&item.item_id) {
                return Err(ApiError::bad_request(format!("{} is not available", entry.name)));
            }

            item.name = entry.name.clone();
            item.price = entry.price;
            item.status = ItemStatus::Open;
            Ok(item)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cafe_core::Money;

    fn menu() -> HashMap<String, MenuItem> {
        let item = |id: &str, price: i64, available: bool| MenuItem {
            item_id: id.to_string(),
            name: id.to_uppercase(),
            category: "Chai".to_string(),
            category_order: 1,
            item_order: 1,
            price: Money::new(price),
            available,
        };
        [item("chai", 30, true), item("kesar", 60, false)]
            .into_iter()
            .map(|m| (m.item_id.clone(), m))
            .collect()
    }

    #[test]
    fn test_price_items_uses_menu_prices() {
        let sent = vec![
            LineItem::new("chai", "whatever", 2, 1),
            LineItem::delivery_fee(),
        ];
        let priced = price_items(&menu(), sent, &HashSet::new()).unwrap();

        assert_eq!(priced.len(), 1);
        assert_eq!(priced[0].name, "CHAI");
        assert_eq!(priced[0].price.amount(), 30);
    }

    #[test]
    fn test_price_items_rejects_unknown_and_unavailable() {
        let unknown = vec![LineItem::new("latte", "Latte", 1, 90)];
        assert!(matches!(
            price_items(&menu(), unknown, &HashSet::new()),
            Err(ApiError::BadRequest(_))
        ));

        let unavailable = vec![LineItem::new("kesar", "Kesar", 1, 60)];
        assert!(price_items(&menu(), unavailable.clone(), &HashSet::new()).is_err());

        let kept: HashSet<String> = ["kesar".to_string()].into_iter().collect();
        assert!(price_items(&menu(), unavailable, &kept).is_ok());
    }

    #[test]
    fn test_price_items_requires_food() {
        let only_fee = vec![LineItem::delivery_fee()];
        assert!(matches!(
            price_items(&menu(), only_fee, &HashSet::new()),
            Err(ApiError::BadRequest(_))
        ));
    }
}
