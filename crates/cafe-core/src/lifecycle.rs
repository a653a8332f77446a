//! # Order Lifecycle
//!
//! The order state machine, the item-level sub-states and the role tables
//! that decide who sees and moves what.
//!
//! ## Order-Level Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   OPEN ──► PREPARING ──┬──► PARTIALLY_READY ──┐                         │
//! │                        │      (items)         │                         │
//! │                        └──────────────────────┴──► READY                │
//! │                                                      │                  │
//! │                       ┌──────────────────────────────┼──────────────┐   │
//! │                       │ Dine-in        Takeaway      │ Delivery     │   │
//! │                       ▼                ▼             ▼              │   │
//! │                    SERVED        HANDED_OVER   OUT_FOR_DELIVERY     │   │
//! │                       │                │             │              │   │
//! │                       │                │             ▼              │   │
//! │                       │                │         DELIVERED          │   │
//! │                       └────────────────┴─────────────┴──► CLOSED    │   │
//! │                                                        (manager)    │   │
//! │   any non-terminal ──► CANCELLED (manager)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Item-Level Flow
//! ```text
//!   OPEN ──► PREPARING ⇄ READY ──► SERVED        (Dine-in, per item)
//!                              └─► HANDED_OVER   (Takeaway, whole order)
//! ```
//! PARTIALLY_READY is never requested directly: it is derived from the
//! items by [`derive_order_status`].
//!
//! ## Tables
//! Transitions, transition authority and role queues are static lookup
//! tables so they can be audited and tested without any rendering code.

use crate::error::{CoreError, CoreResult};
use crate::types::{FulfillmentMode, ItemStatus, LineItem, Order, OrderStatus, Role};

use FulfillmentMode::{Delivery, DineIn, Takeaway};
use OrderStatus::*;

// =============================================================================
// Static Tables
// =============================================================================

/// Forward transitions: current status → legal next statuses, before mode
/// tie-break and role filtering. CANCELLED is handled by [`can_cancel`].
static ORDER_FLOW: &[(OrderStatus, &[OrderStatus])] = &[
    (Open, &[Preparing]),
    (Preparing, &[Ready]),
    (PartiallyReady, &[Ready]),
    (Ready, &[Served, HandedOver, OutForDelivery]),
    (Served, &[Closed]),
    (HandedOver, &[Closed]),
    (OutForDelivery, &[Delivered]),
    (Delivered, &[Closed]),
    (Closed, &[]),
    (Cancelled, &[]),
];

/// Roles allowed to move an order *into* each status.
static ENTRY_AUTHORITY: &[(OrderStatus, &[Role])] = &[
    (Preparing, &[Role::Kitchen, Role::Manager, Role::Admin]),
    (Ready, &[Role::Kitchen, Role::Manager, Role::Admin]),
    (Served, &[Role::Waiter, Role::Manager, Role::Admin]),
    (HandedOver, &[Role::Waiter, Role::Manager, Role::Admin]),
    (OutForDelivery, &[Role::Delivery, Role::Manager, Role::Admin]),
    (Delivered, &[Role::Delivery, Role::Manager, Role::Admin]),
    (Closed, &[Role::Manager, Role::Admin]),
    (Cancelled, &[Role::Manager, Role::Admin]),
];

/// Dashboard tabs per role, in display order.
static ROLE_TABS: &[(Role, &[OrderStatus])] = &[
    (Role::Kitchen, &[Open, Preparing, PartiallyReady, Ready]),
    (Role::Waiter, &[PartiallyReady, Ready, Served, HandedOver]),
    (Role::Delivery, &[PartiallyReady, Ready, OutForDelivery, Delivered]),
    (Role::Manager, &OrderStatus::ALL),
    (Role::Admin, &OrderStatus::ALL),
];

fn lookup<K: PartialEq + Copy, V: Copy>(table: &[(K, V)], key: K, empty: V) -> V {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .unwrap_or(empty)
}

// =============================================================================
// Order-Level Transitions
// =============================================================================

/// Raw forward table lookup.
///
/// ```rust
/// use cafe_core::lifecycle::next_states;
/// use cafe_core::OrderStatus;
///
/// assert_eq!(next_states(OrderStatus::Open), &[OrderStatus::Preparing]);
/// ```
pub fn next_states(status: OrderStatus) -> &'static [OrderStatus] {
    lookup(ORDER_FLOW, status, &[])
}

/// The status READY resolves to for a mode.
pub const fn handoff_status(mode: FulfillmentMode) -> OrderStatus {
    match mode {
        DineIn => Served,
        Takeaway => HandedOver,
        Delivery => OutForDelivery,
    }
}

/// The item status matching the mode's handoff. Delivery orders leave the
/// kitchen as a whole and have no item-level handoff.
pub const fn item_handoff_status(mode: FulfillmentMode) -> Option<ItemStatus> {
    match mode {
        DineIn => Some(ItemStatus::Served),
        Takeaway => Some(ItemStatus::HandedOver),
        Delivery => None,
    }
}

/// True if `role` may move an order into `status`.
pub fn may_enter(role: Role, status: OrderStatus) -> bool {
    lookup(ENTRY_AUTHORITY, status, &[]).contains(&role)
}

/// Legal next statuses for this order and role.
///
/// At READY the set collapses to the mode's handoff status, and is empty
/// for a role that may not perform that handoff.
pub fn next_states_for(status: OrderStatus, mode: FulfillmentMode, role: Role) -> Vec<OrderStatus> {
    next_states(status)
        .iter()
        .copied()
        .filter(|next| status != Ready || *next == handoff_status(mode))
        .filter(|next| may_enter(role, *next))
        .collect()
}

/// Managers may cancel anything that is not already terminal.
pub fn can_cancel(role: Role, status: OrderStatus) -> bool {
    !status.is_terminal() && may_enter(role, Cancelled)
}

/// Managers may close once the customer has the order.
pub fn can_close(role: Role, status: OrderStatus) -> bool {
    next_states(status).contains(&Closed) && may_enter(role, Closed)
}

/// Checks an order-level transition request.
pub fn authorize_transition(order: &Order, next: OrderStatus, role: Role) -> CoreResult<()> {
    if order.is_terminal() {
        return Err(CoreError::TerminalOrder {
            order_id: order.order_id.clone(),
            status: order.status,
        });
    }

    let allowed = if next == Cancelled {
        can_cancel(role, order.status)
    } else {
        next_states_for(order.status, order.mode, role).contains(&next)
    };

    if allowed {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            order_id: order.order_id.clone(),
            from: order.status,
            to: next,
            role,
        })
    }
}

/// Item status that an order-level transition pushes down to its items.
pub const fn cascade_target(next: OrderStatus) -> Option<ItemStatus> {
    match next {
        Preparing => Some(ItemStatus::Preparing),
        Ready => Some(ItemStatus::Ready),
        Served => Some(ItemStatus::Served),
        HandedOver => Some(ItemStatus::HandedOver),
        _ => None,
    }
}

/// Brings every food item that is behind `next` up to its item status.
/// Returns the ids of the items that changed.
pub fn cascade_items(items: &mut [LineItem], next: OrderStatus) -> Vec<String> {
    let Some(target) = cascade_target(next) else {
        return Vec::new();
    };

    items
        .iter_mut()
        .filter(|item| !item.is_delivery_fee() && item.status.rank() < target.rank())
        .map(|item| {
            item.status = target;
            item.item_id.clone()
        })
        .collect()
}

// =============================================================================
// Item-Level Transitions
// =============================================================================

/// Order status implied by the food items.
///
/// Only statuses between PREPARING and the handoff are derived; OPEN,
/// delivery statuses and terminal statuses are left alone.
///
/// ```text
///  none ready-or-beyond        → PREPARING
///  some ready-or-beyond        → PARTIALLY_READY
///  all ready-or-beyond         → READY
///  all at the mode's handoff   → SERVED / HANDED_OVER
/// ```
pub fn derive_order_status(
    current: OrderStatus,
    mode: FulfillmentMode,
    items: &[LineItem],
) -> OrderStatus {
    if !matches!(current, Preparing | PartiallyReady | Ready | Served | HandedOver) {
        return current;
    }

    let food: Vec<ItemStatus> = items
        .iter()
        .filter(|item| !item.is_delivery_fee())
        .map(|item| item.status)
        .collect();

    if food.is_empty() {
        return current;
    }

    if let Some(handoff) = item_handoff_status(mode) {
        if food.iter().all(|status| *status == handoff) {
            return handoff_status(mode);
        }
    }

    let ready = food.iter().filter(|status| status.is_ready_or_beyond()).count();
    if ready == food.len() {
        Ready
    } else if ready > 0 {
        PartiallyReady
    } else {
        Preparing
    }
}

/// Checks an item-level status request and returns the item's current
/// status (the value a compare-and-set write must still find).
///
/// ## Rules
/// - Kitchen/manager toggle PREPARING ⇄ READY while the order is PREPARING
///   or PARTIALLY_READY, on items not yet handed to the customer.
/// - Waiter/manager move a READY item to the mode's handoff status while
///   the order is PARTIALLY_READY or READY. Never on Delivery orders.
/// - Requesting the status an item already has is accepted (idempotent).
pub fn authorize_item_update(
    order: &Order,
    item_id: &str,
    next: ItemStatus,
    role: Role,
) -> CoreResult<ItemStatus> {
    if order.is_terminal() {
        return Err(CoreError::TerminalOrder {
            order_id: order.order_id.clone(),
            status: order.status,
        });
    }

    if item_id == crate::DELIVERY_FEE_ITEM_ID {
        return Err(CoreError::UntrackedItem {
            item_id: item_id.to_string(),
        });
    }

    let item = order.item(item_id).ok_or_else(|| CoreError::ItemNotFound {
        order_id: order.order_id.clone(),
        item_id: item_id.to_string(),
    })?;
    let current = item.status;

    let rejected = || CoreError::InvalidItemTransition {
        order_id: order.order_id.clone(),
        item_id: item_id.to_string(),
        from: current,
        to: next,
    };

    match next {
        ItemStatus::Preparing | ItemStatus::Ready => {
            if !matches!(role, Role::Kitchen) && !role.is_manager() {
                return Err(CoreError::forbidden(role, "mark items ready"));
            }
            let order_cooking = matches!(order.status, Preparing | PartiallyReady);
            let handed_off = current.is_handed_off();
            if !order_cooking || handed_off {
                return Err(rejected());
            }
        }
        ItemStatus::Served | ItemStatus::HandedOver => {
            if !matches!(role, Role::Waiter) && !role.is_manager() {
                return Err(CoreError::forbidden(role, "serve items"));
            }
            let expected = item_handoff_status(order.mode);
            let order_serving = matches!(order.status, PartiallyReady | Ready);
            let from_ok = current == ItemStatus::Ready || current == next;
            if expected != Some(next) || !order_serving || !from_ok {
                return Err(rejected());
            }
        }
        ItemStatus::Open => return Err(rejected()),
    }

    Ok(current)
}

/// Items a "Serve All" / "Hand Over" batch should move, with their target
/// status. `None` for Delivery orders.
pub fn serve_all_targets(order: &Order) -> Option<(ItemStatus, Vec<&LineItem>)> {
    let target = item_handoff_status(order.mode)?;
    let ready = order
        .food_items()
        .filter(|item| item.status == ItemStatus::Ready)
        .collect();
    Some((target, ready))
}

/// Keeps the stored status of items that survive an edit; new items start
/// OPEN. Client-supplied statuses are ignored.
pub fn carry_item_statuses(existing: &[LineItem], edited: Vec<LineItem>) -> Vec<LineItem> {
    edited
        .into_iter()
        .map(|mut item| {
            item.status = existing
                .iter()
                .find(|old| old.item_id == item.item_id)
                .map(|old| old.status)
                .unwrap_or_default();
            item
        })
        .collect()
}

// =============================================================================
// Role Visibility
// =============================================================================

/// Dashboard tabs for a role.
pub fn visible_statuses(role: Role) -> &'static [OrderStatus] {
    lookup(ROLE_TABS, role, &[])
}

/// Waiters never see Delivery orders; the delivery role sees nothing else.
pub fn role_sees_mode(role: Role, mode: FulfillmentMode) -> bool {
    match role {
        Role::Waiter => mode != Delivery,
        Role::Delivery => mode == Delivery,
        _ => true,
    }
}

/// True if the order belongs in one of the role's queues.
pub fn role_sees_order(role: Role, order: &Order) -> bool {
    visible_statuses(role).contains(&order.status) && role_sees_mode(role, order.mode)
}

// =============================================================================
// Unit Tests
// =============================================================================
