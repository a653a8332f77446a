//! # Order Repository
//!
//! Orders, their line items and every status write.
//!
//! ## Write Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  One status write = one transaction                     │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  lock_order()   UPDATE orders SET updated_at = updated_at               │
//! │    │            (takes the write lock, so the next read is current)     │
//! │    ▼                                                                    │
//! │  fetch_order()  order row + line items                                  │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  cafe-core      authorize_transition / authorize_item_update            │
//! │    │            cascade_items / derive_order_status                     │
//! │    ▼                                                                    │
//! │  set_status()   UPDATE ... WHERE order_id = ? AND status = <read>       │
//! │    │            0 rows → DbError::Conflict                              │
//! │    ▼                                                                    │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two dashboards racing on the same order are serialized by the write
//! lock; whichever commits second re-reads the winner's state and is judged
//! against it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use cafe_core::lifecycle;
use cafe_core::pricing;
use cafe_core::validation::validate_line_items;
use cafe_core::{
    CoreError, FulfillmentMode, ItemStatus, LineItem, Money, Order, OrderStatus, PaymentMode, Role,
};

use crate::error::{DbError, DbResult};

// =============================================================================
// Rows
// =============================================================================

const SELECT_ORDER: &str = r#"
    SELECT
        order_id, status, mode, location_id,
        customer_name, mobile, address,
        total, discount_percent, discount_amount, final_amount,
        payment_mode, staff_member, cancel_reason,
        ordered_at, updated_at
    FROM orders
"#;

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    order_id: String,
    status: OrderStatus,
    mode: FulfillmentMode,
    location_id: String,
    customer_name: String,
    mobile: String,
    address: String,
    total: i64,
    discount_percent: Option<f64>,
    discount_amount: Option<i64>,
    final_amount: Option<i64>,
    payment_mode: Option<PaymentMode>,
    staff_member: Option<String>,
    cancel_reason: Option<String>,
    ordered_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<LineItem>) -> Order {
        Order {
            order_id: self.order_id,
            status: self.status,
            mode: self.mode,
            location_id: self.location_id,
            customer_name: self.customer_name,
            mobile: self.mobile,
            address: self.address,
            total: Money::new(self.total),
            discount_percent: self.discount_percent,
            discount_amount: self.discount_amount.map(Money::new),
            final_amount: self.final_amount.map(Money::new),
            payment_mode: self.payment_mode,
            staff_member: self.staff_member,
            cancel_reason: self.cancel_reason,
            ordered_at: self.ordered_at,
            updated_at: self.updated_at,
            items,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    order_id: String,
    item_id: String,
    name: String,
    qty: i64,
    price: i64,
    status: ItemStatus,
}

impl From<ItemRow> for LineItem {
    fn from(row: ItemRow) -> Self {
        LineItem {
            item_id: row.item_id,
            name: row.name,
            qty: row.qty,
            price: Money::new(row.price),
            status: row.status,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts a new order with its line items in one transaction.
    pub async fn insert(&self, order: &Order) -> DbResult<()> {
        debug!(order_id = %order.order_id, total = %order.total, "Inserting order");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                order_id, status, mode, location_id,
                customer_name, mobile, address,
                total, discount_percent, discount_amount, final_amount,
                payment_mode, staff_member, cancel_reason,
                ordered_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&order.order_id)
        .bind(order.status)
        .bind(order.mode)
        .bind(&order.location_id)
        .bind(&order.customer_name)
        .bind(&order.mobile)
        .bind(&order.address)
        .bind(order.total.amount())
        .bind(order.discount_percent)
        .bind(order.discount_amount.map(|m| m.amount()))
        .bind(order.final_amount.map(|m| m.amount()))
        .bind(order.payment_mode)
        .bind(&order.staff_member)
        .bind(&order.cancel_reason)
        .bind(order.ordered_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_items(&mut tx, &order.order_id, &order.items).await?;

        tx.commit().await?;

        info!(order_id = %order.order_id, mode = %order.mode, "Order created");
        Ok(())
    }

    /// Gets an order with its items.
    pub async fn get(&self, order_id: &str) -> DbResult<Order> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, order_id).await
    }

    /// Every order, newest first.
    pub async fn list(&self) -> DbResult<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;

        let rows: Vec<OrderRow> = sqlx::query_as(&format!("{SELECT_ORDER} ORDER BY ordered_at DESC"))
            .fetch_all(&mut *conn)
            .await?;

        let item_rows: Vec<ItemRow> = sqlx::query_as(
            "SELECT order_id, item_id, name, qty, price, status FROM order_items ORDER BY order_id, position",
        )
        .fetch_all(&mut *conn)
        .await?;

        let mut items: HashMap<String, Vec<LineItem>> = HashMap::new();
        for row in item_rows {
            items.entry(row.order_id.clone()).or_default().push(row.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let lines = items.remove(&row.order_id).unwrap_or_default();
                row.into_order(lines)
            })
            .collect())
    }

    /// Moves an order to `next` on behalf of `role`.
    ///
    /// With `cascade`, food items behind the new status are raised to the
    /// matching item status in the same transaction.
    pub async fn transition(
        &self,
        order_id: &str,
        next: OrderStatus,
        role: Role,
        cascade: bool,
    ) -> DbResult<Order> {
        let mut tx = self.pool.begin().await?;
        let mut order = lock_order(&mut tx, order_id).await?;

        lifecycle::authorize_transition(&order, next, role)?;

        let now = Utc::now();
        set_status(&mut tx, order_id, order.status, next, now).await?;

        if cascade {
            let before: Vec<ItemStatus> = order.items.iter().map(|item| item.status).collect();
            let changed = lifecycle::cascade_items(&mut order.items, next);

            for (item, previous) in order.items.iter().zip(before) {
                if item.status != previous {
                    set_item_status(&mut tx, order_id, &item.item_id, previous, item.status).await?;
                }
            }
            debug!(order_id, items = changed.len(), "Cascaded item statuses");
        }

        tx.commit().await?;

        info!(order_id, from = %order.status, to = %next, %role, "Order status changed");
        order.status = next;
        order.updated_at = now;
        Ok(order)
    }

    /// Sets one item's status, then re-derives the order status from the
    /// items.
    pub async fn update_item_status(
        &self,
        order_id: &str,
        item_id: &str,
        next: ItemStatus,
        role: Role,
    ) -> DbResult<Order> {
        let mut tx = self.pool.begin().await?;
        let mut order = lock_order(&mut tx, order_id).await?;

        let current = lifecycle::authorize_item_update(&order, item_id, next, role)?;

        if current != next {
            set_item_status(&mut tx, order_id, item_id, current, next).await?;
            if let Some(item) = order.items.iter_mut().find(|item| item.item_id == item_id) {
                item.status = next;
            }
        }

        let derived = lifecycle::derive_order_status(order.status, order.mode, &order.items);
        let now = Utc::now();
        if derived != order.status {
            set_status(&mut tx, order_id, order.status, derived, now).await?;
        }

        tx.commit().await?;

        debug!(order_id, item_id, from = %current, to = %next, order_status = %derived, "Item status changed");
        order.status = derived;
        order.updated_at = now;
        Ok(order)
    }

    /// Settles and closes an order. The discount applies to the stored total.
    pub async fn close(
        &self,
        order_id: &str,
        role: Role,
        discount_percent: f64,
        discount_amount: Money,
        payment_mode: PaymentMode,
    ) -> DbResult<Order> {
        let mut tx = self.pool.begin().await?;
        let mut order = lock_order(&mut tx, order_id).await?;

        lifecycle::authorize_transition(&order, OrderStatus::Closed, role)?;

        let quote = pricing::close_quote(order.total, discount_percent, discount_amount);
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?,
                discount_percent = ?,
                discount_amount = ?,
                final_amount = ?,
                payment_mode = ?,
                updated_at = ?
            WHERE order_id = ? AND status = ?
            "#,
        )
        .bind(OrderStatus::Closed)
        .bind(quote.discount_percent)
        .bind(quote.discount.amount())
        .bind(quote.final_amount.amount())
        .bind(payment_mode)
        .bind(now)
        .bind(order_id)
        .bind(order.status)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(stale(&mut tx, order_id, order.status).await);
        }

        tx.commit().await?;

        info!(order_id, final_amount = %quote.final_amount, "Order closed");
        order.status = OrderStatus::Closed;
        order.discount_percent = Some(quote.discount_percent);
        order.discount_amount = Some(quote.discount);
        order.final_amount = Some(quote.final_amount);
        order.payment_mode = Some(payment_mode);
        order.updated_at = now;
        Ok(order)
    }

    /// Cancels a non-terminal order.
    pub async fn cancel(&self, order_id: &str, role: Role, reason: Option<&str>) -> DbResult<Order> {
        let mut tx = self.pool.begin().await?;
        let mut order = lock_order(&mut tx, order_id).await?;

        lifecycle::authorize_transition(&order, OrderStatus::Cancelled, role)?;

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE orders SET status = ?, cancel_reason = ?, updated_at = ? WHERE order_id = ? AND status = ?",
        )
        .bind(OrderStatus::Cancelled)
        .bind(reason)
        .bind(now)
        .bind(order_id)
        .bind(order.status)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(stale(&mut tx, order_id, order.status).await);
        }

        tx.commit().await?;

        info!(order_id, from = %order.status, "Order cancelled");
        order.status = OrderStatus::Cancelled;
        order.cancel_reason = reason.map(str::to_string);
        order.updated_at = now;
        Ok(order)
    }

    /// Replaces the items of an order (manager edit).
    ///
    /// Surviving items keep their stored status, new items start OPEN, the
    /// delivery fee and total are recomputed, and the order status is
    /// re-derived (adding items to a READY order makes it PARTIALLY_READY).
    pub async fn replace_items(
        &self,
        order_id: &str,
        role: Role,
        items: Vec<LineItem>,
    ) -> DbResult<Order> {
        if !role.is_manager() {
            return Err(CoreError::forbidden(role, "edit orders").into());
        }
        validate_line_items(&items).map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await?;
        let mut order = lock_order(&mut tx, order_id).await?;

        if order.is_terminal() {
            return Err(CoreError::TerminalOrder {
                order_id: order.order_id,
                status: order.status,
            }
            .into());
        }

        let items = lifecycle::carry_item_statuses(&order.items, items);
        let items = pricing::apply_delivery_fee(items, order.mode);
        let total = pricing::line_sum(&items);
        let derived = lifecycle::derive_order_status(order.status, order.mode, &items);
        let now = Utc::now();

        sqlx::query("DELETE FROM order_items WHERE order_id = ?")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        insert_items(&mut tx, order_id, &items).await?;

        let result = sqlx::query(
            "UPDATE orders SET status = ?, total = ?, updated_at = ? WHERE order_id = ? AND status = ?",
        )
        .bind(derived)
        .bind(total.amount())
        .bind(now)
        .bind(order_id)
        .bind(order.status)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(stale(&mut tx, order_id, order.status).await);
        }

        tx.commit().await?;

        info!(order_id, items = items.len(), %total, "Order edited");
        order.status = derived;
        order.total = total;
        order.items = items;
        order.updated_at = now;
        Ok(order)
    }
}

// =============================================================================
// Connection-Level Helpers
// =============================================================================

/// Generates an order id: `ORD-YYYYMMDD-xxxxxxxx`.
pub fn generate_order_id() -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("ORD-{}-{}", date, &suffix[..8])
}

async fn fetch_order(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Order> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("{SELECT_ORDER} WHERE order_id = ?"))
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;

    let row = row.ok_or_else(|| DbError::not_found("Order", order_id))?;

    let items: Vec<ItemRow> = sqlx::query_as(
        "SELECT order_id, item_id, name, qty, price, status FROM order_items WHERE order_id = ? ORDER BY position",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(row.into_order(items.into_iter().map(LineItem::from).collect()))
}

/// Takes the write lock on the database, then reads the order.
async fn lock_order(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Order> {
    let touched = sqlx::query("UPDATE orders SET updated_at = updated_at WHERE order_id = ?")
        .bind(order_id)
        .execute(&mut *conn)
        .await?;

    if touched.rows_affected() == 0 {
        return Err(DbError::not_found("Order", order_id));
    }

    fetch_order(conn, order_id).await
}

async fn set_status(
    conn: &mut SqliteConnection,
    order_id: &str,
    expected: OrderStatus,
    next: OrderStatus,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE orders SET status = ?, updated_at = ? WHERE order_id = ? AND status = ?",
    )
    .bind(next)
    .bind(now)
    .bind(order_id)
    .bind(expected)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(stale(conn, order_id, expected).await);
    }
    Ok(())
}

async fn set_item_status(
    conn: &mut SqliteConnection,
    order_id: &str,
    item_id: &str,
    expected: ItemStatus,
    next: ItemStatus,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE order_items SET status = ? WHERE order_id = ? AND item_id = ? AND status = ?",
    )
    .bind(next)
    .bind(order_id)
    .bind(item_id)
    .bind(expected)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let actual: Option<ItemStatus> =
            sqlx::query_scalar("SELECT status FROM order_items WHERE order_id = ? AND item_id = ?")
                .bind(order_id)
                .bind(item_id)
                .fetch_optional(&mut *conn)
                .await?;

        let id = format!("{order_id}/{item_id}");
        return Err(match actual {
            Some(actual) => DbError::conflict("Order item", id, expected, actual),
            None => DbError::not_found("Order item", id),
        });
    }
    Ok(())
}

/// Builds the error for a compare-and-set that matched no row.
async fn stale(conn: &mut SqliteConnection, order_id: &str, expected: OrderStatus) -> DbError {
    let actual: Result<Option<OrderStatus>, sqlx::Error> =
        sqlx::query_scalar("SELECT status FROM orders WHERE order_id = ?")
            .bind(order_id)
            .fetch_optional(&mut *conn)
            .await;

    match actual {
        Ok(Some(actual)) => DbError::conflict("Order", order_id, expected, actual),
        Ok(None) => DbError::not_found("Order", order_id),
        Err(err) => err.into(),
    }
}

async fn insert_items(conn: &mut SqliteConnection, order_id: &str, items: &[LineItem]) -> DbResult<()> {
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, position, item_id, name, qty, price, status)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(order_id)
        .bind(position as i64)
        .bind(item.item_id.as_str())
        .bind(item.name.as_str())
        .bind(item.qty)
        .bind(item.price.amount())
        .bind(item.status)
        .execute(&mut *conn)
        .await
        .map_err(|err| match DbError::from(err) {
            DbError::UniqueViolation { .. } => DbError::duplicate("itemId", item.item_id.clone()),
            other => other,
        })?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
