//! # Order Builder
//!
//! The cart behind the order page, the staff order screen and the
//! "add items to order" screen.
//!
//! ## Entry Points
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  QR code at a table ──► Cart::for_table("T4")   Dine-in, table fixed    │
//! │  Online ordering    ──► Cart::online()          Delivery, COUNTER       │
//! │  Staff new order    ──► Cart::staff()           mode + table selectable │
//! │  Staff add items    ──► Cart::add_to(&order)    mode + table locked     │
//! │                                                                         │
//! │  change_qty(+1/-1) ──► totals() ──► build_order() / build_edit()        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals are a preview computed with the same pricing functions the server
//! uses; the server re-prices every order from its own menu.

use serde::{Deserialize, Serialize};

use cafe_core::action::{CreateOrder, EditOrder};
use cafe_core::pricing::{self, PriceBreakdown};
use cafe_core::validation::validate_delivery_details;
use cafe_core::{
    FulfillmentMode, LineItem, MenuItem, Money, Order, COUNTER_LOCATION_ID, MAX_CART_ITEMS,
    MAX_ITEM_QUANTITY,
};

use crate::error::CartError;

/// A line in the cart. Name and price are frozen when first added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub item_id: String,
    pub name: String,
    pub price: Money,
    pub qty: i64,
}

impl CartItem {
    fn from_menu(item: &MenuItem) -> Self {
        CartItem {
            item_id: item.item_id.clone(),
            name: item.name.clone(),
            price: item.price,
            qty: 0,
        }
    }

    pub fn line_total(&self) -> Money {
        self.price.times(self.qty)
    }

    fn to_line_item(&self) -> LineItem {
        LineItem::new(
            self.item_id.clone(),
            self.name.clone(),
            self.qty,
            self.price.amount(),
        )
    }
}

/// Name, mobile and address. Required only for Delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    pub name: String,
    pub mobile: String,
    pub address: String,
}

/// What the cart will be submitted as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum CartTarget {
    /// A new order.
    NewOrder,
    /// Extra items for an order that already exists. `existing` holds its
    /// food items; the delivery fee is recomputed over the combination.
    ExistingOrder {
        order_id: String,
        existing: Vec<LineItem>,
    },
}

/// Cart totals for the cart bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    /// Units in the cart (new items only when adding to an order).
    pub quantity: i64,
    /// Food already on the order. Zero for new orders.
    pub previous_food_total: Money,
    /// Food in the cart.
    pub cart_subtotal: Money,
    pub delivery_fee: Money,
    /// What the order will cost once submitted.
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Insertion order, unique by item id.
    items: Vec<CartItem>,
    mode: FulfillmentMode,
    location_id: Option<String>,
    customer: CustomerDetails,
    target: CartTarget,
}

impl Cart {
    fn with(mode: FulfillmentMode, location_id: Option<String>, target: CartTarget) -> Self {
        Cart {
            items: Vec::new(),
            mode,
            location_id,
            customer: CustomerDetails::default(),
            target,
        }
    }

    /// Customer ordering from a table's QR code.
    pub fn for_table(location_id: impl Into<String>) -> Self {
        Self::with(
            FulfillmentMode::DineIn,
            Some(location_id.into()),
            CartTarget::NewOrder,
        )
    }

    /// Customer ordering online; always Delivery.
    pub fn online() -> Self {
        Self::with(
            FulfillmentMode::Delivery,
            Some(COUNTER_LOCATION_ID.to_string()),
            CartTarget::NewOrder,
        )
    }

    /// Staff order screen. Starts as Dine-in with no table selected.
    pub fn staff() -> Self {
        Self::with(FulfillmentMode::DineIn, None, CartTarget::NewOrder)
    }

    /// Adds items to an existing order. Mode and location come from the
    /// order and cannot change.
    pub fn add_to(order: &Order) -> Self {
        Self::with(
            order.mode,
            Some(order.location_id.clone()),
            CartTarget::ExistingOrder {
                order_id: order.order_id.clone(),
                existing: order.food_items().cloned().collect(),
            },
        )
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn mode(&self) -> FulfillmentMode {
        self.mode
    }

    pub fn location_id(&self) -> Option<&str> {
        self.location_id.as_deref()
    }

    pub fn customer(&self) -> &CustomerDetails {
        &self.customer
    }

    pub fn target(&self) -> &CartTarget {
        &self.target
    }

    /// Current quantity of a menu item (0 when absent).
    pub fn qty(&self, item_id: &str) -> i64 {
        self.items
            .iter()
            .find(|item| item.item_id == item_id)
            .map_or(0, |item| item.qty)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Adds `delta` units of a menu item. The line disappears once its
    /// quantity drops to zero or below. Returns the new quantity.
    pub fn change_qty(&mut self, item: &MenuItem, delta: i64) -> Result<i64, CartError> {
        let position = self.items.iter().position(|line| line.item_id == item.item_id);

        let current = position.map_or(0, |idx| self.items[idx].qty);
        let qty = current + delta;

        if qty <= 0 {
            if let Some(idx) = position {
                self.items.remove(idx);
            }
            return Ok(0);
        }

        if qty > MAX_ITEM_QUANTITY {
            return Err(CartError::QuantityTooLarge {
                max: MAX_ITEM_QUANTITY,
            });
        }

        match position {
            Some(idx) => self.items[idx].qty = qty,
            None => {
                if self.items.len() >= MAX_CART_ITEMS {
                    return Err(CartError::TooManyItems {
                        max: MAX_CART_ITEMS,
                    });
                }
                let mut line = CartItem::from_menu(item);
                line.qty = qty;
                self.items.push(line);
            }
        }

        Ok(qty)
    }

    /// Switches fulfillment mode. Takeaway and Delivery go to the counter;
    /// Dine-in needs a table again.
    pub fn set_mode(&mut self, mode: FulfillmentMode) -> Result<(), CartError> {
        self.ensure_new_order()?;

        if mode == self.mode {
            return Ok(());
        }
        self.mode = mode;
        self.location_id = mode
            .uses_counter()
            .then(|| COUNTER_LOCATION_ID.to_string());
        Ok(())
    }

    /// Picks a table. Changing tables empties the cart.
    pub fn select_location(&mut self, location_id: impl Into<String>) -> Result<(), CartError> {
        self.ensure_new_order()?;

        let location_id = location_id.into();
        if self.location_id.as_deref() != Some(location_id.as_str()) {
            self.items.clear();
        }
        self.location_id = Some(location_id);
        Ok(())
    }

    pub fn set_customer(&mut self, customer: CustomerDetails) {
        self.customer = customer;
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn ensure_new_order(&self) -> Result<(), CartError> {
        match &self.target {
            CartTarget::NewOrder => Ok(()),
            CartTarget::ExistingOrder { order_id, .. } => Err(CartError::Locked {
                order_id: order_id.clone(),
            }),
        }
    }

    // =========================================================================
    // Totals
    // =========================================================================

    fn cart_lines(&self) -> Vec<LineItem> {
        self.items.iter().map(CartItem::to_line_item).collect()
    }

    /// Food items the submitted order will contain: the cart alone, or the
    /// existing items with the cart merged in by item id.
    fn combined_lines(&self) -> Vec<LineItem> {
        match &self.target {
            CartTarget::NewOrder => self.cart_lines(),
            CartTarget::ExistingOrder { existing, .. } => {
                let mut combined = existing.clone();
                for line in self.cart_lines() {
                    match combined.iter_mut().find(|old| old.item_id == line.item_id) {
                        Some(old) => old.qty += line.qty,
                        None => combined.push(line),
                    }
                }
                combined
            }
        }
    }

    /// Price preview for the whole order.
    pub fn quote(&self) -> PriceBreakdown {
        pricing::quote(&self.combined_lines(), self.mode)
    }

    pub fn totals(&self) -> CartTotals {
        let quote = self.quote();
        let cart_subtotal: Money = self.items.iter().map(CartItem::line_total).sum();

        CartTotals {
            quantity: self.items.iter().map(|item| item.qty).sum(),
            previous_food_total: quote.food_subtotal.saturating_sub(cart_subtotal),
            cart_subtotal,
            delivery_fee: quote.delivery_fee,
            total: quote.total,
        }
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Builds a `createOrder` request. The delivery-fee line is appended
    /// when it applies; `secret` is left for the client to fill in.
    pub fn build_order(&self) -> Result<CreateOrder, CartError> {
        if !matches!(self.target, CartTarget::NewOrder) {
            return Err(CartError::WrongTarget("adds to an existing order"));
        }
        if self.is_empty() {
            return Err(CartError::Empty);
        }
        let location_id = self
            .location_id
            .clone()
            .ok_or(CartError::MissingLocation)?;

        validate_delivery_details(
            self.mode,
            &self.customer.name,
            &self.customer.mobile,
            &self.customer.address,
        )?;

        Ok(CreateOrder {
            mode: self.mode,
            location_id: Some(location_id),
            customer_name: self.customer.name.trim().to_string(),
            mobile: self.customer.mobile.trim().to_string(),
            address: self.customer.address.trim().to_string(),
            items: pricing::apply_delivery_fee(self.cart_lines(), self.mode),
            secret: None,
        })
    }

    /// Builds an `editOrder` request carrying the existing items plus the
    /// cart, with the delivery fee recomputed over both.
    pub fn build_edit(&self) -> Result<EditOrder, CartError> {
        let CartTarget::ExistingOrder { order_id, .. } = &self.target else {
            return Err(CartError::WrongTarget("is for a new order"));
        };
        if self.is_empty() {
            return Err(CartError::Empty);
        }

        Ok(EditOrder {
            order_id: order_id.clone(),
            items: pricing::apply_delivery_fee(self.combined_lines(), self.mode),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use cafe_core::{ItemStatus, OrderStatus, DELIVERY_FEE_ITEM_ID};
    use chrono::Utc;

    fn dish(id: &str, price: i64) -> MenuItem {
        MenuItem {
            item_id: id.to_string(),
            name: format!("Dish {}", id),
            category: "Test".to_string(),
            category_order: 1,
            item_order: 1,
            price: Money::new(price),
            available: true,
        }
    }

    fn customer() -> CustomerDetails {
        CustomerDetails {
            name: "Asha".to_string(),
            mobile: "9876543210".to_string(),
            address: "12 MG Road".to_string(),
        }
    }

    #[test]
    fn test_change_qty_adds_and_removes() {
        let mut cart = Cart::for_table("T1");
        let chai = dish("chai", 30);

        assert_eq!(cart.change_qty(&chai, 1).unwrap(), 1);
        assert_eq!(cart.change_qty(&chai, 1).unwrap(), 2);
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.totals().cart_subtotal, Money::new(60));

        assert_eq!(cart.change_qty(&chai, -2).unwrap(), 0);
        assert!(cart.is_empty());

        // Decrementing something not in the cart is a no-op.
        assert_eq!(cart.change_qty(&chai, -1).unwrap(), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quantity_cap() {
        let mut cart = Cart::for_table("T1");
        let chai = dish("chai", 30);
        cart.change_qty(&chai, MAX_ITEM_QUANTITY).unwrap();
        assert_eq!(
            cart.change_qty(&chai, 1),
            Err(CartError::QuantityTooLarge {
                max: MAX_ITEM_QUANTITY
            })
        );
        assert_eq!(cart.qty("chai"), MAX_ITEM_QUANTITY);
    }

    #[test]
    fn test_delivery_fee_threshold() {
        let mut cart = Cart::online();
        let pizza = dish("pizza", 200);

        assert_eq!(cart.totals().delivery_fee, Money::zero());

        cart.change_qty(&pizza, 2).unwrap();
        let totals = cart.totals();
        assert_eq!(totals.delivery_fee, Money::new(50));
        assert_eq!(totals.total, Money::new(450));

        cart.change_qty(&pizza, 1).unwrap();
        let totals = cart.totals();
        assert_eq!(totals.delivery_fee, Money::zero());
        assert_eq!(totals.total, Money::new(600));
    }

    #[test]
    fn test_mode_switch_moves_location() {
        let mut cart = Cart::staff();
        assert_eq!(cart.location_id(), None);
        assert_eq!(cart.build_order(), Err(CartError::Empty));

        cart.change_qty(&dish("chai", 30), 1).unwrap();
        assert_eq!(cart.build_order(), Err(CartError::MissingLocation));

        cart.set_mode(FulfillmentMode::Takeaway).unwrap();
        assert_eq!(cart.location_id(), Some(COUNTER_LOCATION_ID));

        cart.set_mode(FulfillmentMode::DineIn).unwrap();
        assert_eq!(cart.location_id(), None);

        cart.select_location("T2").unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_build_delivery_order() {
        let mut cart = Cart::online();
        cart.change_qty(&dish("sandwich", 110), 2).unwrap();

        assert!(matches!(cart.build_order(), Err(CartError::Validation(_))));

        cart.set_customer(customer());
        let order = cart.build_order().unwrap();
        assert_eq!(order.mode, FulfillmentMode::Delivery);
        assert_eq!(order.location_id.as_deref(), Some(COUNTER_LOCATION_ID));
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[1].item_id, DELIVERY_FEE_ITEM_ID);
        assert_eq!(pricing::line_sum(&order.items), Money::new(270));
    }

    fn existing_delivery_order() -> Order {
        let now = Utc::now();
        let mut chai = LineItem::new("chai", "Chai", 2, 100);
        chai.status = ItemStatus::Preparing;
        Order {
            order_id: "ORD-1".to_string(),
            status: OrderStatus::Preparing,
            mode: FulfillmentMode::Delivery,
            location_id: COUNTER_LOCATION_ID.to_string(),
            customer_name: "Asha".to_string(),
            mobile: "9876543210".to_string(),
            address: "12 MG Road".to_string(),
            total: Money::new(250),
            discount_percent: None,
            discount_amount: None,
            final_amount: None,
            payment_mode: None,
            staff_member: None,
            cancel_reason: None,
            ordered_at: now,
            updated_at: now,
            items: vec![chai, LineItem::delivery_fee()],
        }
    }

    #[test]
    fn test_add_to_existing_order() {
        let order = existing_delivery_order();
        let mut cart = Cart::add_to(&order);

        assert!(matches!(
            cart.set_mode(FulfillmentMode::Takeaway),
            Err(CartError::Locked { .. })
        ));
        assert!(matches!(cart.build_order(), Err(CartError::WrongTarget(_))));
        assert_eq!(cart.build_edit(), Err(CartError::Empty));

        let totals = cart.totals();
        assert_eq!(totals.previous_food_total, Money::new(200));
        assert_eq!(totals.delivery_fee, Money::new(50));

        // More chai plus a new dish pushes the food total past the threshold.
        cart.change_qty(&dish("chai", 100), 1).unwrap();
        cart.change_qty(&dish("pizza", 200), 1).unwrap();

        let totals = cart.totals();
        assert_eq!(totals.previous_food_total, Money::new(200));
        assert_eq!(totals.cart_subtotal, Money::new(300));
        assert_eq!(totals.delivery_fee, Money::zero());
        assert_eq!(totals.total, Money::new(500));

        let edit = cart.build_edit().unwrap();
        assert_eq!(edit.order_id, "ORD-1");
        assert_eq!(edit.items.len(), 2);
        assert_eq!(edit.items[0].qty, 3);
        assert_eq!(edit.items[0].status, ItemStatus::Preparing);
        assert_eq!(edit.items[1].item_id, "pizza");
    }
}
