//! # Validation Module
//!
//! Input validation shared by the order builder and the endpoint.
//!
//! ## Where It Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Order builder (cafe-client)                                  │
//! │  └── validate_delivery_details before createOrder is sent              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Action handlers (cafe-api)                                   │
//! │  └── THIS MODULE again: never trust the client                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                        │
//! │  └── CHECK (qty > 0), CHECK (price >= 0), PRIMARY KEY constraints      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{FulfillmentMode, LineItem};
use crate::{MAX_CART_ITEMS, MAX_ITEM_PRICE, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// String Validators
// =============================================================================

fn required<'a>(field: &str, value: &'a str, max: usize) -> ValidationResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(value)
}

/// Customer or staff display name: 1–100 characters.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    required(field, name, 100).map(|_| ())
}

/// Mobile number: 10–15 digits, optional leading `+`, spaces and dashes
/// ignored.
///
/// ```rust
/// use cafe_core::validation::validate_mobile;
///
/// assert!(validate_mobile("98765 43210").is_ok());
/// assert!(validate_mobile("+91-9876543210").is_ok());
/// assert!(validate_mobile("12345").is_err());
/// ```
pub fn validate_mobile(mobile: &str) -> ValidationResult<()> {
    let mobile = required("mobile", mobile, 20)?;
    let body = mobile.strip_prefix('+').unwrap_or(mobile);

    let mut digits = 0;
    for c in body.chars() {
        match c {
            '0'..='9' => digits += 1,
            ' ' | '-' => {}
            _ => return Err(ValidationError::format("mobile", "must contain only digits")),
        }
    }

    if !(10..=15).contains(&digits) {
        return Err(ValidationError::format("mobile", "must have 10 to 15 digits"));
    }
    Ok(())
}

/// Delivery address: 1–300 characters.
pub fn validate_address(address: &str) -> ValidationResult<()> {
    required("address", address, 300).map(|_| ())
}

/// Email address of the shape `local@domain.tld`.
///
/// No whitespace, exactly one `@`, and a dot in the domain with text on
/// both sides.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = required("email", email, 254)?;

    if email.chars().any(char::is_whitespace) {
        return Err(ValidationError::format("email", "must not contain spaces"));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::format("email", "missing @"));
    };
    if local.is_empty() || domain.contains('@') {
        return Err(ValidationError::format("email", "must contain a single @"));
    }

    let valid_domain = domain
        .rsplit_once('.')
        .map(|(host, tld)| !host.is_empty() && !tld.is_empty())
        .unwrap_or(false);
    if !valid_domain {
        return Err(ValidationError::format("email", "domain must contain a dot"));
    }

    Ok(())
}

/// Login name: 3–32 characters of letters, digits, `.`, `_`, `-`.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = required("username", username, 32)?;

    if username.chars().count() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ValidationError::format(
            "username",
            "must contain only letters, numbers, dots, hyphens and underscores",
        ));
    }
    Ok(())
}

/// Password: at least 6 characters, at most 128.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }
    if password.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Quantity must be 1..=MAX_ITEM_QUANTITY.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "qty".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "qty".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Unit prices lie in `0..=MAX_ITEM_PRICE`.
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if !(0..=MAX_ITEM_PRICE).contains(&price.amount()) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_ITEM_PRICE,
        });
    }
    Ok(())
}

/// Close-dialog discount inputs: percent in [0, 100], amount ≥ 0.
pub fn validate_discount(percent: f64, amount: Money) -> ValidationResult<()> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(ValidationError::OutOfRange {
            field: "discountPercent".to_string(),
            min: 0,
            max: 100,
        });
    }
    if amount.amount() < 0 {
        return Err(ValidationError::OutOfRange {
            field: "discountAmount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

// =============================================================================
// Order Validators
// =============================================================================

/// Food items of an order: at least one, at most MAX_CART_ITEMS, each with
/// a valid id, name, quantity and price, no id twice. A delivery-fee line
/// is ignored here; pricing recomputes it.
pub fn validate_line_items(items: &[LineItem]) -> ValidationResult<()> {
    let food: Vec<&LineItem> = items.iter().filter(|i| !i.is_delivery_fee()).collect();

    if food.is_empty() {
        return Err(ValidationError::required("items"));
    }
    if food.len() > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    let mut seen = HashSet::new();
    for item in food {
        required("itemId", &item.item_id, 64)?;
        required("name", &item.name, 100)?;
        validate_quantity(item.qty)?;
        validate_price(item.price)?;

        if !seen.insert(item.item_id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "itemId".to_string(),
                value: item.item_id.clone(),
            });
        }
    }
    Ok(())
}

/// Delivery orders need a name, a mobile number and an address. Other
/// modes need nothing.
pub fn validate_delivery_details(
    mode: FulfillmentMode,
    customer_name: &str,
    mobile: &str,
    address: &str,
) -> ValidationResult<()> {
    if mode != FulfillmentMode::Delivery {
        return Ok(());
    }
    validate_name("customerName", customer_name)?;
    validate_mobile(mobile)?;
    validate_address(address)
}

// =============================================================================
// Unit Tests
// =============================================================================
