//! # Validation Module
//!
//! Input validation for everything that crosses the API boundary.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                      │
//! │  └── Shape and types; missing fields stay `None` in Unchecked* types   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required fields, allowed values, positive quantities              │
//! │  ├── Amounts within Money::max_amount(), lines that price in range     │
//! │  └── Unchecked* ──► checked domain type                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::{validate_email, validate_quantity};
//!
//! validate_email("ada@example.com").unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::price_line;
use crate::checkout::{SaleRequest, SaleRequestItem};
use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{
    Discount, ModifierGroup, NewCategory, NewProduct, NewStore, PaymentDetails, PaymentMethod,
    ProductUpdate, RegisterRequest, SelectedModifier, StoreUpdate,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted name for stores, products, categories and users.
pub const MAX_NAME_LEN: usize = 200;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Largest quantity accepted on a submitted sale line.
pub const MAX_QUANTITY: i64 = 1_000_000;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name: non-blank, at most [`MAX_NAME_LEN`] characters.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// ## Rules
/// - exactly one `@`
/// - non-empty local part
/// - domain contains a dot that is neither first nor last
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_email;
///
/// assert!(validate_email("ada@example.com").is_ok());
/// assert!(validate_email("ada@localhost").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must look like name@example.com".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
        return Err(invalid());
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }

    Ok(())
}

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

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity: between 1 and [`MAX_QUANTITY`].
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 1 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: "1".to_string(),
            max: MAX_QUANTITY.to_string(),
        });
    }

    Ok(())
}

/// Validates a price. Zero is allowed (free items); the ceiling is
/// [`Money::max_amount`].
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    validate_amount(field, price.amount())
}

/// A non-negative amount no larger than [`Money::max_amount`].
fn validate_amount(field: &str, amount: Decimal) -> ValidationResult<()> {
    if (amount.is_sign_negative() && !amount.is_zero()) || amount > Money::max_amount().amount() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "0".to_string(),
            max: Money::max_amount().amount().to_string(),
        });
    }

    Ok(())
}

/// A signed amount whose magnitude is at most [`Money::max_amount`].
fn validate_signed_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_within_limit() {
        let max = Money::max_amount().amount();
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: (-max).to_string(),
            max: max.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

pub fn validate_registration(request: &RegisterRequest) -> ValidationResult<()> {
    validate_name("name", &request.name)?;
    validate_email(&request.email)?;
    validate_password(&request.password)
}

pub fn validate_new_store(store: &NewStore) -> ValidationResult<()> {
    validate_name("name", &store.name)
}

/// Only the fields being changed are checked.
pub fn validate_store_update(update: &StoreUpdate) -> ValidationResult<()> {
    if let Some(name) = &update.name {
        validate_name("name", name)?;
    }
    Ok(())
}

pub fn validate_new_category(category: &NewCategory) -> ValidationResult<()> {
    validate_name("name", &category.name)
}

/// Validates a product definition.
///
/// ## Rules
/// - name and price as for any product
/// - modifier group names unique; option names unique within a group
/// - option prices non-negative
/// - discount names unique (lines key selected discounts by name)
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_name("name", &product.name)?;
    validate_price("price", product.price)?;
    validate_modifier_groups(&product.modifiers)?;
    validate_discounts(&product.discounts)
}

pub fn validate_product_update(update: &ProductUpdate) -> ValidationResult<()> {
    if let Some(name) = &update.name {
        validate_name("name", name)?;
    }
    if let Some(price) = update.price {
        validate_price("price", price)?;
    }
    if let Some(groups) = &update.modifiers {
        validate_modifier_groups(groups)?;
    }
    if let Some(discounts) = &update.discounts {
        validate_discounts(discounts)?;
    }
    Ok(())
}

pub fn validate_modifier_groups(groups: &[ModifierGroup]) -> ValidationResult<()> {
    let mut group_names = HashSet::new();
    for group in groups {
        validate_name("modifier name", &group.name)?;
        if !group_names.insert(group.name.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "modifier".to_string(),
                value: group.name.clone(),
            });
        }

        let mut option_names = HashSet::new();
        for option in &group.options {
            validate_name("option name", &option.name)?;
            validate_price("option price", option.price)?;
            if !option_names.insert(option.name.as_str()) {
                return Err(ValidationError::Duplicate {
                    field: format!("{} option", group.name),
                    value: option.name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Names unique, values between 0 and [`Money::max_amount`].
pub fn validate_discounts(discounts: &[Discount]) -> ValidationResult<()> {
    let mut names = HashSet::new();
    for discount in discounts {
        validate_name("discount name", &discount.name)?;
        validate_amount("discount value", discount.value)?;
        if !names.insert(discount.name.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "discount".to_string(),
                value: discount.name.clone(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Sale Requests
// =============================================================================

/// A sale line as received over the wire, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UncheckedSaleItem {
    pub product: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<Money>,
    #[serde(default)]
    pub modifiers: Vec<SelectedModifier>,
    #[serde(default)]
    pub discounts: Vec<Discount>,
}

/// A sale submission as received over the wire, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UncheckedSaleRequest {
    pub store: Option<String>,
    pub items: Option<Vec<UncheckedSaleItem>>,
    pub total: Option<Money>,
    /// Free text so unknown methods get a proper error instead of a parse failure.
    pub payment_method: Option<String>,
    pub payment_details: Option<PaymentDetails>,
}

/// Checks a submitted sale and converts it to a [`SaleRequest`].
///
/// ## Errors
/// - `Required` for a missing store, items, total, payment method, or a
///   line's product, quantity or price (line fields are named like
///   `items[2].quantity`)
/// - `Empty` when the item list is empty
/// - `NotAllowed` for a payment method other than cash or card
/// - `MustBePositive` for a quantity below 1
/// - `OutOfRange` for a quantity above [`MAX_QUANTITY`], a unit price,
///   option price or discount value outside `0..=Money::max_amount()`, a
///   line whose price leaves the supported range (`items[i].subtotal`), or
///   a total whose magnitude exceeds [`Money::max_amount`]
pub fn validate_sale_request(unchecked: UncheckedSaleRequest) -> ValidationResult<SaleRequest> {
    let store = unchecked
        .store
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ValidationError::required("store"))?;

    let raw_items = unchecked
        .items
        .ok_or_else(|| ValidationError::required("items"))?;
    if raw_items.is_empty() {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        });
    }

    let items = raw_items
        .into_iter()
        .enumerate()
        .map(|(i, item)| validate_sale_item(i, item))
        .collect::<ValidationResult<Vec<_>>>()?;

    let total = unchecked
        .total
        .ok_or_else(|| ValidationError::required("total"))?;
    validate_signed_amount("total", total)?;

    let payment_method: PaymentMethod = unchecked
        .payment_method
        .ok_or_else(|| ValidationError::required("paymentMethod"))?
        .parse()?;

    Ok(SaleRequest {
        store,
        items,
        total,
        payment_method,
        payment_details: unchecked.payment_details.unwrap_or_default(),
    })
}

fn validate_sale_item(index: usize, item: UncheckedSaleItem) -> ValidationResult<SaleRequestItem> {
    let field = |name: &str| format!("items[{}].{}", index, name);

    let product = item
        .product
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ValidationError::required(field("product")))?;

    let quantity = item
        .quantity
        .ok_or_else(|| ValidationError::required(field("quantity")))?;
    validate_quantity(quantity).map_err(|e| match e {
        ValidationError::OutOfRange { min, max, .. } => ValidationError::OutOfRange {
            field: field("quantity"),
            min,
            max,
        },
        _ => ValidationError::MustBePositive {
            field: field("quantity"),
        },
    })?;

    let price = item
        .price
        .ok_or_else(|| ValidationError::required(field("price")))?;
    validate_price(&field("price"), price)?;

    for modifier in &item.modifiers {
        validate_price(&field("modifiers"), modifier.option.price)?;
    }
    for discount in &item.discounts {
        validate_amount(&field("discounts"), discount.value)?;
    }
    if price_line(price, quantity, &item.modifiers, &item.discounts).is_err() {
        let max = Money::max_amount().amount();
        return Err(ValidationError::OutOfRange {
            field: field("subtotal"),
            min: (-max).to_string(),
            max: max.to_string(),
        });
    }

    Ok(SaleRequestItem {
        product,
        quantity,
        price,
        modifiers: item.modifiers,
        discounts: item.discounts,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
