//! # Domain Types
//!
//! Core domain types used throughout Tally POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Store       │   │    Product      │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──│  store          │   │  store          │       │
//! │  │  owner (User)   │   │  price (Money)  │   │  items[]        │       │
//! │  │  address/phone  │   │  modifiers[]    │   │  total          │       │
//! │  └─────────────────┘   │  discounts[]    │   │  paymentMethod  │       │
//! │                        └─────────────────┘   │  status         │       │
//! │  ┌─────────────────┐   ┌─────────────────┐   └─────────────────┘       │
//! │  │ ModifierGroup   │   │    Discount     │                              │
//! │  │  ─────────────  │   │  ─────────────  │   PaymentMethod: cash|card   │
//! │  │  name "Size"    │   │  percentage 10  │   SaleStatus: completed|     │
//! │  │  options[]      │   │  fixed 3.00     │               refunded       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Every type serializes with camelCase keys, the shape the REST API and the
//! browser storefront exchange. Money and discount values are JSON numbers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Store
// =============================================================================

/// A physical store (tenant) owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Store {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    /// User ID of the owner.
    pub owner: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a store. The owner comes from the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewStore {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
}

/// Partial update for a store; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StoreUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

// =============================================================================
// Category
// =============================================================================

/// A product category within a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub store: String,
    pub name: String,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

// =============================================================================
// Modifiers
// =============================================================================

/// One choice within a modifier group, e.g. "Large" for +$1.50 per unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ModifierOption {
    pub name: String,
    /// Incremental unit price.
    pub price: Money,
}

impl ModifierOption {
    pub fn new(name: impl Into<String>, price: Money) -> Self {
        ModifierOption {
            name: name.into(),
            price,
        }
    }
}

/// A named group of options offered on a product, e.g. "Size".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ModifierGroup {
    pub name: String,
    #[serde(default)]
    pub options: Vec<ModifierOption>,
}

/// The option chosen for one modifier group on a line item.
///
/// `name` is the group name; a line holds at most one entry per group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SelectedModifier {
    pub name: String,
    pub option: ModifierOption,
}

// =============================================================================
// Discounts
// =============================================================================

/// How a discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum DiscountKind {
    /// `value` percent off the running line total.
    Percentage,
    /// `value` off per unit.
    Fixed,
}

/// A named reduction that can be toggled on a line item.
///
/// Discounts are identified by `name` within a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Discount {
    pub name: String,
    #[serde(rename = "type")]
    #[ts(rename = "type")]
    pub kind: DiscountKind,
    #[ts(type = "number")]
    pub value: Decimal,
}

impl Discount {
    /// A percentage discount, e.g. `Discount::percentage("Happy Hour", 10)`.
    pub fn percentage(name: impl Into<String>, percent: impl Into<Decimal>) -> Self {
        Discount {
            name: name.into(),
            kind: DiscountKind::Percentage,
            value: percent.into(),
        }
    }

    /// A fixed per-unit discount.
    pub fn fixed(name: impl Into<String>, amount: Money) -> Self {
        Discount {
            name: name.into(),
            kind: DiscountKind::Fixed,
            value: amount.amount(),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: String,

    /// Store this product belongs to.
    pub store: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Unit price.
    pub price: Money,

    /// Category ID, if categorized.
    pub category: Option<String>,

    /// Option groups the cashier can pick from.
    #[serde(default)]
    pub modifiers: Vec<ModifierGroup>,

    /// Discounts the cashier can toggle on a line.
    #[serde(default)]
    pub discounts: Vec<Discount>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates an uncategorized product with no modifiers or discounts.
    pub fn new(
        id: impl Into<String>,
        store: impl Into<String>,
        name: impl Into<String>,
        price: Money,
    ) -> Self {
        let now = Utc::now();
        Product {
            id: id.into(),
            store: store.into(),
            name: name.into(),
            price,
            category: None,
            modifiers: Vec::new(),
            discounts: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds a modifier group (builder style).
    pub fn with_modifier_group(mut self, group: ModifierGroup) -> Self {
        self.modifiers.push(group);
        self
    }

    /// Adds an available discount (builder style).
    pub fn with_discount(mut self, discount: Discount) -> Self {
        self.discounts.push(discount);
        self
    }

    /// Looks up an option by group and option name.
    pub fn find_option(&self, group: &str, option: &str) -> Option<&ModifierOption> {
        self.modifiers
            .iter()
            .find(|g| g.name == group)
            .and_then(|g| g.options.iter().find(|o| o.name == option))
    }

    /// Looks up an available discount by name.
    pub fn find_discount(&self, name: &str) -> Option<&Discount> {
        self.discounts.iter().find(|d| d.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub category: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<ModifierGroup>,
    #[serde(default)]
    pub discounts: Vec<Discount>,
}

/// Partial update for a product; `None` leaves the field unchanged.
///
/// `category: Some(None)` is not expressible over JSON, so clearing a
/// category uses `clearCategory: true`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<Money>,
    pub category: Option<String>,
    #[serde(default)]
    pub clear_category: bool,
    pub modifiers: Option<Vec<ModifierGroup>>,
    pub discounts: Option<Vec<Discount>>,
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    Card,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 2] = [PaymentMethod::Cash, PaymentMethod::Card];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            _ => Err(ValidationError::NotAllowed {
                field: "paymentMethod".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            }),
        }
    }
}

/// Extra information captured by the payment dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentDetails {
    /// Cash handed over by the customer.
    pub tendered: Option<Money>,
    /// Card terminal authorization or other external reference.
    pub reference: Option<String>,
}

impl PaymentDetails {
    /// Change owed for a cash payment, if an amount was tendered.
    ///
    /// `None` also when the difference is not representable.
    pub fn change_due(&self, total: Money) -> Option<Money> {
        self.tendered.and_then(|tendered| tendered.checked_sub(total))
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a persisted sale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SaleStatus {
    /// Sale has been paid and finalized.
    #[default]
    Completed,
    /// Sale was refunded by the administrative flow.
    Refunded,
}

// =============================================================================
// Sale
// =============================================================================

/// A line of a persisted sale.
///
/// Captures the unit price and selections at the time of sale, so later
/// product edits do not change history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItem {
    /// Product ID.
    pub product: String,
    /// Product name at time of sale, when the product still existed.
    pub name: Option<String>,
    pub quantity: i64,
    /// Unit price at time of sale.
    pub price: Money,
    #[serde(default)]
    pub modifiers: Vec<SelectedModifier>,
    #[serde(default)]
    pub discounts: Vec<Discount>,
    /// Line total as computed by the server.
    pub subtotal: Money,
}

/// A completed checkout. Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub store: String,
    pub items: Vec<SaleItem>,
    pub total: Money,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub status: SaleStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Users & Auth
// =============================================================================

/// A registered user. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// What a successful login yields: a bearer token and the user it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Credentials {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sale_status_default() {
        assert_eq!(SaleStatus::default(), SaleStatus::Completed);
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!(" Card ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);

        let err = "qr".parse::<PaymentMethod>().unwrap_err();
        assert!(matches!(err, ValidationError::NotAllowed { ref field, .. } if field == "paymentMethod"));
    }

    #[test]
    fn test_discount_serializes_kind_as_type() {
        let discount = Discount::percentage("Happy Hour", 10);
        let json = serde_json::to_value(&discount).unwrap();
        assert_eq!(json["type"], "percentage");
        assert_eq!(json["value"], 10.0);

        let parsed: Discount =
            serde_json::from_str(r#"{"name":"Staff","type":"fixed","value":3}"#).unwrap();
        assert_eq!(parsed.kind, DiscountKind::Fixed);
        assert_eq!(parsed.value, dec!(3));
    }

    #[test]
    fn test_product_lookup_helpers() {
        let product = Product::new("p-1", "s-1", "Latte", Money::from_cents(450))
            .with_modifier_group(ModifierGroup {
                name: "Size".to_string(),
                options: vec![ModifierOption::new("Large", Money::from_cents(100))],
            })
            .with_discount(Discount::fixed("Loyalty", Money::from_cents(50)));

        assert_eq!(
            product.find_option("Size", "Large").map(|o| o.price),
            Some(Money::from_cents(100))
        );
        assert!(product.find_option("Size", "Small").is_none());
        assert!(product.find_discount("Loyalty").is_some());
    }

    #[test]
    fn test_product_json_is_camel_case() {
        let product = Product::new("p-1", "s-1", "Latte", Money::from_cents(450));
        let json = serde_json::to_value(&product).unwrap();
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["price"], 4.5);
    }

    #[test]
    fn test_change_due() {
        let details = PaymentDetails {
            tendered: Some(Money::from_cents(2000)),
            reference: None,
        };
        assert_eq!(
            details.change_due(Money::from_cents(1530)),
            Some(Money::from_cents(470))
        );
        assert_eq!(PaymentDetails::default().change_due(Money::zero()), None);
    }
}
