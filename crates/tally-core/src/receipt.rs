//! # Receipt
//!
//! What the cashier sees (and prints) after a sale is confirmed.
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │              Corner Cafe               │
//! │             12 Main Street             │
//! │               555-0100                 │
//! │----------------------------------------│
//! │Latte x2                          $10.00│
//! │  + Size: Large                         │
//! │----------------------------------------│
//! │Total                             $10.00│
//! │Payment Method                      Cash│
//! │Date                    2024-03-01 12:00│
//! └────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::cart::Cart;
use crate::checkout::ConfirmedSale;
use crate::money::Money;
use crate::types::{PaymentMethod, Store};

/// Width of a rendered receipt, in characters.
pub const RECEIPT_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    /// `"Group: Option"` for each selected modifier.
    pub modifiers: Vec<String>,
    /// Line total after modifiers and discounts.
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub store_name: String,
    pub store_address: String,
    pub store_phone: String,
    pub lines: Vec<ReceiptLine>,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub tendered: Option<Money>,
    pub change: Option<Money>,
    pub date: DateTime<Utc>,
}

impl Receipt {
    /// Builds the receipt for a confirmed sale from the cart it was made from.
    pub fn new(store: &Store, cart: &Cart, confirmed: &ConfirmedSale) -> Self {
        let lines = cart
            .items()
            .iter()
            .map(|line| ReceiptLine {
                name: line.product().name.clone(),
                quantity: line.quantity(),
                modifiers: line
                    .selected_modifiers()
                    .iter()
                    .map(|m| format!("{}: {}", m.name, m.option.name))
                    .collect(),
                amount: line.total(),
            })
            .collect();

        let total = confirmed.sale.total;
        let tendered = match confirmed.payment_method {
            PaymentMethod::Cash => confirmed.payment_details.tendered,
            PaymentMethod::Card => None,
        };

        Receipt {
            store_name: store.name.clone(),
            store_address: store.address.clone(),
            store_phone: store.phone.clone(),
            lines,
            total,
            payment_method: confirmed.payment_method,
            tendered,
            change: tendered.and_then(|t| t.checked_sub(total)),
            date: confirmed.sale.created_at,
        }
    }

    /// Renders the receipt as fixed-width text, one line per row.
    pub fn render(&self) -> String {
        let rule = "-".repeat(RECEIPT_WIDTH);
        let mut out = Vec::new();

        for header in [&self.store_name, &self.store_address, &self.store_phone] {
            if !header.is_empty() {
                out.push(center(header));
            }
        }
        out.push(rule.clone());

        for line in &self.lines {
            out.push(row(
                &format!("{} x{}", line.name, line.quantity),
                &line.amount.to_string(),
            ));
            for modifier in &line.modifiers {
                out.push(format!("  + {}", modifier));
            }
        }
        out.push(rule);

        out.push(row("Total", &self.total.to_string()));
        out.push(row("Payment Method", payment_label(self.payment_method)));
        if let (Some(tendered), Some(change)) = (self.tendered, self.change) {
            out.push(row("Tendered", &tendered.to_string()));
            out.push(row("Change", &change.to_string()));
        }
        out.push(row("Date", &self.date.format("%Y-%m-%d %H:%M").to_string()));

        out.join("\n")
    }
}

fn payment_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "Cash",
        PaymentMethod::Card => "Card",
    }
}

fn center(text: &str) -> String {
    let len = text.chars().count();
    if len >= RECEIPT_WIDTH {
        return text.to_string();
    }
    let pad = (RECEIPT_WIDTH - len) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

/// Left text and right-aligned value; the left side is cut to keep one space.
fn row(left: &str, right: &str) -> String {
    let right_len = right.chars().count();
    let room = RECEIPT_WIDTH.saturating_sub(right_len + 1);
    let left: String = left.chars().take(room).collect();
    let gap = RECEIPT_WIDTH.saturating_sub(left.chars().count() + right_len);
    format!("{}{}{}", left, " ".repeat(gap.max(1)), right)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Discount, ModifierOption, PaymentDetails, Product, Sale, SaleStatus,
    };
    use chrono::TimeZone;

    fn store() -> Store {
        let now = Utc::now();
        Store {
            id: "s-1".to_string(),
            name: "Corner Cafe".to_string(),
            address: "12 Main Street".to_string(),
            phone: "555-0100".to_string(),
            owner: "u-1".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn confirmed(cart: &Cart, method: PaymentMethod, tendered: Option<Money>) -> ConfirmedSale {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        ConfirmedSale {
            sale: Sale {
                id: "sale-1".to_string(),
                store: "s-1".to_string(),
                items: Vec::new(),
                total: cart.total(),
                payment_method: method,
                status: SaleStatus::Completed,
                created_at: at,
                updated_at: at,
            },
            payment_method: method,
            payment_details: PaymentDetails {
                tendered,
                reference: None,
            },
        }
    }

    fn cart() -> Cart {
        let latte = Product::new("p-1", "s-1", "Latte", Money::from_cents(450));
        let mut cart = Cart::new();
        cart.add_item(&latte).unwrap();
        cart.add_item(&latte).unwrap();
        cart.toggle_modifier(0, "Size", ModifierOption::new("Large", Money::from_cents(50)))
            .unwrap();
        cart.toggle_discount(0, Discount::percentage("Happy Hour", 10))
            .unwrap();
        cart
    }

    #[test]
    fn test_lines_use_discounted_amount() {
        let cart = cart();
        let receipt = Receipt::new(&store(), &cart, &confirmed(&cart, PaymentMethod::Card, None));

        assert_eq!(receipt.lines.len(), 1);
        assert_eq!(receipt.lines[0].amount, Money::from_cents(900));
        assert_eq!(receipt.lines[0].modifiers, vec!["Size: Large".to_string()]);
        assert_eq!(receipt.total, Money::from_cents(900));
        assert!(receipt.change.is_none());
    }

    #[test]
    fn test_render() {
        let cart = cart();
        let receipt = Receipt::new(&store(), &cart, &confirmed(&cart, PaymentMethod::Card, None));
        let text = receipt.render();

        assert!(text.contains("Corner Cafe"));
        assert!(text.contains("  + Size: Large"));
        assert!(text.contains("Latte x2"));
        assert!(text.contains("2024-03-01 12:00"));
        for line in text.lines() {
            assert!(line.chars().count() <= RECEIPT_WIDTH, "too wide: {line:?}");
        }

        let total_row = text.lines().find(|l| l.starts_with("Total")).unwrap();
        assert!(total_row.ends_with("$9.00"));
        assert_eq!(total_row.chars().count(), RECEIPT_WIDTH);
    }

    #[test]
    fn test_cash_shows_change() {
        let cart = cart();
        let receipt = Receipt::new(
            &store(),
            &cart,
            &confirmed(&cart, PaymentMethod::Cash, Some(Money::from_cents(2000))),
        );

        assert_eq!(receipt.change, Some(Money::from_cents(1100)));
        let text = receipt.render();
        assert!(text.lines().any(|l| l.starts_with("Change") && l.ends_with("$11.00")));
        assert!(text.lines().any(|l| l.starts_with("Payment Method") && l.ends_with("Cash")));
    }

    #[test]
    fn test_row_truncates_long_names() {
        let long = "x".repeat(80);
        let rendered = row(&long, "$1.00");
        assert_eq!(rendered.chars().count(), RECEIPT_WIDTH);
        assert!(rendered.ends_with(" $1.00"));
    }
}
