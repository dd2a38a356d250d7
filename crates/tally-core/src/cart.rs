//! # Cart
//!
//! The register's shopping cart and the line pricing rule.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Cashier Action           Cart Method              Effect               │
//! │  ──────────────           ───────────              ──────               │
//! │                                                                         │
//! │  Pick product ──────────► add_item() ────────────► qty+1 or push line  │
//! │                                                                         │
//! │  +/- buttons ───────────► change_quantity() ─────► qty+delta if ≥ 1    │
//! │                                                                         │
//! │  Remove ────────────────► remove_item() ─────────► line dropped        │
//! │                                                                         │
//! │  Pick "Size: Large" ────► toggle_modifier() ─────► replace or append   │
//! │                                                                         │
//! │  Tap discount ──────────► toggle_discount() ─────► remove or append    │
//! │                                                                         │
//! │  Close receipt ─────────► clear()                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Line Pricing
//! ```text
//! running = unit_price × qty + Σ option.price × qty
//! for each selected discount, in selection order:
//!     percentage → running × (1 − value / 100)
//!     fixed      → running − value × qty
//! ```
//! Order matters: 10% then $1 fixed differs from $1 fixed then 10%.
//! Nothing is clamped or rounded; a line may go negative.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Discount, DiscountKind, ModifierOption, Product, SelectedModifier};

// =============================================================================
// Pricing
// =============================================================================

/// Prices one line: base, plus modifier surcharges, then discounts in order.
///
/// Shared by [`LineItem::total`] and the server, which recomputes each
/// persisted line's subtotal from the submitted selections.
///
/// ## Errors
/// `AmountOverflow` when any step overflows or the result is outside
/// [`Money::max_amount`].
///
/// ## Example
/// ```rust
/// use tally_core::cart::price_line;
/// use tally_core::money::Money;
/// use tally_core::types::{Discount, ModifierOption, SelectedModifier};
///
/// let modifiers = vec![SelectedModifier {
///     name: "Size".to_string(),
///     option: ModifierOption::new("Large", Money::from_cents(150)),
/// }];
/// let discounts = vec![Discount::percentage("Happy Hour", 10)];
///
/// let total = price_line(Money::from_cents(1000), 2, &modifiers, &discounts).unwrap();
/// assert_eq!(total, Money::from_cents(2070));
/// ```
pub fn price_line(
    unit_price: Money,
    quantity: i64,
    modifiers: &[SelectedModifier],
    discounts: &[Discount],
) -> CoreResult<Money> {
    let mut running = unit_price
        .checked_mul_quantity(quantity)
        .ok_or(CoreError::AmountOverflow)?;

    for modifier in modifiers {
        running = modifier
            .option
            .price
            .checked_mul_quantity(quantity)
            .and_then(|surcharge| running.checked_add(surcharge))
            .ok_or(CoreError::AmountOverflow)?;
    }

    for discount in discounts {
        running = match discount.kind {
            DiscountKind::Percentage => running.checked_percentage_discount(discount.value),
            DiscountKind::Fixed => Money::new(discount.value)
                .checked_mul_quantity(quantity)
                .and_then(|off| running.checked_sub(off)),
        }
        .ok_or(CoreError::AmountOverflow)?;
    }

    if !running.is_within_limit() {
        return Err(CoreError::AmountOverflow);
    }
    Ok(running)
}

// =============================================================================
// Line Item
// =============================================================================

/// One product entry in the cart.
///
/// ## Invariants
/// - `quantity >= 1` for as long as the line exists
/// - at most one selected modifier per group name
/// - at most one selected discount per discount name
/// - `total` is the line's current price and within [`Money::max_amount`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    product: Product,
    quantity: i64,
    selected_modifiers: Vec<SelectedModifier>,
    selected_discounts: Vec<Discount>,
    total: Money,
}

impl LineItem {
    fn new(product: &Product) -> Self {
        LineItem {
            product: product.clone(),
            quantity: 1,
            selected_modifiers: Vec::new(),
            selected_discounts: Vec::new(),
            total: Money::zero(),
        }
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn selected_modifiers(&self) -> &[SelectedModifier] {
        &self.selected_modifiers
    }

    pub fn selected_discounts(&self) -> &[Discount] {
        &self.selected_discounts
    }

    /// Checks whether a discount with this name is applied.
    pub fn has_discount(&self, name: &str) -> bool {
        self.selected_discounts.iter().any(|d| d.name == name)
    }

    /// The line's price after modifiers and discounts.
    pub fn total(&self) -> Money {
        self.total
    }

    fn reprice(&mut self) -> CoreResult<()> {
        self.total = price_line(
            self.product.price,
            self.quantity,
            &self.selected_modifiers,
            &self.selected_discounts,
        )?;
        Ok(())
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart: line items in the order products were first added.
///
/// ## Invariants
/// - Lines are unique by product ID (adding the same product bumps quantity)
/// - Line positions never change except when a line is removed
/// - Every line total and the cart total are within [`Money::max_amount`];
///   an edit that would break this fails with `AmountOverflow` and leaves
///   the cart as it was
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    items: Vec<LineItem>,
    total: Money,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds one unit of a product.
    ///
    /// Increments the existing line for `product.id`, otherwise appends a
    /// fresh line with quantity 1. Returns the line's quantity afterwards.
    ///
    /// ## Errors
    /// `AmountOverflow` if the priced line or cart would leave the supported range.
    pub fn add_item(&mut self, product: &Product) -> CoreResult<i64> {
        let (index, mut line) = match self.position_of(&product.id) {
            Some(index) => (index, self.items[index].clone()),
            None => (self.items.len(), LineItem::new(product)),
        };
        if index < self.items.len() {
            line.quantity = line.quantity.saturating_add(1);
        }

        self.commit(index, line)?;
        Ok(self.items[index].quantity)
    }

    /// Removes the line for a product. Absent products are ignored.
    pub fn remove_item(&mut self, product_id: &str) -> Option<LineItem> {
        let index = self.position_of(product_id)?;
        let removed = self.items.remove(index);
        // Both sides are within Money::max_amount, far from Decimal's limit.
        self.total = self.total - removed.total;
        Some(removed)
    }

    /// Adjusts a line's quantity by `delta`.
    ///
    /// A change that would leave the quantity below 1 is ignored and the
    /// current quantity is returned unchanged.
    ///
    /// ## Errors
    /// - `ProductNotInCart` when no line exists for `product_id`
    /// - `AmountOverflow` if the new quantity prices out of range
    pub fn change_quantity(&mut self, product_id: &str, delta: i64) -> CoreResult<i64> {
        let index = self
            .position_of(product_id)
            .ok_or_else(|| CoreError::ProductNotInCart(product_id.to_string()))?;

        let current = self.items[index].quantity;
        let next = current.saturating_add(delta);
        if next < 1 || next == current {
            return Ok(current);
        }

        let mut line = self.items[index].clone();
        line.quantity = next;
        self.commit(index, line)?;
        Ok(next)
    }

    /// Selects `option` for the modifier group `group_name` on a line.
    ///
    /// An existing selection for the group is replaced in place; otherwise
    /// the selection is appended.
    pub fn toggle_modifier(
        &mut self,
        line_index: usize,
        group_name: &str,
        option: ModifierOption,
    ) -> CoreResult<()> {
        let mut line = self.line_at(line_index)?.clone();

        match line
            .selected_modifiers
            .iter_mut()
            .find(|m| m.name == group_name)
        {
            Some(existing) => existing.option = option,
            None => line.selected_modifiers.push(SelectedModifier {
                name: group_name.to_string(),
                option,
            }),
        }
        self.commit(line_index, line)
    }

    /// Turns a discount on or off for a line, matching by name.
    ///
    /// Returns `true` if the discount is applied afterwards.
    pub fn toggle_discount(&mut self, line_index: usize, discount: Discount) -> CoreResult<bool> {
        let mut line = self.line_at(line_index)?.clone();

        let before = line.selected_discounts.len();
        line.selected_discounts.retain(|d| d.name != discount.name);
        let applied = line.selected_discounts.len() == before;
        if applied {
            line.selected_discounts.push(discount);
        }

        self.commit(line_index, line)?;
        Ok(applied)
    }

    /// Sum of all line totals; zero for an empty cart.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |acc, l| acc.saturating_add(l.quantity))
    }

    /// Clears all items from the cart.
    pub fn clear(&mut self) {
        self.items.clear();
        self.total = Money::zero();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of lines (distinct products).
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn line(&self, index: usize) -> Option<&LineItem> {
        self.items.get(index)
    }

    /// Position of the line for a product, if present.
    pub fn position_of(&self, product_id: &str) -> Option<usize> {
        self.items.iter().position(|l| l.product.id == product_id)
    }

    fn line_at(&self, index: usize) -> CoreResult<&LineItem> {
        self.items.get(index).ok_or(CoreError::LineNotFound {
            index,
            len: self.items.len(),
        })
    }

    /// Reprices `line` and stores it at `index` (appending when `index`
    /// equals the line count). Nothing changes if pricing fails.
    fn commit(&mut self, index: usize, mut line: LineItem) -> CoreResult<()> {
        line.reprice()?;

        let count = self.items.len().max(index + 1);
        let totals = (0..count).map(|i| match self.items.get(i) {
            Some(_) if i == index => line.total,
            Some(existing) => existing.total,
            None => line.total,
        });
        let total = Money::checked_sum(totals)
            .filter(Money::is_within_limit)
            .ok_or(CoreError::AmountOverflow)?;

        if index < self.items.len() {
            self.items[index] = line;
        } else {
            self.items.push(line);
        }
        self.total = total;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
