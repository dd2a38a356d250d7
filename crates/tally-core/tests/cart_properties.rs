//! Property-based tests for cart invariants.
//!
//! These run random operation sequences against the cart and check the
//! invariants the register relies on.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_core::cart::{price_line, Cart};
use tally_core::error::CoreError;
use tally_core::money::Money;
use tally_core::types::{Discount, ModifierOption, Product, SelectedModifier};

// Strategies for generating test data
fn price_strategy() -> impl Strategy<Value = Money> {
    (0i64..100_000).prop_map(Money::from_cents)
}

fn product_strategy() -> impl Strategy<Value = Product> {
    ("[a-e]", price_strategy())
        .prop_map(|(id, price)| Product::new(id.clone(), "store-1", format!("Item {}", id), price))
}

fn discount_strategy() -> impl Strategy<Value = Discount> {
    prop_oneof![
        ("[A-D]", 0u32..=100).prop_map(|(name, pct)| Discount::percentage(name, pct)),
        ("[A-D]", 0i64..2_000).prop_map(|(name, cents)| Discount::fixed(name, Money::from_cents(cents))),
    ]
}

/// Any representable decimal, from tiny fractions to `Decimal::MAX`.
fn any_decimal() -> impl Strategy<Value = Decimal> {
    (any::<u32>(), any::<u32>(), any::<u32>(), any::<bool>(), 0u32..=28)
        .prop_map(|(lo, mid, hi, negative, scale)| Decimal::from_parts(lo, mid, hi, negative, scale))
}

fn any_discount() -> impl Strategy<Value = Discount> {
    prop_oneof![
        any_decimal().prop_map(|value| Discount::percentage("Any", value)),
        any_decimal().prop_map(|value| Discount::fixed("Any", Money::new(value))),
    ]
}

fn option_strategy() -> impl Strategy<Value = ModifierOption> {
    ("[a-z]{1,8}", price_strategy()).prop_map(|(name, price)| ModifierOption::new(name, price))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn quantity_never_drops_below_one(deltas in prop::collection::vec(-1_000i64..1_000, 0..50)) {
        let mut cart = Cart::new();
        cart.add_item(&Product::new("p", "store-1", "Item", Money::from_cents(100))).unwrap();

        for delta in deltas {
            let qty = cart.change_quantity("p", delta).unwrap();
            prop_assert!(qty >= 1, "quantity fell to {}", qty);
        }
        prop_assert!(cart.line(0).unwrap().quantity() >= 1);
    }

    #[test]
    fn one_line_per_product(products in prop::collection::vec(product_strategy(), 1..40)) {
        let mut cart = Cart::new();
        for product in &products {
            cart.add_item(product).unwrap();
        }

        let mut ids: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();

        prop_assert_eq!(cart.len(), ids.len());
        prop_assert_eq!(cart.total_quantity(), products.len() as i64);
    }

    #[test]
    fn adding_twice_gives_quantity_two(product in product_strategy()) {
        let mut cart = Cart::new();
        cart.add_item(&product).unwrap();
        cart.add_item(&product).unwrap();

        prop_assert_eq!(cart.len(), 1);
        prop_assert_eq!(cart.line(0).unwrap().quantity(), 2);
    }

    #[test]
    fn second_modifier_choice_wins(first in option_strategy(), second in option_strategy()) {
        let mut cart = Cart::new();
        cart.add_item(&Product::new("p", "store-1", "Item", Money::from_cents(100))).unwrap();

        cart.toggle_modifier(0, "Size", first).unwrap();
        cart.toggle_modifier(0, "Size", second.clone()).unwrap();

        let selected = cart.line(0).unwrap().selected_modifiers();
        prop_assert_eq!(selected.len(), 1);
        prop_assert_eq!(&selected[0].option, &second);
    }

    #[test]
    fn toggling_a_discount_twice_is_identity(
        existing in prop::collection::vec(discount_strategy(), 0..4),
        toggled in discount_strategy(),
    ) {
        let mut cart = Cart::new();
        cart.add_item(&Product::new("p", "store-1", "Item", Money::from_cents(1_000))).unwrap();
        for discount in existing {
            cart.toggle_discount(0, discount).unwrap();
        }
        let before = cart.clone();

        let applied = cart.toggle_discount(0, toggled.clone()).unwrap();
        let reverted = cart.toggle_discount(0, toggled).unwrap();

        prop_assert_ne!(applied, reverted);
        if applied {
            prop_assert_eq!(cart, before);
        }
    }

    #[test]
    fn cart_total_is_sum_of_lines(
        products in prop::collection::vec(product_strategy(), 0..20),
        discount in discount_strategy(),
    ) {
        let mut cart = Cart::new();
        for product in &products {
            cart.add_item(product).unwrap();
        }
        if !cart.is_empty() {
            cart.toggle_discount(0, discount).unwrap();
        }

        let sum: Money = cart.items().iter().map(|l| l.total()).sum();
        prop_assert_eq!(cart.total(), sum);
    }

    #[test]
    fn zero_percent_discount_changes_nothing(price in price_strategy(), qty in 1i64..100) {
        let plain = price_line(price, qty, &[], &[]).unwrap();
        let discounted =
            price_line(price, qty, &[], &[Discount::percentage("None", Decimal::ZERO)]).unwrap();
        prop_assert_eq!(plain, discounted);
    }

    #[test]
    fn price_line_is_in_range_or_an_error(
        price in any_decimal(),
        qty in any::<i64>(),
        surcharge in any_decimal(),
        discounts in prop::collection::vec(any_discount(), 0..3),
    ) {
        let modifiers = [SelectedModifier {
            name: "Size".to_string(),
            option: ModifierOption::new("Any", Money::new(surcharge)),
        }];

        match price_line(Money::new(price), qty, &modifiers, &discounts) {
            Ok(total) => prop_assert!(total.is_within_limit()),
            Err(err) => prop_assert!(matches!(err, CoreError::AmountOverflow)),
        }
    }

    #[test]
    fn rejected_edits_leave_the_cart_unchanged(
        price in any_decimal(),
        deltas in prop::collection::vec(any::<i64>(), 0..6),
        discount in any_discount(),
    ) {
        let mut cart = Cart::new();
        cart.add_item(&Product::new("base", "store-1", "Base", Money::from_cents(100))).unwrap();
        let huge = Product::new("huge", "store-1", "Huge", Money::new(price.abs()));

        for delta in deltas {
            let before = cart.clone();
            let added = cart.add_item(&huge);
            if added.is_err() {
                prop_assert_eq!(&cart, &before);
            }

            let before = cart.clone();
            if cart.change_quantity("base", delta).is_err() {
                prop_assert_eq!(&cart, &before);
            }
        }

        let before = cart.clone();
        if cart.toggle_discount(0, discount).is_err() {
            prop_assert_eq!(&cart, &before);
        }

        prop_assert!(cart.total().is_within_limit());
        let sum = Money::checked_sum(cart.items().iter().map(|l| l.total()));
        prop_assert_eq!(sum, Some(cart.total()));
    }
}
