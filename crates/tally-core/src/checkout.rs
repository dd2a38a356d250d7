//! # Checkout
//!
//! Turns a cart into a sale: builds the submission payload and drives the
//! payment/receipt flow.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │            begin_payment()              submit()                        │
//! │   ┌──────┐ ─────────────► ┌─────────────────┐ ────► ┌────────────┐      │
//! │   │ Idle │                │ AwaitingPayment │       │ Submitting │      │
//! │   └──────┘ ◄───────────── └─────────────────┘       └─────┬──────┘      │
//! │      ▲  ▲   cancel_payment()                   ok │       │ err         │
//! │      │  │                                         ▼       │             │
//! │      │  │                                 ┌──────────────┐│             │
//! │      │  └─────────── close_receipt() ──── │ ReceiptShown ││             │
//! │      │               (clears the cart)    └──────────────┘│             │
//! │      └─────────── "Failed to process payment" ────────────┘             │
//! │                   (cart untouched)                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `submit` borrows the cart immutably for the whole round trip, so the
//! cart cannot change while a submission is in flight. There is no retry
//! and no cancellation of an in-flight submission.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult};
use crate::gateway::SalesGateway;
use crate::money::Money;
use crate::types::{Discount, PaymentDetails, PaymentMethod, Sale, SelectedModifier};
use crate::{PAYMENT_FAILED_NOTICE, PAYMENT_SUCCEEDED_NOTICE};

// =============================================================================
// Sale Request
// =============================================================================

/// One line of a sale submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleRequestItem {
    /// Product ID.
    pub product: String,
    pub quantity: i64,
    /// Unit price as shown in the cart.
    pub price: Money,
    #[serde(default)]
    pub modifiers: Vec<SelectedModifier>,
    #[serde(default)]
    pub discounts: Vec<Discount>,
}

/// The payload submitted to persist a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleRequest {
    /// Store ID.
    pub store: String,
    pub items: Vec<SaleRequestItem>,
    /// Cart total at the time of submission. The server stores this value
    /// as the sale total; it only logs a warning when the recomputed line
    /// subtotals disagree.
    pub total: Money,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_details: PaymentDetails,
}

impl SaleRequest {
    /// Builds the submission payload from the cart.
    ///
    /// ## Errors
    /// `EmptyCart` if the cart has no lines.
    pub fn from_cart(
        store_id: &str,
        cart: &Cart,
        payment_method: PaymentMethod,
        payment_details: PaymentDetails,
    ) -> CoreResult<Self> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let items = cart
            .items()
            .iter()
            .map(|line| SaleRequestItem {
                product: line.product().id.clone(),
                quantity: line.quantity(),
                price: line.product().price,
                modifiers: line.selected_modifiers().to_vec(),
                discounts: line.selected_discounts().to_vec(),
            })
            .collect();

        Ok(SaleRequest {
            store: store_id.to_string(),
            items,
            total: cart.total(),
            payment_method,
            payment_details,
        })
    }
}

// =============================================================================
// Checkout State Machine
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutPhase {
    #[default]
    Idle,
    AwaitingPayment,
    Submitting,
    ReceiptShown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A non-blocking message for the cashier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn success(message: &str) -> Self {
        Notice {
            kind: NoticeKind::Success,
            message: message.to_string(),
        }
    }

    fn error(message: &str) -> Self {
        Notice {
            kind: NoticeKind::Error,
            message: message.to_string(),
        }
    }
}

/// The persisted sale plus how it was paid, as shown on the receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedSale {
    pub sale: Sale,
    pub payment_method: PaymentMethod,
    pub payment_details: PaymentDetails,
}

/// Drives one register's checkout flow.
#[derive(Debug, Default)]
pub struct Checkout {
    phase: CheckoutPhase,
    confirmed: Option<ConfirmedSale>,
    notice: Option<Notice>,
}

impl Checkout {
    pub fn new() -> Self {
        Checkout::default()
    }

    pub fn phase(&self) -> CheckoutPhase {
        self.phase
    }

    /// The sale currently on the receipt, if any.
    pub fn confirmed_sale(&self) -> Option<&ConfirmedSale> {
        self.confirmed.as_ref()
    }

    /// The latest notice, if not yet taken.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Removes and returns the latest notice.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Whether the checkout control is enabled for this cart.
    pub fn can_begin_payment(&self, cart: &Cart) -> bool {
        self.phase == CheckoutPhase::Idle && !cart.is_empty()
    }

    /// Opens the payment step.
    ///
    /// ## Errors
    /// - `EmptyCart` if there is nothing to pay for
    /// - `InvalidCheckoutPhase` unless idle
    pub fn begin_payment(&mut self, cart: &Cart) -> CoreResult<()> {
        self.expect_phase("begin payment", CheckoutPhase::Idle)?;
        if cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        self.phase = CheckoutPhase::AwaitingPayment;
        Ok(())
    }

    /// Closes the payment step without submitting.
    pub fn cancel_payment(&mut self) -> CoreResult<()> {
        self.expect_phase("cancel payment", CheckoutPhase::AwaitingPayment)?;
        self.phase = CheckoutPhase::Idle;
        Ok(())
    }

    /// Submits the cart as a sale through `gateway`.
    ///
    /// On success the receipt is shown and a success notice recorded. On
    /// failure the flow returns to idle, the "Failed to process payment"
    /// notice is recorded and the cart is left as it was.
    ///
    /// ## Errors
    /// - `InvalidCheckoutPhase` unless awaiting payment
    /// - `EmptyCart` if the cart was emptied after payment began
    /// - `Submission` when the gateway fails
    pub async fn submit<G: SalesGateway>(
        &mut self,
        gateway: &G,
        store_id: &str,
        cart: &Cart,
        payment_method: PaymentMethod,
        payment_details: PaymentDetails,
    ) -> CoreResult<&ConfirmedSale> {
        self.expect_phase("submit", CheckoutPhase::AwaitingPayment)?;

        let request =
            match SaleRequest::from_cart(store_id, cart, payment_method, payment_details.clone()) {
                Ok(request) => request,
                Err(e) => {
                    self.phase = CheckoutPhase::Idle;
                    return Err(e);
                }
            };

        self.phase = CheckoutPhase::Submitting;

        match gateway.create_sale(&request).await {
            Ok(sale) => {
                info!(sale_id = %sale.id, total = %sale.total, "Sale submitted");
                self.phase = CheckoutPhase::ReceiptShown;
                self.notice = Some(Notice::success(PAYMENT_SUCCEEDED_NOTICE));
                Ok(self.confirmed.insert(ConfirmedSale {
                    sale,
                    payment_method,
                    payment_details,
                }))
            }
            Err(e) => {
                warn!(error = %e, store = store_id, "Sale submission failed");
                self.phase = CheckoutPhase::Idle;
                self.notice = Some(Notice::error(PAYMENT_FAILED_NOTICE));
                Err(CoreError::Submission(e))
            }
        }
    }

    /// Dismisses the receipt, clears the cart and returns to idle.
    ///
    /// Returns the sale that was on the receipt.
    pub fn close_receipt(&mut self, cart: &mut Cart) -> CoreResult<ConfirmedSale> {
        self.expect_phase("close receipt", CheckoutPhase::ReceiptShown)?;
        let confirmed = self.confirmed.take().ok_or(CoreError::InvalidCheckoutPhase {
            action: "close receipt",
            phase: self.phase,
        })?;
        cart.clear();
        self.phase = CheckoutPhase::Idle;
        Ok(confirmed)
    }

    /// Drops any in-progress flow, e.g. on logout.
    pub fn reset(&mut self) {
        *self = Checkout::default();
    }

    fn expect_phase(&self, action: &'static str, expected: CheckoutPhase) -> CoreResult<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(CoreError::InvalidCheckoutPhase {
                action,
                phase: self.phase,
            })
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayError;
    use crate::types::{ModifierOption, Product, SaleItem, SaleStatus};
    use chrono::Utc;
    use std::sync::Mutex;

    struct FakeGateway {
        fail: bool,
        seen: Mutex<Vec<SaleRequest>>,
    }

    impl FakeGateway {
        fn new(fail: bool) -> Self {
            FakeGateway {
                fail,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl SalesGateway for FakeGateway {
        async fn create_sale(&self, request: &SaleRequest) -> Result<Sale, GatewayError> {
            self.seen.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(GatewayError::Transport("connection refused".to_string()));
            }
            let now = Utc::now();
            Ok(Sale {
                id: "sale-1".to_string(),
                store: request.store.clone(),
                items: request
                    .items
                    .iter()
                    .map(|i| SaleItem {
                        product: i.product.clone(),
                        name: None,
                        quantity: i.quantity,
                        price: i.price,
                        modifiers: i.modifiers.clone(),
                        discounts: i.discounts.clone(),
                        subtotal: i.price * i.quantity,
                    })
                    .collect(),
                total: request.total,
                payment_method: request.payment_method,
                status: SaleStatus::Completed,
                created_at: now,
                updated_at: now,
            })
        }
    }

    fn cart_with_coffee() -> Cart {
        let coffee = Product::new("p-1", "s-1", "Coffee", Money::from_cents(350));
        let mut cart = Cart::new();
        cart.add_item(&coffee).unwrap();
        cart.add_item(&coffee).unwrap();
        cart.toggle_modifier(0, "Size", ModifierOption::new("Large", Money::from_cents(50)))
            .unwrap();
        cart
    }

    #[test]
    fn test_sale_request_from_cart() {
        let cart = cart_with_coffee();
        let request =
            SaleRequest::from_cart("s-1", &cart, PaymentMethod::Card, PaymentDetails::default())
                .unwrap();

        assert_eq!(request.store, "s-1");
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].quantity, 2);
        assert_eq!(request.items[0].price, Money::from_cents(350));
        assert_eq!(request.items[0].modifiers.len(), 1);
        assert_eq!(request.total, Money::from_cents(800));

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["paymentMethod"], "card");
    }

    #[test]
    fn test_sale_request_rejects_empty_cart() {
        let err = SaleRequest::from_cart(
            "s-1",
            &Cart::new(),
            PaymentMethod::Cash,
            PaymentDetails::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::EmptyCart));
    }

    #[test]
    fn test_begin_payment_requires_items() {
        let mut checkout = Checkout::new();
        assert!(!checkout.can_begin_payment(&Cart::new()));
        assert!(matches!(
            checkout.begin_payment(&Cart::new()),
            Err(CoreError::EmptyCart)
        ));
        assert_eq!(checkout.phase(), CheckoutPhase::Idle);

        checkout.begin_payment(&cart_with_coffee()).unwrap();
        assert_eq!(checkout.phase(), CheckoutPhase::AwaitingPayment);

        checkout.cancel_payment().unwrap();
        assert_eq!(checkout.phase(), CheckoutPhase::Idle);
    }

    #[tokio::test]
    async fn test_successful_submit_shows_receipt() {
        let gateway = FakeGateway::new(false);
        let mut cart = cart_with_coffee();
        let mut checkout = Checkout::new();
        let details = PaymentDetails {
            tendered: Some(Money::from_cents(1000)),
            reference: None,
        };

        checkout.begin_payment(&cart).unwrap();
        let confirmed = checkout
            .submit(&gateway, "s-1", &cart, PaymentMethod::Cash, details.clone())
            .await
            .unwrap();
        assert_eq!(confirmed.sale.id, "sale-1");
        assert_eq!(confirmed.payment_details, details);

        assert_eq!(checkout.phase(), CheckoutPhase::ReceiptShown);
        assert_eq!(
            checkout.take_notice().map(|n| n.message),
            Some(PAYMENT_SUCCEEDED_NOTICE.to_string())
        );
        assert!(!cart.is_empty());

        let closed = checkout.close_receipt(&mut cart).unwrap();
        assert_eq!(closed.sale.total, Money::from_cents(800));
        assert!(cart.is_empty());
        assert_eq!(checkout.phase(), CheckoutPhase::Idle);
        assert!(checkout.confirmed_sale().is_none());
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_cart() {
        let gateway = FakeGateway::new(true);
        let cart = cart_with_coffee();
        let before = cart.clone();
        let mut checkout = Checkout::new();

        checkout.begin_payment(&cart).unwrap();
        let err = checkout
            .submit(&gateway, "s-1", &cart, PaymentMethod::Card, PaymentDetails::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Submission(GatewayError::Transport(_))));
        assert_eq!(checkout.phase(), CheckoutPhase::Idle);
        assert_eq!(cart, before);

        let notice = checkout.take_notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.message, PAYMENT_FAILED_NOTICE);
        assert_eq!(gateway.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_requires_awaiting_payment() {
        let gateway = FakeGateway::new(false);
        let cart = cart_with_coffee();
        let mut checkout = Checkout::new();

        let err = checkout
            .submit(&gateway, "s-1", &cart, PaymentMethod::Cash, PaymentDetails::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::InvalidCheckoutPhase {
                phase: CheckoutPhase::Idle,
                ..
            }
        ));
        assert!(gateway.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_close_receipt_requires_receipt() {
        let mut checkout = Checkout::new();
        let mut cart = cart_with_coffee();
        assert!(checkout.close_receipt(&mut cart).is_err());
        assert!(!cart.is_empty());
    }
}
