//! # tally-core: Pure Business Logic for Tally POS
//!
//! This crate is the **heart** of Tally POS. It contains the cart pricing and
//! checkout logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Register (terminal client)                      │   │
//! │  │    Catalog ──► Cart ──► Payment ──► Receipt                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ uses                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌────────┐  │   │
//! │  │   │  types  │ │  cart   │ │ checkout │ │ metrics │ │session │  │   │
//! │  │   │ Product │ │LineItem │ │SaleReq.  │ │ Sales   │ │ login  │  │   │
//! │  │   │  Sale   │ │  Cart   │ │ Checkout │ │ Metrics │ │ logout │  │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └─────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ uses                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │           tally-db (SQLite) ◄── tally-server (REST API)         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Store, Product, Sale, ...)
//! - [`money`] - Decimal money type
//! - [`cart`] - Cart aggregator and line pricing
//! - [`checkout`] - Sale request building and the checkout state machine
//! - [`gateway`] - Traits for the persistence and catalog collaborators
//! - [`metrics`] - Sales reporting aggregates
//! - [`receipt`] - Receipt model and text rendering
//! - [`session`] - Login session state with explicit hydrate/teardown
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::cart::Cart;
//! use tally_core::money::Money;
//! use tally_core::types::Product;
//!
//! let coffee = Product::new("p-1", "store-1", "Coffee", Money::from_cents(350));
//!
//! let mut cart = Cart::new();
//! cart.add_item(&coffee).unwrap();
//! cart.add_item(&coffee).unwrap();
//!
//! assert_eq!(cart.len(), 1);
//! assert_eq!(cart.total(), Money::from_cents(700));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod money;
pub mod receipt;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, LineItem};
pub use checkout::{Checkout, CheckoutPhase, SaleRequest};
pub use error::{CoreError, CoreResult, ValidationError};
pub use gateway::{CatalogSource, GatewayError, SalesGateway};
pub use metrics::{DateRange, SalesMetrics};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Notice shown to the cashier when a sale submission fails.
pub const PAYMENT_FAILED_NOTICE: &str = "Failed to process payment";

/// Notice shown to the cashier when a sale is confirmed.
pub const PAYMENT_SUCCEEDED_NOTICE: &str = "Payment processed successfully";
