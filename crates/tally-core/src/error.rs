//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Cart / checkout rule violations                │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-core collaborator errors                                        │
//! │  ├── GatewayError     - Sale submission / catalog failures (gateway)   │
//! │  └── SessionError     - Session storage failures (session)             │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Server errors (in app)                                                │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product ID, line index, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::checkout::CheckoutPhase;
use crate::gateway::GatewayError;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent cart or checkout rule violations.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The cart has no line for the given product.
    ///
    /// ## When This Occurs
    /// - Changing the quantity of a product that was never added
    /// - Changing the quantity of a product after its line was removed
    #[error("Product {0} is not in the cart")]
    ProductNotInCart(String),

    /// The cart has no line at the given position.
    #[error("Cart has no line at index {index} (cart has {len} lines)")]
    LineNotFound { index: usize, len: usize },

    /// An amount left the supported range.
    ///
    /// ## When This Occurs
    /// - A quantity, price or discount so large that a line total exceeds
    ///   [`Money::max_amount`](crate::money::Money::max_amount)
    /// - Adding a line would push the cart total past that limit
    #[error("Amount is outside the supported range")]
    AmountOverflow,

    /// Checkout was attempted on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The checkout state machine does not allow the operation right now.
    ///
    /// ## When This Occurs
    /// - Submitting while a previous submission is still in flight
    /// - Closing a receipt that is not shown
    #[error("Cannot {action} while checkout is {phase:?}")]
    InvalidCheckoutPhase {
        action: &'static str,
        phase: CheckoutPhase,
    },

    /// The sales gateway refused or failed the submission.
    #[error("Sale submission failed: {0}")]
    Submission(#[from] GatewayError),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// A list that must contain at least one entry is empty.
    #[error("{field} must not be empty")]
    Empty { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: String, max: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., two discounts with the same name).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// Creates a Required error for the given field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
