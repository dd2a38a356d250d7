//! # Collaborator Traits
//!
//! The seams between the register and whatever persists sales and serves
//! the catalog. The register implements them over HTTP; tests use fakes.
//!
//! ```text
//! ┌──────────────┐  SalesGateway::create_sale   ┌───────────────────────┐
//! │   Checkout   │ ────────────────────────────►│ tally-server / fake   │
//! └──────────────┘                              │                       │
//! ┌──────────────┐  CatalogSource::list_*       │                       │
//! │   Register   │ ────────────────────────────►│                       │
//! └──────────────┘                              └───────────────────────┘
//! ```

use std::future::Future;

use thiserror::Error;

use crate::checkout::SaleRequest;
use crate::types::{Category, Product, Sale};

/// Failures reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The collaborator understood the request and refused it (HTTP 4xx).
    #[error("Request rejected: {message}")]
    Rejected { message: String },

    /// The session token is missing, expired or invalid.
    #[error("Not authorized")]
    Unauthorized,

    /// The request never got a usable answer (network, 5xx, bad payload).
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Persists sales.
pub trait SalesGateway {
    /// Submits a sale and returns the record as persisted.
    fn create_sale(
        &self,
        request: &SaleRequest,
    ) -> impl Future<Output = Result<Sale, GatewayError>> + Send;
}

/// Read access to a store's catalog.
pub trait CatalogSource {
    fn list_products(
        &self,
        store_id: &str,
    ) -> impl Future<Output = Result<Vec<Product>, GatewayError>> + Send;

    fn list_categories(
        &self,
        store_id: &str,
    ) -> impl Future<Output = Result<Vec<Category>, GatewayError>> + Send;
}
