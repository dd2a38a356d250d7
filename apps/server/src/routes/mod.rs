//! # Routes
//!
//! ```text
//! GET    /health
//! POST   /api/users/register            POST /api/users/login
//! GET    /api/stores                    POST /api/stores
//! GET    /api/stores/{id}               PUT  /api/stores/{id}      DELETE /api/stores/{id}
//! GET    /api/stores/{id}/categories    POST /api/stores/{id}/categories
//! DELETE /api/categories/{id}
//! GET    /api/stores/{id}/products      POST /api/stores/{id}/products
//! PUT    /api/products/{id}             DELETE /api/products/{id}
//! POST   /api/sales
//! GET    /api/sales/{store_id}          GET  /api/sales/{store_id}/metrics
//! ```
//!
//! Store-scoped routes resolve the store through [`owned_store`], so a
//! store owned by someone else answers 404 exactly like a missing one.

pub mod categories;
pub mod health;
pub mod products;
pub mod sales;
pub mod stores;
pub mod users;

use axum::Router;
use tally_core::Store;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(users::router())
        .merge(stores::router())
        .merge(categories::router())
        .merge(products::router())
        .merge(sales::router())
}

/// Loads a store the caller owns.
pub(crate) async fn owned_store(
    state: &AppState,
    store_id: &str,
    user: &AuthUser,
) -> ApiResult<Store> {
    Ok(state.db.stores().get_owned(store_id, &user.id).await?)
}
