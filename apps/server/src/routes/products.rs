//! Catalog endpoints. The register fetches `GET /api/stores/{id}/products`
//! to build its product grid.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use tally_core::validation::{validate_new_product, validate_product_update};
use tally_core::{NewProduct, Product, ProductUpdate};

use super::owned_store;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/stores/{id}/products", get(list).post(create))
        .route("/api/products/{id}", put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    store_id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Vec<Product>>> {
    let Path(store_id) = store_id?;
    let store = owned_store(&state, &store_id, &user).await?;
    Ok(Json(state.db.products().list_by_store(&store.id).await?))
}

async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    store_id: Result<Path<String>, PathRejection>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let Path(store_id) = store_id?;
    let Json(new) = payload?;
    validate_new_product(&new)?;

    let store = owned_store(&state, &store_id, &user).await?;
    let product = state.db.products().create(&store.id, &new).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<ProductUpdate>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let Path(id) = id?;
    let Json(update) = payload?;
    validate_product_update(&update)?;

    let product = state.db.products().get(&id).await?;
    owned_store(&state, &product.store, &user).await?;

    Ok(Json(state.db.products().update(&id, &update).await?))
}

async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    let product = state.db.products().get(&id).await?;
    owned_store(&state, &product.store, &user).await?;

    state.db.products().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
