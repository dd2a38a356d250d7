//! Store CRUD, always scoped to the authenticated owner.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tally_core::validation::{validate_new_store, validate_store_update};
use tally_core::{NewStore, Store, StoreUpdate};

use super::owned_store;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/stores", get(list).post(create))
        .route(
            "/api/stores/{id}",
            get(fetch).put(update).delete(remove),
        )
}

async fn list(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<Vec<Store>>> {
    Ok(Json(state.db.stores().list_by_owner(&user.id).await?))
}

async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<NewStore>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Store>)> {
    let Json(new) = payload?;
    validate_new_store(&new)?;

    let store = state.db.stores().create(&user.id, &new).await?;
    Ok((StatusCode::CREATED, Json(store)))
}

async fn fetch(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Store>> {
    let Path(id) = id?;
    Ok(Json(owned_store(&state, &id, &user).await?))
}

async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<StoreUpdate>, JsonRejection>,
) -> ApiResult<Json<Store>> {
    let Path(id) = id?;
    let Json(update) = payload?;
    validate_store_update(&update)?;

    Ok(Json(state.db.stores().update(&id, &user.id, &update).await?))
}

async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    state.db.stores().delete(&id, &user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
