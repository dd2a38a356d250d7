use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use tally_core::validation::validate_new_category;
use tally_core::{Category, NewCategory};

use super::owned_store;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/stores/{id}/categories", get(list).post(create))
        .route("/api/categories/{id}", delete(remove))
}

async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    store_id: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Vec<Category>>> {
    let Path(store_id) = store_id?;
    let store = owned_store(&state, &store_id, &user).await?;
    Ok(Json(state.db.categories().list(&store.id).await?))
}

async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    store_id: Result<Path<String>, PathRejection>,
    payload: Result<Json<NewCategory>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let Path(store_id) = store_id?;
    let Json(new) = payload?;
    validate_new_category(&new)?;

    let store = owned_store(&state, &store_id, &user).await?;
    let category = state.db.categories().create(&store.id, &new).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    let category = state.db.categories().get(&id).await?;
    owned_store(&state, &category.store, &user).await?;

    state.db.categories().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
