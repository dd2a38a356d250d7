//! Account registration and login. Both answer with [`Credentials`].

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use tally_core::validation::validate_registration;
use tally_core::{Credentials, LoginRequest, RegisterRequest};
use tracing::info;

use crate::auth::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users/register", post(register))
        .route("/api/users/login", post(login))
}

async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Credentials>)> {
    let Json(request) = payload?;
    validate_registration(&request)?;

    let hash = hash_password(&request.password)?;
    let user = state
        .db
        .users()
        .create(&request.name, &request.email, &hash)
        .await?;
    let token = state.jwt.issue(&user)?;

    info!(user = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(Credentials { token, user })))
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<Credentials>> {
    let Json(request) = payload?;

    let record = state
        .db
        .users()
        .find_by_email(&request.email)
        .await?
        .filter(|record| verify_password(&request.password, &record.password_hash))
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    let token = state.jwt.issue(&record.user)?;
    Ok(Json(Credentials {
        token,
        user: record.user,
    }))
}
