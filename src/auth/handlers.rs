use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{instrument, warn};

use crate::{
    auth::dto::{Credentials, RefreshRequest, TokenPair},
    error::{AppError, AppResult},
    state::AppState,
    users::validation::{is_valid_email, normalize_email},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/refresh-tokens", post(refresh_tokens))
}

fn checked_email(raw: &str) -> AppResult<String> {
    let email = normalize_email(raw);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::BadRequest("Invalid email".into()));
    }
    Ok(email)
}

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> AppResult<(StatusCode, Json<TokenPair>)> {
    let email = checked_email(&payload.email)?;
    let tokens = state.auth.register(&email, &payload.password).await?;
    Ok((StatusCode::CREATED, Json(tokens)))
}

#[instrument(skip(state, payload))]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> AppResult<Json<TokenPair>> {
    let email = checked_email(&payload.email)?;
    let tokens = state.auth.authenticate(&email, &payload.password).await?;
    Ok(Json(tokens))
}

#[instrument(skip(state, payload))]
pub async fn refresh_tokens(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<TokenPair>> {
    let tokens = state.auth.refresh(&payload.refresh_token).await?;
    Ok(Json(tokens))
}
