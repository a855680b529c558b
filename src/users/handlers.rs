use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::dto::{PublicUser, SelfUser, UserUpdate};
use crate::{auth::extractors::AuthUser, error::AppResult, state::AppState};

pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_me).patch(update_me))
        .route("/users/:username", get(get_user))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<SelfUser>> {
    let user = state.users.get_by_id(user_id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<SelfUser>> {
    let user = state.users.update(user_id, payload).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<PublicUser>> {
    let user = state.users.get_by_username(&username).await?;
    Ok(Json(user.into()))
}
