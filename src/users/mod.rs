use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod store;
pub(crate) mod validation;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::users_routes())
}
