use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod import;
#[cfg(test)]
pub mod memory;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod store;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::operations_routes())
}
