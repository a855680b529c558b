use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use super::dto::{ImportSummary, OperationCreate, OperationFilter, OperationUpdate, OperationView};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
};

pub fn operations_routes() -> Router<AppState> {
    Router::new()
        .route("/operations", get(list_operations).post(create_operation))
        .route("/operations/import", post(import_operations))
        .route(
            "/operations/:operation_id",
            get(get_operation)
                .patch(update_operation)
                .delete(delete_operation),
        )
}

#[instrument(skip(state))]
pub async fn list_operations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(filter): Query<OperationFilter>,
) -> AppResult<Json<Vec<OperationView>>> {
    let ops = state.operations.list(user_id, filter.kind).await?;
    Ok(Json(ops.into_iter().map(OperationView::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn create_operation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<OperationCreate>,
) -> AppResult<(StatusCode, Json<OperationView>)> {
    let op = state.operations.create(user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(op.into())))
}

#[instrument(skip(state))]
pub async fn get_operation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<OperationView>> {
    let op = state.operations.get(user_id, id).await?;
    Ok(Json(op.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_operation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<OperationUpdate>,
) -> AppResult<Json<OperationView>> {
    let op = state.operations.update(user_id, id, payload).await?;
    Ok(Json(op.into()))
}

#[instrument(skip(state))]
pub async fn delete_operation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.operations.delete(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /operations/import, multipart with a `file` field holding the CSV.
#[instrument(skip(state, mp))]
pub async fn import_operations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> AppResult<Json<ImportSummary>> {
    while let Some(field) = mp.next_field().await.map_err(bad_upload)? {
        if field.name() != Some("file") {
            continue;
        }
        let data = field.bytes().await.map_err(bad_upload)?;
        let imported = state.operations.import_csv(user_id, &data).await?;
        return Ok(Json(ImportSummary { imported }));
    }
    Err(AppError::BadRequest("file is required".into()))
}

fn bad_upload(e: axum::extract::multipart::MultipartError) -> AppError {
    warn!(error = %e, "multipart read failed");
    AppError::BadRequest("malformed upload".into())
}
