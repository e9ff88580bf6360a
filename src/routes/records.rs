//! Generic CRUD handlers, instantiated once per record type.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{Map, Value};

use crate::db::{parse_id, SharedDb};
use crate::error::ApiError;
use crate::models::Record;
use crate::rbac::Caller;

fn path_id<T: Record>(raw: &str) -> Result<i64, ApiError> {
    parse_id(raw).ok_or(ApiError::NotFound(T::KIND))
}

/// GET /<records> - the whole collection, unfiltered
pub async fn list_records<T: Record>(State(db): State<SharedDb>) -> Json<Vec<T>> {
    Json(db.read().await.list::<T>().to_vec())
}

/// GET /<records>/:id
pub async fn get_record<T: Record>(
    State(db): State<SharedDb>,
    Path(raw): Path<String>,
) -> Result<Json<T>, ApiError> {
    let id = path_id::<T>(&raw)?;
    let db = db.read().await;
    Ok(Json(db.get::<T>(id)?.clone()))
}

/// POST /<records>
pub async fn create_record<T: Record>(
    State(db): State<SharedDb>,
    caller: Caller,
    Json(body): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<T>), ApiError> {
    let record = db.write().await.create::<T>(body)?;
    tracing::info!(
        kind = T::KIND,
        id = record.id(),
        scope = ?record.scope(),
        caller = ?caller.0,
        "record created"
    );
    Ok((StatusCode::CREATED, Json(record)))
}

/// PATCH /<records>/:id
pub async fn update_record<T: Record>(
    State(db): State<SharedDb>,
    caller: Caller,
    Path(raw): Path<String>,
    Json(patch): Json<Map<String, Value>>,
) -> Result<Json<T>, ApiError> {
    let id = path_id::<T>(&raw)?;
    let fields: Vec<String> = patch.keys().cloned().collect();
    let record = db.write().await.update::<T>(id, patch)?;
    tracing::info!(kind = T::KIND, id, ?fields, caller = ?caller.0, "record updated");
    Ok(Json(record))
}

/// DELETE /<records>/:id
pub async fn delete_record<T: Record>(
    State(db): State<SharedDb>,
    caller: Caller,
    Path(raw): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = path_id::<T>(&raw)?;
    db.write().await.delete::<T>(id)?;
    tracing::info!(kind = T::KIND, id, caller = ?caller.0, "record deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// List, get and create only.
pub fn read_create_router<T: Record>() -> Router<SharedDb> {
    Router::new()
        .route(T::PATH, get(list_records::<T>).post(create_record::<T>))
        .route(&format!("{}/:id", T::PATH), get(get_record::<T>))
}

pub fn crud_router<T: Record>() -> Router<SharedDb> {
    Router::new()
        .route(T::PATH, get(list_records::<T>).post(create_record::<T>))
        .route(
            &format!("{}/:id", T::PATH),
            get(get_record::<T>)
                .patch(update_record::<T>)
                .delete(delete_record::<T>),
        )
}
