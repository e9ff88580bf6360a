use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::db::SharedDb;
use crate::models::{Board, List, Tag, Task, User};

pub mod records;

/// Full record API. Users can only be listed, read and created.
pub fn app(db: SharedDb) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .merge(records::read_create_router::<User>())
        .merge(records::crud_router::<Board>())
        .merge(records::crud_router::<List>())
        .merge(records::crud_router::<Task>())
        .merge(records::crud_router::<Tag>())
        .with_state(db)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
