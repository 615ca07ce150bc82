mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::board::Board;
use crate::db::Database;

/// Shared handler state. Both halves are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub board: Board,
}

pub fn create_router(db: Database, board: Board) -> Router {
    let api = Router::new()
        // Buckets
        .route("/buckets/{bucket}/cards", get(handlers::list_bucket_cards))
        .route("/buckets/{bucket}/cards", post(handlers::create_card))
        .route("/buckets/{bucket}/import", post(handlers::import_card))
        .route("/buckets/{bucket}/rebalance", post(handlers::rebalance_bucket))
        // Cards
        .route("/cards/{id}", get(handlers::get_card).delete(handlers::delete_card))
        .route("/cards/{id}/move", post(handlers::move_card))
        // Positions
        .route("/positions/analysis", get(handlers::analyze_positions))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { db, board })
}
